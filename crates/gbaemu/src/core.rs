//! Core emulator API.
//!
//! This module provides the main emulator interface that can be used both
//! for headless testing and as the backend for graphical frontends. The
//! hardware fabric lives in a [`System`] owned by the Unicorn instance, so
//! MMIO callbacks and the scheduler reach it through `get_data_mut()`.

use crate::loader;
use crate::memory;
use crate::scheduler::{QuantumResult, Scheduler, SchedulerConfig};
use gbaemu_core::{Framebuffer, System, SystemConfig, build_system};
use gbaemu_hw::memory_map::bios;
use std::time::Instant;
use tracing::info;
use unicorn_engine::{
    RegisterARM, Unicorn,
    unicorn_const::{Arch, Mode},
};

/// Configuration for the emulator
#[derive(Debug, Clone, Default)]
pub struct EmulatorConfig {
    /// Stop when the PC reaches this address
    pub stop_pc: Option<u64>,
    /// Stop after this many instructions
    pub max_instructions: Option<usize>,
    /// Optional timeout in milliseconds
    pub timeout_ms: Option<u64>,
    /// Stop after this many completed frames
    pub max_frames: Option<u64>,
}

/// Result of running the emulator
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// Reached a stop condition (PC match, max instructions, frame count)
    StopCondition,
    /// Timeout reached
    Timeout,
    /// Emulation error occurred
    Error(String),
}

/// Core emulator
pub struct EmulatorCore {
    emu: Unicorn<'static, System>,
    scheduler: Scheduler,

    // Configuration
    timeout_ms: Option<u64>,
    max_frames: Option<u64>,
    start_time: Instant,
}

impl EmulatorCore {
    /// Create a new emulator from BIOS and cartridge images
    pub fn new(bios_data: &[u8], rom_data: &[u8], config: EmulatorConfig) -> Result<Self, String> {
        let mut system = build_system(&SystemConfig::default())
            .map_err(|e| format!("Failed to build system: {}", e))?;
        loader::install_images(&mut system, bios_data, rom_data).map_err(|e| e.to_string())?;

        info!("=== CPU Setup ===");
        let mut emu = Unicorn::new_with_data(Arch::ARM, Mode::LITTLE_ENDIAN, system)
            .map_err(|e| format!("Failed to initialize CPU: {:?}", e))?;
        memory::map_system(&mut emu)?;

        // Execution starts at the BIOS reset vector in ARM state
        let scheduler_config = SchedulerConfig {
            stop_pc: config.stop_pc,
            max_instructions: config.max_instructions,
            ..Default::default()
        };
        let scheduler = Scheduler::new(&mut emu, scheduler_config, bios::BASE as u64)?;

        Ok(Self {
            emu,
            scheduler,
            timeout_ms: config.timeout_ms,
            max_frames: config.max_frames,
            start_time: Instant::now(),
        })
    }

    /// Run a single quantum of execution
    pub fn step(&mut self) -> QuantumResult {
        self.scheduler.run_quantum(&mut self.emu)
    }

    fn timed_out(&self) -> bool {
        if let Some(timeout_ms) = self.timeout_ms {
            let elapsed_ms = self.start_time.elapsed().as_millis() as u64;
            if elapsed_ms >= timeout_ms {
                info!("Timeout reached: {} ms", elapsed_ms);
                return true;
            }
        }
        false
    }

    fn frames_done(&self) -> bool {
        self.max_frames
            .is_some_and(|max| self.framebuffer().frame_count() >= max)
    }

    /// Check if any stop condition is met
    pub fn should_stop(&self) -> bool {
        self.scheduler.check_stop_conditions() || self.frames_done() || self.timed_out()
    }

    /// Run until a stop condition is reached
    pub fn run(&mut self) -> StopReason {
        loop {
            if self.scheduler.check_stop_conditions() || self.frames_done() {
                return StopReason::StopCondition;
            }
            if self.timed_out() {
                return StopReason::Timeout;
            }

            match self.step() {
                QuantumResult::Continue => {}
                QuantumResult::Error(e) => return StopReason::Error(e),
            }
        }
    }

    /// Get the current PC
    pub fn pc(&self) -> u64 {
        self.scheduler.pc()
    }

    /// Check if the CPU has stopped (reached the stop PC)
    pub fn stopped(&self) -> bool {
        self.scheduler.stopped()
    }

    /// Get total instructions executed
    pub fn total_executed(&self) -> usize {
        self.scheduler.total_executed()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Emulated time in nanoseconds
    pub fn emulated_ns(&self) -> u64 {
        self.system().now()
    }

    /// Read a CPU register
    pub fn reg(&self, reg: RegisterARM) -> u64 {
        self.emu.reg_read(reg).unwrap_or(0)
    }

    /// The hardware fabric
    pub fn system(&self) -> &System {
        self.emu.get_data()
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.system().framebuffer
    }

    /// Returns `true` once per completed frame
    pub fn take_frame_ready(&mut self) -> bool {
        self.emu.get_data_mut().framebuffer.take_frame_ready()
    }

    /// Read memory from the CPU's perspective
    pub fn mem_read(&self, addr: u64, size: usize) -> Result<Vec<u8>, String> {
        let mut buf = vec![0u8; size];
        self.emu
            .mem_read(addr, &mut buf)
            .map_err(|e| format!("Memory read error: {:?}", e))?;
        Ok(buf)
    }

    /// Print final emulator state
    pub fn print_final_state(&self) {
        info!("Total instructions executed: {}", self.total_executed());
        info!("Elapsed time: {:.2?}", self.elapsed());
        info!(
            "Emulated time: {} ns ({} frames)",
            self.emulated_ns(),
            self.framebuffer().frame_count()
        );

        let lcd = &self.system().io.lcd;
        let pic = &self.system().io.pic;
        info!(
            "LCD: ly={} hblank={} | PIC: IE={:#06X} IF={:#06X} master={}",
            lcd.ly, lcd.hblank, pic.irq_enabled, pic.level, pic.master
        );

        info!(
            "CPU: pc={:#x} r0={:#x} r1={:#x} r2={:#x} r3={:#x} r4={:#x} r5={:#x} r6={:#x} sp={:#x} lr={:#x} cpsr={:#x}",
            self.pc(),
            self.reg(RegisterARM::R0),
            self.reg(RegisterARM::R1),
            self.reg(RegisterARM::R2),
            self.reg(RegisterARM::R3),
            self.reg(RegisterARM::R4),
            self.reg(RegisterARM::R5),
            self.reg(RegisterARM::R6),
            self.reg(RegisterARM::SP),
            self.reg(RegisterARM::LR),
            self.reg(RegisterARM::CPSR)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{INSTRUCTIONS_PER_QUANTUM, instructions_to_ns};
    use gbaemu_hw::specs::display::LINE_NS;

    const ROM: [u8; 4] = [0x11, 0x22, 0x33, 0x44];

    fn assemble(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    fn run_until(program: &[u32], stop_pc: u64) -> EmulatorCore {
        let config = EmulatorConfig {
            stop_pc: Some(stop_pc),
            max_instructions: Some(10_000),
            ..Default::default()
        };
        let mut core = EmulatorCore::new(&assemble(program), &ROM, config).unwrap();
        assert_eq!(core.run(), StopReason::StopCondition);
        core
    }

    #[test]
    fn rom_store_is_dropped_and_execution_continues() {
        let core = run_until(
            &[
                0xE3A0_00AB, // mov r0, #0xAB
                0xE3A0_1302, // mov r1, #0x08000000
                0xE581_0000, // str r0, [r1]
                0xE3A0_2001, // mov r2, #1
                0xEAFF_FFFE, // b .
            ],
            0x10,
        );

        assert!(core.stopped());
        assert_eq!(core.pc(), 0x10);
        assert_eq!(core.reg(RegisterARM::R2), 1);
        assert_eq!(core.mem_read(0x0800_0000, 4).unwrap(), ROM);
        assert_eq!(core.mem_read(0x0C00_0000, 4).unwrap(), ROM);
    }

    #[test]
    fn early_stop_counts_only_executed_instructions() {
        let core = run_until(
            &[
                0xE3A0_00AB, // mov r0, #0xAB
                0xE3A0_2001, // mov r2, #1
                0xEAFF_FFFE, // b .
            ],
            0x8,
        );

        assert_eq!(core.total_executed(), 2);
        assert_eq!(core.emulated_ns(), instructions_to_ns(2));
        assert!(core.emulated_ns() < LINE_NS);
        assert_eq!(core.system().io.lcd.ly, 0);
    }

    #[test]
    fn full_quantum_advances_one_scanline_of_time() {
        let config = EmulatorConfig::default();
        let mut core = EmulatorCore::new(&assemble(&[0xEAFF_FFFE]), &ROM, config).unwrap();

        assert_eq!(core.step(), QuantumResult::Continue);
        assert_eq!(core.total_executed(), INSTRUCTIONS_PER_QUANTUM);
        assert_eq!(
            core.emulated_ns(),
            instructions_to_ns(INSTRUCTIONS_PER_QUANTUM)
        );
    }
}
