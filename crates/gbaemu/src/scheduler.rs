//! CPU scheduling against the virtual clock.
//!
//! The CPU runs in quanta of at most a fixed number of instructions. A code
//! hook counts every instruction actually executed; after each quantum that
//! count is converted to emulated time and the system clock is advanced,
//! which fires any display timer callbacks that became due in the meantime.
//!
//! Read-only regions are mapped without write permission, so a store to ROM
//! faults the CPU. The scheduler drops such a store by stepping over the
//! faulting instruction and resuming.

use gbaemu_core::System;
use gbaemu_hw::specs::{cpu, display};
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, error, trace};
use unicorn_engine::{RegisterARM, Unicorn, unicorn_const::uc_error};

// ================================================================================================
// Emulation Timing Constants
// ================================================================================================

/// CPU cycles per frame (280,896 on hardware)
pub const INSTRUCTIONS_PER_FRAME: usize = (cpu::HZ * display::FRAME_NS / 1_000_000_000) as usize;

/// Number of emulation quanta per frame
/// One quantum per scanline keeps interrupt latency below a line.
pub const QUANTUMS_PER_FRAME: usize = display::TOTAL_LINES as usize;

/// Instructions to execute per quantum
pub const INSTRUCTIONS_PER_QUANTUM: usize = INSTRUCTIONS_PER_FRAME / QUANTUMS_PER_FRAME; // 1232

/// CPSR Thumb state bit
const CPSR_THUMB: u64 = 1 << 5;

/// Instruction sizes in ARM and Thumb state
const ARM_INSN_SIZE: u64 = 4;
const THUMB_INSN_SIZE: u64 = 2;

/// Result of running a single quantum
#[derive(Debug, Clone, PartialEq)]
pub enum QuantumResult {
    /// Quantum completed successfully, continue execution
    Continue,
    /// An error occurred during execution
    Error(String),
}

/// Configuration for the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Instructions per quantum
    pub quantum: usize,
    /// Stop when PC reaches this address
    pub stop_pc: Option<u64>,
    /// Stop after this many instructions
    pub max_instructions: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            quantum: INSTRUCTIONS_PER_QUANTUM,
            stop_pc: None,
            max_instructions: None,
        }
    }
}

/// Convert an instruction count to emulated nanoseconds (one cycle each)
pub fn instructions_to_ns(instructions: usize) -> u64 {
    (instructions as u128 * 1_000_000_000 / cpu::HZ as u128) as u64
}

/// Scheduler for interleaving CPU execution with the virtual clock
pub struct Scheduler {
    config: SchedulerConfig,
    pc: u64,
    executed: Rc<Cell<usize>>,
    total_executed: usize,
    stopped: bool,
    irq_asserted: bool,
}

impl Scheduler {
    /// Create a new scheduler, pointing the CPU at `entry` and installing
    /// the instruction counter
    pub fn new(
        emu: &mut Unicorn<'static, System>,
        config: SchedulerConfig,
        entry: u64,
    ) -> Result<Self, String> {
        emu.reg_write(RegisterARM::PC, entry)
            .map_err(|e| format!("Failed to set entry point: {:?}", e))?;

        let executed = Rc::new(Cell::new(0usize));
        let counter = executed.clone();
        emu.add_code_hook(0, u64::MAX, move |_, _, _| {
            counter.set(counter.get() + 1);
        })
        .map_err(|e| format!("Failed to add instruction counter: {:?}", e))?;

        Ok(Self {
            config,
            pc: entry,
            executed,
            total_executed: 0,
            stopped: false,
            irq_asserted: false,
        })
    }

    /// Check if the CPU reached its stop PC
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    /// Get the current PC
    pub fn pc(&self) -> u64 {
        self.pc
    }

    /// Get total instructions executed
    pub fn total_executed(&self) -> usize {
        self.total_executed
    }

    /// Check if any stop condition is met
    pub fn check_stop_conditions(&self) -> bool {
        if self.stopped {
            return true;
        }

        if let Some(max) = self.config.max_instructions
            && self.total_executed >= max
        {
            return true;
        }

        false
    }

    fn is_stop_pc(&self, pc: u64) -> bool {
        self.config.stop_pc == Some(pc)
    }

    fn is_thumb(emu: &Unicorn<'static, System>) -> Result<bool, uc_error> {
        Ok(emu.reg_read(RegisterARM::CPSR)? & CPSR_THUMB != 0)
    }

    /// Address to resume at, with bit 0 set when the CPU is in Thumb state
    fn resume_address(emu: &Unicorn<'static, System>) -> Result<u64, uc_error> {
        let pc = emu.reg_read(RegisterARM::PC)?;
        Ok(if Self::is_thumb(emu)? { pc | 1 } else { pc })
    }

    /// Step over the store at `pc` that faulted on a read-only page
    fn skip_rom_store(emu: &mut Unicorn<'static, System>, pc: u64) -> Result<(), uc_error> {
        let size = if Self::is_thumb(emu)? {
            THUMB_INSN_SIZE
        } else {
            ARM_INSN_SIZE
        };
        trace!("Dropped ROM store at pc={:#010X}", pc);
        emu.reg_write(RegisterARM::PC, pc + size)
    }

    /// Run the CPU for up to one quantum, stopping early at the stop PC
    fn execute(&mut self, emu: &mut Unicorn<'static, System>) -> Result<(), String> {
        let start = self.executed.get();
        let until = self.config.stop_pc.unwrap_or(u64::MAX);

        loop {
            let remaining = self
                .config
                .quantum
                .saturating_sub(self.executed.get() - start);
            if remaining == 0 {
                return Ok(());
            }

            let begin = Self::resume_address(emu).map_err(|e| format!("{:?}", e))?;
            let result = emu.emu_start(begin, until, 0, remaining);
            self.pc = emu
                .reg_read(RegisterARM::PC)
                .map_err(|e| format!("{:?}", e))?;

            match result {
                Ok(()) => {
                    if self.is_stop_pc(self.pc) {
                        self.stopped = true;
                    }
                    return Ok(());
                }
                Err(uc_error::WRITE_PROT) => {
                    Self::skip_rom_store(emu, self.pc).map_err(|e| format!("{:?}", e))?;
                }
                // Hitting the stop address ends emulation rather than failing it
                Err(_) if self.is_stop_pc(self.pc) => {
                    self.stopped = true;
                    return Ok(());
                }
                Err(e) => {
                    error!("CPU fault at {:#010X}: {:?}", self.pc, e);
                    return Err(format!("CPU: {:?}", e));
                }
            }
        }
    }

    /// Run a single quantum of execution and advance the clock to match
    pub fn run_quantum(&mut self, emu: &mut Unicorn<'static, System>) -> QuantumResult {
        if self.stopped {
            return QuantumResult::Continue;
        }

        let result = self.execute(emu);
        self.total_executed = self.executed.get();
        if let Err(e) = result {
            return QuantumResult::Error(e);
        }

        let system = emu.get_data_mut();
        system.advance_to(instructions_to_ns(self.total_executed));
        system.refresh_backdrop();

        let irq = system.irq_asserted();
        if irq != self.irq_asserted {
            debug!(
                "CPU IRQ input {} at pc={:#010X}",
                if irq { "raised" } else { "lowered" },
                self.pc
            );
            self.irq_asserted = irq;
        }

        QuantumResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_budget_matches_hardware() {
        assert_eq!(INSTRUCTIONS_PER_FRAME, 280_896);
        assert_eq!(INSTRUCTIONS_PER_QUANTUM, 1232);
    }

    #[test]
    fn instruction_time_conversion() {
        assert_eq!(instructions_to_ns(0), 0);
        assert_eq!(instructions_to_ns(cpu::HZ as usize), 1_000_000_000);
        let frame = instructions_to_ns(INSTRUCTIONS_PER_FRAME);
        assert!(frame.abs_diff(display::FRAME_NS) < 100);
    }
}
