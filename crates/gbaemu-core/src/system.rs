//! System composition: memory regions, peripherals and interrupt wiring.
//!
//! [`build_system`] lays out the GBA address space through the mirror engine,
//! places every peripheral on the I/O bus, checks that no two peripherals
//! share a register window or an interrupt line, and starts the display
//! clock.

use crate::address_space::{Access, AddressSpace, RegionId};
use crate::clock::{TimerId, VirtualClock};
use crate::framebuffer::Framebuffer;
use crate::mmio::{DeviceId, IoBus, PeripheralDescriptor};
use gbaemu_hw::irq;
use gbaemu_hw::memory_map::{self, io};
use gbaemu_hw::mmio::{lcd, pic, stubs};
use std::fmt;
use tracing::{debug, info, trace, warn};

/// Errors detected while wiring the system together
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemError {
    /// Two peripherals claim overlapping register windows
    OverlappingWindows(&'static str, &'static str),
    /// Two peripherals drive the same interrupt controller input
    SharedIrqLine {
        line: usize,
        first: &'static str,
        second: &'static str,
    },
    /// A peripheral names an input the interrupt controller does not have
    IrqLineOutOfRange { line: usize, device: &'static str },
    /// A peripheral with fixed interrupt outputs names the wrong number of lines
    IrqLineCount {
        device: &'static str,
        expected: usize,
        found: usize,
    },
    /// A register window lies outside the I/O region
    WindowOutsideIo(&'static str),
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemError::OverlappingWindows(a, b) => {
                write!(f, "register windows of {a} and {b} overlap")
            }
            SystemError::SharedIrqLine {
                line,
                first,
                second,
            } => write!(f, "IRQ line {line} is driven by both {first} and {second}"),
            SystemError::IrqLineOutOfRange { line, device } => {
                write!(f, "{device} drives nonexistent IRQ line {line}")
            }
            SystemError::IrqLineCount {
                device,
                expected,
                found,
            } => write!(f, "{device} drives {expected} IRQ lines, {found} assigned"),
            SystemError::WindowOutsideIo(name) => {
                write!(f, "register window of {name} is outside the I/O region")
            }
        }
    }
}

impl std::error::Error for SystemError {}

/// Configuration for [`build_system`]
#[derive(Debug, Clone)]
pub struct SystemConfig {
    /// Arm the display controller timer at time zero
    pub display_clock: bool,
    /// Peripheral placement; defaults to the GBA I/O map
    pub peripherals: Vec<PeripheralDescriptor>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            display_clock: true,
            peripherals: gba_peripherals(),
        }
    }
}

/// One memory region of the GBA map
struct RegionLayout {
    name: &'static str,
    start: u32,
    end: u32,
    size: usize,
    skip: u32,
    access: Access,
}

macro_rules! region {
    ($module:ident, $access:expr) => {
        RegionLayout {
            name: memory_map::$module::NAME,
            start: memory_map::$module::BASE,
            end: memory_map::$module::END,
            size: memory_map::$module::SIZE,
            skip: memory_map::$module::SKIP,
            access: $access,
        }
    };
}

fn gba_memory_layout() -> [RegionLayout; 8] {
    [
        region!(bios, Access::ReadOnly),
        region!(ext_wram, Access::ReadWrite),
        region!(int_wram, Access::ReadWrite),
        region!(palette_ram, Access::ReadWrite),
        region!(vram, Access::ReadWrite),
        region!(oam, Access::ReadWrite),
        region!(cart, Access::ReadOnly),
        region!(sram, Access::ReadWrite),
    ]
}

/// The GBA I/O map and interrupt line assignment
pub fn gba_peripherals() -> Vec<PeripheralDescriptor> {
    vec![
        PeripheralDescriptor {
            name: "lcd",
            device: DeviceId::Lcd,
            base: lcd::BASE,
            size: lcd::SIZE,
            irq_lines: irq::VBLANK..irq::VCOUNT + 1,
        },
        PeripheralDescriptor {
            name: "sound",
            device: DeviceId::Sound,
            base: stubs::sound::BASE,
            size: stubs::sound::SIZE,
            irq_lines: 0..0,
        },
        PeripheralDescriptor {
            name: "dma",
            device: DeviceId::Dma,
            base: stubs::dma::BASE,
            size: stubs::dma::SIZE,
            irq_lines: irq::DMA0..irq::DMA0 + 4,
        },
        PeripheralDescriptor {
            name: "timer",
            device: DeviceId::Timer,
            base: stubs::timer::BASE,
            size: stubs::timer::SIZE,
            irq_lines: irq::TIMER0..irq::TIMER0 + 4,
        },
        PeripheralDescriptor {
            name: "serial",
            device: DeviceId::Serial,
            base: stubs::serial::BASE,
            size: stubs::serial::SIZE,
            irq_lines: irq::SERIAL..irq::SERIAL + 1,
        },
        PeripheralDescriptor {
            name: "keypad",
            device: DeviceId::Keypad,
            base: stubs::keypad::BASE,
            size: stubs::keypad::SIZE,
            irq_lines: irq::KEYPAD..irq::KEYPAD + 1,
        },
        PeripheralDescriptor {
            name: "pic",
            device: DeviceId::Pic,
            base: pic::BASE,
            size: pic::SIZE,
            irq_lines: 0..0,
        },
        PeripheralDescriptor {
            name: "system",
            device: DeviceId::System,
            base: stubs::system::BASE,
            size: stubs::system::SIZE,
            irq_lines: 0..0,
        },
    ]
}

/// Number of interrupt outputs a device has, where that number is fixed
fn fixed_irq_line_count(device: DeviceId) -> Option<usize> {
    match device {
        DeviceId::Lcd => Some(3),
        DeviceId::Pic | DeviceId::Sound => Some(0),
        _ => None,
    }
}

/// Check that windows and interrupt lines are disjoint
pub fn validate_peripherals(peripherals: &[PeripheralDescriptor]) -> Result<(), SystemError> {
    let mut line_owner: [Option<&'static str>; irq::LINE_COUNT] = [None; irq::LINE_COUNT];

    for (i, p) in peripherals.iter().enumerate() {
        if p.base < io::BASE || p.base as u64 + p.size as u64 > io::END as u64 {
            return Err(SystemError::WindowOutsideIo(p.name));
        }

        if let Some(expected) = fixed_irq_line_count(p.device)
            && p.irq_lines.len() != expected
        {
            return Err(SystemError::IrqLineCount {
                device: p.name,
                expected,
                found: p.irq_lines.len(),
            });
        }

        for other in &peripherals[..i] {
            let (a, b) = (p.window(), other.window());
            if a.start < b.end && b.start < a.end {
                return Err(SystemError::OverlappingWindows(other.name, p.name));
            }
        }

        for line in p.irq_lines.clone() {
            let Some(owner) = line_owner.get_mut(line) else {
                return Err(SystemError::IrqLineOutOfRange {
                    line,
                    device: p.name,
                });
            };
            if let Some(first) = *owner {
                return Err(SystemError::SharedIrqLine {
                    line,
                    first,
                    second: p.name,
                });
            }
            *owner = Some(p.name);
        }
    }

    Ok(())
}

/// The complete hardware fabric: memory, peripherals, clock and display output
#[derive(Debug)]
pub struct System {
    pub memory: AddressSpace,
    pub io: IoBus,
    pub clock: VirtualClock,
    pub framebuffer: Framebuffer,
    bios: RegionId,
    cart: RegionId,
    palette: RegionId,
}

/// Build the system once, before the CPU starts
pub fn build_system(config: &SystemConfig) -> Result<System, SystemError> {
    info!("=== Building System ===");
    validate_peripherals(&config.peripherals)?;

    let mut memory = AddressSpace::new();
    let mut regions = Vec::new();
    for layout in gba_memory_layout() {
        regions.push(memory.create_mirrored_region(
            layout.name,
            layout.start,
            layout.end,
            layout.size,
            layout.skip,
            layout.access,
        ));
    }
    // Layout order: bios, ext_wram, int_wram, palette, vram, oam, cart, sram
    let (bios, palette, cart) = (regions[0], regions[3], regions[6]);

    for p in &config.peripherals {
        debug!(
            "  Peripheral {} at {:#010X} - {:#010X}, IRQ lines {:?}",
            p.name,
            p.base,
            p.base + p.size,
            p.irq_lines
        );
    }
    let io = IoBus::new(config.peripherals.clone());

    let mut clock = VirtualClock::new();
    if config.display_clock {
        clock.schedule(TimerId::Lcd, io.lcd.deadline());
    }

    Ok(System {
        memory,
        io,
        clock,
        framebuffer: Framebuffer::new(),
        bios,
        cart,
        palette,
    })
}

impl System {
    pub fn bios_region(&self) -> RegionId {
        self.bios
    }

    pub fn cart_region(&self) -> RegionId {
        self.cart
    }

    /// Current emulated time in nanoseconds
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Aggregated interrupt output towards the CPU
    pub fn irq_asserted(&self) -> bool {
        self.io.irq_asserted()
    }

    pub fn is_io(addr: u32) -> bool {
        (io::BASE..io::END).contains(&addr)
    }

    /// Bus read from the CPU's point of view
    pub fn read(&mut self, addr: u32, size: usize) -> u32 {
        if Self::is_io(addr) {
            return self.io.read(addr, size);
        }
        self.memory.read(addr, size).unwrap_or_else(|| {
            warn!("Unmapped read: addr={:#010X}, size={}", addr, size);
            0
        })
    }

    /// Bus write from the CPU's point of view
    pub fn write(&mut self, addr: u32, size: usize, value: u32) {
        if Self::is_io(addr) {
            self.io.write(addr, size, value);
        } else if !self.memory.write(addr, size, value) {
            warn!(
                "Unmapped write: addr={:#010X}, size={}, value={:#X}",
                addr, size, value
            );
        }
    }

    /// Fire every timer due up to `until`, in deadline order, then move the
    /// clock to `until`
    pub fn advance_to(&mut self, until: u64) {
        while let Some((at, id)) = self.clock.pop_due(until) {
            trace!("Timer {:?} fired at {}", id, at);
            match id {
                TimerId::Lcd => {
                    let next = self.io.lcd_timer(&mut self.framebuffer);
                    self.clock.schedule(TimerId::Lcd, next);
                }
            }
        }
        self.clock.finish_at(until);
    }

    pub fn advance_by(&mut self, ns: u64) {
        self.advance_to(self.clock.now() + ns);
    }

    /// Reload the framebuffer backdrop from palette entry 0
    pub fn refresh_backdrop(&mut self) {
        let data = self.memory.region(self.palette).data();
        let color = u16::from_le_bytes([data[0], data[1]]);
        self.framebuffer.set_backdrop_bgr555(color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbaemu_hw::specs::display::{FRAME_NS, LINE_NS};

    fn system() -> System {
        build_system(&SystemConfig::default()).unwrap()
    }

    #[test]
    fn default_layout_is_valid() {
        assert_eq!(validate_peripherals(&gba_peripherals()), Ok(()));
    }

    #[test]
    fn memory_map_matches_hardware() {
        let system = system();
        let starts: Vec<(u32, bool)> = system
            .memory
            .mappings()
            .iter()
            .map(|m| (m.start, m.alias))
            .collect();

        assert_eq!(
            starts,
            vec![
                (0x0000_0000, false),
                (0x0200_0000, false),
                (0x02FC_0000, true),
                (0x0300_0000, false),
                (0x03FF_8000, true),
                (0x0500_0000, false),
                (0x05FF_FC00, true),
                (0x0600_0000, false),
                (0x06FE_0000, true),
                (0x0700_0000, false),
                (0x07FF_FC00, true),
                (0x0800_0000, false),
                (0x0C00_0000, true),
                (0x0E00_0000, false),
                (0x0FFF_0000, true),
            ]
        );
    }

    #[test]
    fn irq_vector_mirror_reaches_internal_wram() {
        let mut system = system();
        system.write(0x03FF_FFFC, 4, 0x0800_1234);
        assert_eq!(system.read(0x0300_7FFC, 4), 0x0800_1234);
    }

    #[test]
    fn rom_writes_are_dropped() {
        let mut system = system();
        let cart = system.cart_region();
        system.memory.load_image(cart, 0, &[0xEA, 0x00]).unwrap();

        system.write(0x0800_0000, 2, 0xFFFF);
        system.write(0x0C00_0000, 2, 0xFFFF);
        assert_eq!(system.read(0x0800_0000, 2), 0x00EA);
        assert_eq!(system.read(0x0C00_0000, 2), 0x00EA);
    }

    #[test]
    fn io_accesses_reach_peripherals() {
        let mut system = system();
        system.write(pic::BASE, 2, 0x0001);
        assert_eq!(system.io.pic.irq_enabled, 0x0001);

        system.write(lcd::BASE + 4, 2, 0x0008);
        assert!(system.io.lcd.irq_vb_en);

        assert_eq!(system.read(stubs::timer::BASE, 2), 0);
        assert_eq!(system.read(0x0400_0800, 4), 0);
    }

    #[test]
    fn overlapping_windows_are_rejected() {
        let mut peripherals = gba_peripherals();
        peripherals[1].base = lcd::BASE + 0x10;
        assert_eq!(
            validate_peripherals(&peripherals),
            Err(SystemError::OverlappingWindows("lcd", "sound"))
        );
    }

    #[test]
    fn shared_irq_lines_are_rejected() {
        let mut peripherals = gba_peripherals();
        peripherals[3].irq_lines = irq::HBLANK..irq::HBLANK + 1;
        assert_eq!(
            validate_peripherals(&peripherals),
            Err(SystemError::SharedIrqLine {
                line: irq::HBLANK,
                first: "lcd",
                second: "timer",
            })
        );
    }

    #[test]
    fn out_of_range_irq_line_is_rejected() {
        let mut peripherals = gba_peripherals();
        peripherals[4].irq_lines = 15..17;
        assert_eq!(
            validate_peripherals(&peripherals),
            Err(SystemError::IrqLineOutOfRange {
                line: 16,
                device: "serial"
            })
        );
    }

    #[test]
    fn lcd_with_wrong_line_count_is_rejected() {
        let mut peripherals = gba_peripherals();
        peripherals[0].irq_lines = irq::VBLANK..irq::HBLANK + 1;
        assert_eq!(
            validate_peripherals(&peripherals),
            Err(SystemError::IrqLineCount {
                device: "lcd",
                expected: 3,
                found: 2,
            })
        );
    }

    #[test]
    fn relocated_lcd_lines_reach_the_pic() {
        let mut peripherals = gba_peripherals();
        peripherals[0].irq_lines = 13..16;
        peripherals[3].irq_lines = 0..4;
        let config = SystemConfig {
            peripherals,
            ..Default::default()
        };
        let mut system = build_system(&config).unwrap();
        let lines: Vec<usize> = system.io.lcd.irq_lines().iter().map(|l| l.index()).collect();
        assert_eq!(lines, vec![13, 14, 15]);

        system.write(lcd::BASE + 4, 2, lcd::dispstat::VBLANK_IRQ_ENABLE);
        system.advance_to(LINE_NS * 161);
        assert!(system.io.lcd.in_vblank());
        assert_eq!(system.io.pic.level, 1 << 13);
    }

    #[test]
    fn stubs_own_their_assigned_lines() {
        let system = system();
        let lines = |stub: &crate::mmio::Stub| -> Vec<usize> {
            stub.irq_lines().iter().map(|l| l.index()).collect()
        };
        assert_eq!(lines(&system.io.timer), vec![3, 4, 5, 6]);
        assert_eq!(lines(&system.io.serial), vec![7]);
        assert_eq!(lines(&system.io.dma), vec![8, 9, 10, 11]);
        assert_eq!(lines(&system.io.keypad), vec![12]);
        assert!(lines(&system.io.system).is_empty());
    }

    #[test]
    fn display_clock_runs_frames() {
        let mut system = system();

        system.advance_to(FRAME_NS);
        assert_eq!(system.io.lcd.ly, 0);
        assert_eq!(system.framebuffer.frame_count(), 1);
        assert_eq!(system.now(), FRAME_NS);

        system.advance_by(LINE_NS * 10);
        assert_eq!(system.io.lcd.ly, 10);
    }

    #[test]
    fn system_without_display_clock_stays_idle() {
        let config = SystemConfig {
            display_clock: false,
            ..Default::default()
        };
        let mut system = build_system(&config).unwrap();
        system.advance_to(FRAME_NS);
        assert_eq!(system.io.lcd.ly, 0);
        assert!(!system.io.lcd.hblank);
    }

    #[test]
    fn backdrop_comes_from_palette_entry_zero() {
        let mut system = system();
        system.write(0x0500_0000, 2, 0x001F);
        system.refresh_backdrop();
        assert_eq!(system.framebuffer.backdrop(), 0xFF0000);
    }
}
