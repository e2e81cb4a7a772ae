//! Memory-mapped I/O peripherals.
//!
//! Every peripheral exposes a register window through [`Peripheral`]. The
//! [`IoBus`] owns all of them together with a list of descriptors (window and
//! interrupt lines) built once at system construction, and routes bus
//! addresses to the owning peripheral.
//!
//! # I/O Map
//! According to [GBATEK I/O Map](https://problemkaputt.de/gbatek.htm#gbaiomap):
//! - `0x04000000-0x04000060`: LCD
//! - `0x04000060-0x040000B0`: Sound
//! - `0x040000B0-0x040000E0`: DMA
//! - `0x04000100-0x04000110`: Timers
//! - `0x04000120-0x04000130`: Serial
//! - `0x04000130-0x04000134`: Keypad
//! - `0x04000200-0x04000300`: Interrupt controller, WAITCNT, IME
//! - `0x04000300-0x04000400`: System control

use crate::framebuffer::DisplaySink;
use std::ops::Range;
use tracing::{trace, warn};

pub mod lcd;
pub mod pic;
pub mod sound;
pub mod stub;

pub use lcd::{DispCnt, Lcd};
pub use pic::Pic;
pub use sound::SoundLatch;
pub use stub::Stub;

/// A register window on the I/O bus.
///
/// Offsets are relative to the peripheral's base address and `size` is the
/// access width in bytes (1, 2 or 4). Neither operation can fail: accesses
/// to registers a peripheral does not model are diagnostics, not errors.
pub trait Peripheral {
    fn name(&self) -> &str;

    fn read(&mut self, offset: u32, size: usize) -> u32;

    fn write(&mut self, offset: u32, size: usize, value: u32);
}

/// Flag an access wider than the register it targets.
///
/// The access still goes ahead using the register's own width.
pub fn check_width_max(device: &str, offset: u32, size: usize, max: usize) {
    if size > max {
        warn!(
            "{}: bad access size {} (on register {:#X})",
            device, size, offset
        );
    }
}

/// Peripherals present on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceId {
    Lcd,
    Sound,
    Dma,
    Timer,
    Serial,
    Keypad,
    Pic,
    System,
}

/// Placement of one peripheral: its register window and the interrupt
/// controller inputs it drives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeripheralDescriptor {
    pub name: &'static str,
    pub device: DeviceId,
    pub base: u32,
    pub size: u32,
    pub irq_lines: Range<usize>,
}

impl PeripheralDescriptor {
    pub fn window(&self) -> Range<u32> {
        self.base..self.base + self.size
    }
}

#[derive(Debug)]
pub struct IoBus {
    pub pic: Pic,
    pub lcd: Lcd,
    pub sound: SoundLatch,
    pub dma: Stub,
    pub timer: Stub,
    pub serial: Stub,
    pub keypad: Stub,
    pub system: Stub,
    descriptors: Vec<PeripheralDescriptor>,
}

impl IoBus {
    /// Instantiate every peripheral named by `descriptors`.
    ///
    /// The descriptors are expected to be validated already.
    pub fn new(descriptors: Vec<PeripheralDescriptor>) -> Self {
        let lines_of = |device: DeviceId| {
            descriptors
                .iter()
                .find(|d| d.device == device)
                .map(|d| d.irq_lines.clone())
                .unwrap_or(0..0)
        };
        let stub = |name: &'static str, device: DeviceId| Stub::new(name, lines_of(device));
        let lcd = match lines_of(DeviceId::Lcd) {
            lines if lines.is_empty() => Lcd::new(),
            lines => Lcd::with_irq_lines(lines.start),
        };
        let dma = stub("dma", DeviceId::Dma);
        let timer = stub("timer", DeviceId::Timer);
        let serial = stub("serial", DeviceId::Serial);
        let keypad = stub("keypad", DeviceId::Keypad);
        let system = stub("system", DeviceId::System);

        Self {
            pic: Pic::new(),
            lcd,
            sound: SoundLatch::new(),
            dma,
            timer,
            serial,
            keypad,
            system,
            descriptors,
        }
    }

    pub fn descriptors(&self) -> &[PeripheralDescriptor] {
        &self.descriptors
    }

    pub fn device_mut(&mut self, device: DeviceId) -> &mut dyn Peripheral {
        match device {
            DeviceId::Lcd => &mut self.lcd,
            DeviceId::Sound => &mut self.sound,
            DeviceId::Dma => &mut self.dma,
            DeviceId::Timer => &mut self.timer,
            DeviceId::Serial => &mut self.serial,
            DeviceId::Keypad => &mut self.keypad,
            DeviceId::Pic => &mut self.pic,
            DeviceId::System => &mut self.system,
        }
    }

    fn route(&self, addr: u32) -> Option<(DeviceId, u32)> {
        self.descriptors
            .iter()
            .find(|d| d.window().contains(&addr))
            .map(|d| (d.device, addr - d.base))
    }

    /// Read from an absolute I/O address
    pub fn read(&mut self, addr: u32, size: usize) -> u32 {
        match self.route(addr) {
            Some((device, offset)) => self.device_mut(device).read(offset, size),
            None => {
                warn!("Unmapped I/O read: addr={:#010X}, size={}", addr, size);
                0
            }
        }
    }

    /// Write to an absolute I/O address
    pub fn write(&mut self, addr: u32, size: usize, value: u32) {
        match self.route(addr) {
            Some((device, offset)) => {
                trace!(
                    "I/O write: addr={:#010X}, size={}, value={:#X}",
                    addr, size, value
                );
                self.device_mut(device).write(offset, size, value);
            }
            None => {
                warn!(
                    "Unmapped I/O write: addr={:#010X}, size={}, value={:#X}",
                    addr, size, value
                );
            }
        }
    }

    /// Aggregated interrupt output towards the CPU
    pub fn irq_asserted(&self) -> bool {
        self.pic.output()
    }

    /// Run the display controller's timer callback once.
    ///
    /// Returns the absolute deadline for the next firing.
    pub fn lcd_timer(&mut self, display: &mut dyn DisplaySink) -> u64 {
        self.lcd.on_timer(&mut self.pic, display)
    }
}
