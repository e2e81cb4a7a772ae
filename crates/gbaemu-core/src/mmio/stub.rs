//! Stub handler for peripherals without an emulated state machine.
//!
//! DMA, timers, serial, keypad and system control only need to exist on the
//! bus so that software probing them keeps running. Reads return zero and
//! writes are dropped, each with a diagnostic.
//!
//! A stub still owns the interrupt lines of the peripheral it stands in for,
//! so the line assignment is reserved even though nothing drives them yet.

use super::Peripheral;
use crate::irq::IrqLine;
use tracing::warn;

#[derive(Debug)]
pub struct Stub {
    name: &'static str,
    irq_lines: Vec<IrqLine>,
}

impl Stub {
    pub fn new(name: &'static str, irq_lines: impl IntoIterator<Item = usize>) -> Self {
        Self {
            name,
            irq_lines: irq_lines.into_iter().map(IrqLine::new).collect(),
        }
    }

    pub fn irq_lines(&self) -> &[IrqLine] {
        &self.irq_lines
    }
}

impl Peripheral for Stub {
    fn name(&self) -> &str {
        self.name
    }

    fn read(&mut self, offset: u32, size: usize) -> u32 {
        warn!(
            "Unimplemented {} register read: offset={:#X}, size={}",
            self.name, offset, size
        );
        0
    }

    fn write(&mut self, offset: u32, size: usize, value: u32) {
        warn!(
            "Unimplemented {} register write: offset={:#X}, size={}, value={:#X}",
            self.name, offset, size, value
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_zero_and_ignores_writes() {
        let mut timer = Stub::new("timer", 3..7);
        timer.write(0x02, 2, 0x00C3);
        assert_eq!(timer.read(0x02, 2), 0);
        assert_eq!(timer.read(0x00, 4), 0);
    }

    #[test]
    fn owns_its_lines() {
        let dma = Stub::new("dma", 8..12);
        let lines: Vec<usize> = dma.irq_lines().iter().map(IrqLine::index).collect();
        assert_eq!(lines, vec![8, 9, 10, 11]);
        assert!(dma.irq_lines().iter().all(|l| !l.level()));
    }
}
