//! Interrupt controller (IE/IF/WAITCNT/IME).
//!
//! Sixteen input lines are latched into IF. The single output towards the
//! CPU is asserted while the master enable is on and any latched source is
//! also enabled in IE.
//!
//! Register window at 0x04000200:
//! - `0x00` IE: enable mask. A 32-bit write also acknowledges IF with its
//!   upper half.
//! - `0x02` IF: pending sources; writing 1 to a bit clears it.
//! - `0x04` WAITCNT: stored, not interpreted.
//! - `0x08` IME: bit 0 set means interrupts are *disabled*.
//!
//! # References
//! - [GBATEK Interrupt Control](https://problemkaputt.de/gbatek.htm#gbainterruptcontrol)

use super::{Peripheral, check_width_max};
use crate::irq::IrqSink;
use gbaemu_hw::irq::LINE_COUNT;
use gbaemu_hw::mmio::pic::{WAITCNT_MASK, registers as regs};
use tracing::{debug, trace, warn};

#[derive(Debug, Default)]
pub struct Pic {
    /// Global enable
    pub master: bool,
    /// Pending sources (IF)
    pub level: u16,
    /// Enabled sources (IE)
    pub irq_enabled: u16,
    pub waitcnt: u16,
    output: bool,
}

impl Pic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregated interrupt output towards the CPU
    pub fn output(&self) -> bool {
        self.output
    }

    /// Drive one of the sixteen input lines
    pub fn set_input_line(&mut self, index: usize, level: bool) {
        if index >= LINE_COUNT {
            warn!("Ignoring out-of-range IRQ line {} (level={})", index, level);
            return;
        }
        let bit = 1u16 << index;
        if level {
            self.level |= bit;
        } else {
            self.level &= !bit;
        }
        self.update();
    }

    fn update(&mut self) {
        let output = self.master && (self.level & self.irq_enabled) != 0;
        if output != self.output {
            debug!(
                "IRQ output {} (IE={:#06X} IF={:#06X} master={})",
                if output { "asserted" } else { "deasserted" },
                self.irq_enabled,
                self.level,
                self.master
            );
        }
        self.output = output;
    }
}

impl IrqSink for Pic {
    fn set_irq(&mut self, line: usize, level: bool) {
        self.set_input_line(line, level);
    }
}

impl Peripheral for Pic {
    fn name(&self) -> &str {
        "pic"
    }

    fn read(&mut self, offset: u32, size: usize) -> u32 {
        trace!("PIC register read: offset={:#X}, size={}", offset, size);

        match offset {
            regs::IE => {
                check_width_max(self.name(), offset, size, 4);
                if size == 4 {
                    self.irq_enabled as u32 | (self.level as u32) << 16
                } else {
                    self.irq_enabled as u32
                }
            }
            regs::IF => {
                check_width_max(self.name(), offset, size, 2);
                self.level as u32
            }
            regs::WAITCNT => {
                check_width_max(self.name(), offset, size, 4);
                self.waitcnt as u32
            }
            regs::IME => {
                check_width_max(self.name(), offset, size, 4);
                !self.master as u32
            }
            _ => {
                warn!("Unknown PIC register read: offset={:#X}", offset);
                0
            }
        }
    }

    fn write(&mut self, offset: u32, size: usize, value: u32) {
        trace!(
            "PIC register write: offset={:#X}, size={}, value={:#X}",
            offset, size, value
        );

        match offset {
            regs::IE => {
                check_width_max(self.name(), offset, size, 4);
                self.irq_enabled = value as u16;
                // A word store covers IF as well
                if size == 4 {
                    self.level &= !((value >> 16) as u16);
                }
            }
            regs::IF => {
                check_width_max(self.name(), offset, size, 2);
                self.level &= !(value as u16);
            }
            regs::WAITCNT => {
                check_width_max(self.name(), offset, size, 4);
                self.waitcnt = (value & WAITCNT_MASK) as u16;
                debug!("WAITCNT: {:#06X}", self.waitcnt);
            }
            regs::IME => {
                check_width_max(self.name(), offset, size, 4);
                self.master = value & 1 == 0;
                debug!("IME: master {}", if self.master { "on" } else { "off" });
            }
            _ => {
                warn!(
                    "Unknown PIC register write: offset={:#X}, value={:#X}",
                    offset, value
                );
                return;
            }
        }

        self.update();
    }
}
