//! LCD controller: scanline timing, DISPCNT/DISPSTAT/VCOUNT and the three
//! display interrupts.
//!
//! A scanline is a drawing phase followed by an H-blank phase. The controller
//! is driven by a single timer that fires at the end of each phase:
//!
//! ```text
//!   draw (57221 ns) --> hblank (16212 ns) --> ly += 1, draw --> ...
//! ```
//!
//! 228 lines make a frame: 160 visible lines and 68 lines of V-blank.
//!
//! # References
//! - [GBATEK LCD I/O Display Control](https://problemkaputt.de/gbatek.htm#lcdiodisplaycontrol)
//! - [GBATEK LCD I/O Interrupts and Status](https://problemkaputt.de/gbatek.htm#lcdiointerruptsandstatus)

use super::{Peripheral, check_width_max};
use crate::framebuffer::DisplaySink;
use crate::irq::{IrqLine, IrqSink};
use gbaemu_hw::irq;
use gbaemu_hw::mmio::lcd::{dispcnt, dispstat, registers as regs};
use gbaemu_hw::specs::display::{DRAW_NS, HBLANK_NS, HEIGHT, LAST_VBLANK_LINE, TOTAL_LINES};
use tracing::{debug, trace, warn};

/// DISPCNT fields. Stored and read back; nothing here affects timing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispCnt {
    pub bg_mode: u8,
    /// Frame select for bitmap modes 4 and 5
    pub bgm_45_frame: bool,
    pub hb_intvl_free: bool,
    /// Two-dimensional OBJ character mapping (DISPCNT bit 6 clear)
    pub obj_vram_map_2d: bool,
    pub forced_blank: bool,
    pub display_bg: [bool; 4],
    pub display_obj: bool,
    pub display_wnd: [bool; 2],
    pub display_ownd: bool,
}

impl DispCnt {
    pub fn from_bits(value: u32) -> Self {
        let bit = |n: u32| (value >> n) & 1 != 0;
        Self {
            bg_mode: (value & dispcnt::BG_MODE_MASK) as u8,
            bgm_45_frame: value & dispcnt::FRAME_SELECT != 0,
            hb_intvl_free: value & dispcnt::HBLANK_INTERVAL_FREE != 0,
            obj_vram_map_2d: value & dispcnt::OBJ_VRAM_1D == 0,
            forced_blank: value & dispcnt::FORCED_BLANK != 0,
            display_bg: std::array::from_fn(|i| bit(dispcnt::DISPLAY_BG_SHIFT + i as u32)),
            display_obj: value & dispcnt::DISPLAY_OBJ != 0,
            display_wnd: std::array::from_fn(|i| bit(dispcnt::DISPLAY_WINDOW_SHIFT + i as u32)),
            display_ownd: value & dispcnt::DISPLAY_OBJ_WINDOW != 0,
        }
    }

    pub fn to_bits(&self) -> u32 {
        let flag = |set: bool, mask: u32| if set { mask } else { 0 };
        let mut value = self.bg_mode as u32 & dispcnt::BG_MODE_MASK;
        value |= flag(self.bgm_45_frame, dispcnt::FRAME_SELECT);
        value |= flag(self.hb_intvl_free, dispcnt::HBLANK_INTERVAL_FREE);
        value |= flag(!self.obj_vram_map_2d, dispcnt::OBJ_VRAM_1D);
        value |= flag(self.forced_blank, dispcnt::FORCED_BLANK);
        for (i, &on) in self.display_bg.iter().enumerate() {
            value |= flag(on, 1 << (dispcnt::DISPLAY_BG_SHIFT + i as u32));
        }
        value |= flag(self.display_obj, dispcnt::DISPLAY_OBJ);
        for (i, &on) in self.display_wnd.iter().enumerate() {
            value |= flag(on, 1 << (dispcnt::DISPLAY_WINDOW_SHIFT + i as u32));
        }
        value |= flag(self.display_ownd, dispcnt::DISPLAY_OBJ_WINDOW);
        value
    }
}

#[derive(Debug)]
pub struct Lcd {
    /// Current scanline, 0..=227
    pub ly: u32,
    /// V-count compare value (DISPSTAT upper byte)
    pub lyc: u32,
    pub hblank: bool,
    pub irq_vb_en: bool,
    pub irq_hb_en: bool,
    pub irq_vm_en: bool,
    pub dispcnt: DispCnt,

    irq_vb: IrqLine,
    irq_hb: IrqLine,
    irq_vm: IrqLine,

    /// Absolute time of the next timer firing
    deadline: u64,
}

impl Lcd {
    #[expect(clippy::new_without_default)]
    pub fn new() -> Self {
        Self::with_irq_lines(irq::VBLANK)
    }

    /// Controller whose V-blank, H-blank and V-count outputs drive
    /// `first`, `first + 1` and `first + 2`
    pub fn with_irq_lines(first: usize) -> Self {
        Self {
            ly: 0,
            lyc: 0,
            hblank: false,
            irq_vb_en: false,
            irq_hb_en: false,
            irq_vm_en: false,
            dispcnt: DispCnt::default(),
            irq_vb: IrqLine::new(first),
            irq_hb: IrqLine::new(first + 1),
            irq_vm: IrqLine::new(first + 2),
            deadline: 0,
        }
    }

    /// Interrupt outputs in V-blank, H-blank, V-count order
    pub fn irq_lines(&self) -> [IrqLine; 3] {
        [self.irq_vb, self.irq_hb, self.irq_vm]
    }

    /// Absolute time at which the timer must fire next
    pub fn deadline(&self) -> u64 {
        self.deadline
    }

    pub fn in_vblank(&self) -> bool {
        (HEIGHT..=LAST_VBLANK_LINE).contains(&self.ly)
    }

    /// Advance the scan state by one phase.
    ///
    /// Returns the absolute deadline for the next call. Deadlines accumulate
    /// from the previous deadline rather than from the time the timer was
    /// serviced, so servicing latency does not drift the frame rate.
    pub fn on_timer(&mut self, irq: &mut dyn IrqSink, display: &mut dyn DisplaySink) -> u64 {
        if self.hblank {
            self.ly += 1;
            if self.ly >= TOTAL_LINES {
                self.ly = 0;
            }

            self.irq_vb.set(irq, self.irq_vb_en && self.ly >= HEIGHT);
            self.irq_vm.set(irq, self.irq_vm_en && self.ly == self.lyc);
        }

        self.hblank = !self.hblank;
        self.irq_hb.set(irq, self.irq_hb_en && self.hblank);

        if !self.hblank {
            display.emit_line(self.ly, self.dispcnt.forced_blank);
            if self.ly == HEIGHT - 1 {
                display.end_frame();
            }
        }

        self.deadline += if self.hblank { HBLANK_NS } else { DRAW_NS };
        self.deadline
    }

    fn dispstat(&self) -> u32 {
        let flag = |set: bool, mask: u32| if set { mask } else { 0 };
        flag(self.in_vblank(), dispstat::VBLANK)
            | flag(self.hblank, dispstat::HBLANK)
            | flag(self.ly == self.lyc, dispstat::VCOUNT_MATCH)
            | flag(self.irq_vb_en, dispstat::VBLANK_IRQ_ENABLE)
            | flag(self.irq_hb_en, dispstat::HBLANK_IRQ_ENABLE)
            | flag(self.irq_vm_en, dispstat::VCOUNT_IRQ_ENABLE)
            | self.lyc << dispstat::LYC_SHIFT
    }
}

impl Peripheral for Lcd {
    fn name(&self) -> &str {
        "lcd"
    }

    fn read(&mut self, offset: u32, size: usize) -> u32 {
        trace!("LCD register read: offset={:#X}, size={}", offset, size);

        match offset {
            regs::DISPCNT => {
                check_width_max(self.name(), offset, size, 4);
                self.dispcnt.to_bits()
            }
            regs::DISPSTAT => {
                check_width_max(self.name(), offset, size, 2);
                self.dispstat()
            }
            regs::VCOUNT => {
                check_width_max(self.name(), offset, size, 2);
                self.ly
            }
            _ => {
                warn!("Unknown LCD register read: offset={:#X}", offset);
                0
            }
        }
    }

    fn write(&mut self, offset: u32, size: usize, value: u32) {
        trace!(
            "LCD register write: offset={:#X}, size={}, value={:#X}",
            offset, size, value
        );

        match offset {
            regs::DISPCNT => {
                check_width_max(self.name(), offset, size, 4);
                self.dispcnt = DispCnt::from_bits(value);
                debug!("DISPCNT: {:?}", self.dispcnt);
            }
            regs::DISPSTAT => {
                check_width_max(self.name(), offset, size, 4);
                self.irq_vb_en = value & dispstat::VBLANK_IRQ_ENABLE != 0;
                self.irq_hb_en = value & dispstat::HBLANK_IRQ_ENABLE != 0;
                self.irq_vm_en = value & dispstat::VCOUNT_IRQ_ENABLE != 0;
                debug!(
                    "DISPSTAT: vblank irq={} hblank irq={} vcount irq={}",
                    self.irq_vb_en, self.irq_hb_en, self.irq_vm_en
                );
                // Anything wider than a byte carries on into the LYC byte
                if size > 1 {
                    self.write(regs::DISPSTAT_LYC, size - 1, value >> 8);
                }
            }
            regs::DISPSTAT_LYC => {
                check_width_max(self.name(), offset, size, 3);
                self.lyc = value & 0xff;
                debug!("LYC: {}", self.lyc);
            }
            regs::VCOUNT => {
                trace!("Ignoring write to read-only VCOUNT");
            }
            _ => {
                warn!(
                    "Unknown LCD register write: offset={:#X}, value={:#X}",
                    offset, value
                );
            }
        }
    }
}
