//! # References
//! - <https://problemkaputt.de/gbatek.htm#lcdiodisplaycontrol>
//! - <https://problemkaputt.de/gbatek.htm#lcdiointerruptsandstatus>

/// LCD controller base address
pub const BASE: u32 = 0x0400_0000;

/// Size of the LCD register window
pub const SIZE: u32 = 0x60;

/// LCD register offsets (relative to `BASE`)
pub mod registers {
    /// Display control
    pub const DISPCNT: u32 = 0x00;

    /// Display status and interrupt control
    pub const DISPSTAT: u32 = 0x04;

    /// Upper byte of DISPSTAT (V-count setting)
    pub const DISPSTAT_LYC: u32 = 0x05;

    /// Current scanline (read-only)
    pub const VCOUNT: u32 = 0x06;
}

/// DISPCNT bit layout
pub mod dispcnt {
    pub const BG_MODE_MASK: u32 = 0x7;
    pub const FRAME_SELECT: u32 = 1 << 4;
    pub const HBLANK_INTERVAL_FREE: u32 = 1 << 5;
    /// Set for one-dimensional OBJ character mapping
    pub const OBJ_VRAM_1D: u32 = 1 << 6;
    pub const FORCED_BLANK: u32 = 1 << 7;
    /// BG0-BG3 enable bits start here
    pub const DISPLAY_BG_SHIFT: u32 = 8;
    pub const DISPLAY_OBJ: u32 = 1 << 12;
    /// Window 0 and 1 enable bits start here
    pub const DISPLAY_WINDOW_SHIFT: u32 = 13;
    pub const DISPLAY_OBJ_WINDOW: u32 = 1 << 15;
}

/// DISPSTAT bit layout
pub mod dispstat {
    pub const VBLANK: u32 = 1 << 0;
    pub const HBLANK: u32 = 1 << 1;
    pub const VCOUNT_MATCH: u32 = 1 << 2;
    pub const VBLANK_IRQ_ENABLE: u32 = 1 << 3;
    pub const HBLANK_IRQ_ENABLE: u32 = 1 << 4;
    pub const VCOUNT_IRQ_ENABLE: u32 = 1 << 5;
    pub const LYC_SHIFT: u32 = 8;
}
