/// CPU frequency specifications
pub mod cpu {
    /// ARM7TDMI clock (16.78 MHz, 2^24 Hz)
    pub const HZ: u64 = 16_777_216;
}

/// Display specifications
pub mod display {
    /// Visible width in pixels
    pub const WIDTH: u32 = 240;

    /// Visible height in pixels (number of drawn scanlines)
    pub const HEIGHT: u32 = 160;

    /// Total scanlines per frame, including V-blank
    pub const TOTAL_LINES: u32 = 228;

    /// Last scanline reported as in V-blank by DISPSTAT
    ///
    /// Line 227 is part of the blanking period but hardware clears the flag
    /// there already.
    pub const LAST_VBLANK_LINE: u32 = 226;

    /// Duration of the drawing part of a scanline in nanoseconds
    pub const DRAW_NS: u64 = 57_221;

    /// Duration of the H-blank part of a scanline in nanoseconds
    pub const HBLANK_NS: u64 = 16_212;

    /// Duration of one full scanline in nanoseconds
    pub const LINE_NS: u64 = DRAW_NS + HBLANK_NS;

    /// Duration of one frame in nanoseconds (~59.7 Hz)
    pub const FRAME_NS: u64 = LINE_NS * TOTAL_LINES as u64;
}
