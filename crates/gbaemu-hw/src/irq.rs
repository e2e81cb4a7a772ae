//! Interrupt controller input line assignment.
//!
//! Each line index is the bit position of the source in IE and IF.
//!
//! # References
//! - <https://problemkaputt.de/gbatek.htm#gbainterruptcontrol>

/// Number of interrupt controller input lines
pub const LINE_COUNT: usize = 16;

pub const VBLANK: usize = 0;
pub const HBLANK: usize = 1;
pub const VCOUNT: usize = 2;
/// Timer 0 overflow; timers 1-3 follow on consecutive lines
pub const TIMER0: usize = 3;
pub const SERIAL: usize = 7;
/// DMA 0 complete; DMA 1-3 follow on consecutive lines
pub const DMA0: usize = 8;
pub const KEYPAD: usize = 12;
pub const GAMEPAK: usize = 13;
