//! # References
//! - <https://problemkaputt.de/gbatek.htm#gbainterruptcontrol>
//! - <https://problemkaputt.de/gbatek.htm#gbasystemcontrol>

/// Interrupt controller base address
pub const BASE: u32 = 0x0400_0200;

/// Size of the interrupt controller register window
pub const SIZE: u32 = 0x100;

/// Interrupt controller register offsets (relative to `BASE`)
pub mod registers {
    /// Interrupt enable
    pub const IE: u32 = 0x00;

    /// Interrupt request flags (write 1 to acknowledge)
    pub const IF: u32 = 0x02;

    /// Game pak wait-state control
    pub const WAITCNT: u32 = 0x04;

    /// Interrupt master enable
    pub const IME: u32 = 0x08;
}

/// Bits of WAITCNT that are stored
pub const WAITCNT_MASK: u32 = 0x7fff;
