//! # References
//! - <https://problemkaputt.de/gbatek.htm#gbamemorymap>
//!
//! Each region is described by the decoded window `[BASE, END)`, the size of
//! the physical backing store, and the stride used to place the mirror at the
//! end of the window (`END - SKIP`).

/// BIOS ROM (system boot program)
pub mod bios {
    pub const NAME: &str = "gba.bios";
    pub const BASE: u32 = 0x0000_0000;
    pub const END: u32 = 0x0000_4000;
    /// BIOS size (16 KB)
    pub const SIZE: usize = 0x4000;
    pub const SKIP: u32 = 0x4000;
}

/// On-board work RAM (external to the CPU, 16-bit bus)
pub mod ext_wram {
    pub const NAME: &str = "gba.ext_wram";
    pub const BASE: u32 = 0x0200_0000;
    pub const END: u32 = 0x0300_0000;
    /// On-board WRAM size (256 KB)
    pub const SIZE: usize = 0x4_0000;
    pub const SKIP: u32 = 0x4_0000;
}

/// On-chip work RAM
///
/// The end-of-window mirror is what makes the BIOS IRQ vector at
/// `0x03FF_FFFC` land in this region.
pub mod int_wram {
    pub const NAME: &str = "gba.int_wram";
    pub const BASE: u32 = 0x0300_0000;
    pub const END: u32 = 0x0400_0000;
    /// On-chip WRAM size (32 KB)
    pub const SIZE: usize = 0x8000;
    pub const SKIP: u32 = 0x8000;
}

/// BG/OBJ palette RAM
pub mod palette_ram {
    pub const NAME: &str = "gba.bg/obj_palette_ram";
    pub const BASE: u32 = 0x0500_0000;
    pub const END: u32 = 0x0600_0000;
    /// Palette RAM size (1 KB)
    pub const SIZE: usize = 0x400;
    pub const SKIP: u32 = 0x400;
}

/// Video RAM
///
/// VRAM is 96 KB but decodes on a 128 KB stride.
pub mod vram {
    pub const NAME: &str = "gba.vram";
    pub const BASE: u32 = 0x0600_0000;
    pub const END: u32 = 0x0700_0000;
    /// VRAM size (96 KB)
    pub const SIZE: usize = 0x1_8000;
    pub const SKIP: u32 = 0x2_0000;
}

/// Object attribute memory
pub mod oam {
    pub const NAME: &str = "gba.oam";
    pub const BASE: u32 = 0x0700_0000;
    pub const END: u32 = 0x0800_0000;
    /// OAM size (1 KB)
    pub const SIZE: usize = 0x400;
    pub const SKIP: u32 = 0x400;
}

/// Game pak ROM
///
/// The three wait-state windows (0x08, 0x0A, 0x0C) all show the same ROM.
pub mod cart {
    pub const NAME: &str = "gba.cart";
    pub const BASE: u32 = 0x0800_0000;
    pub const END: u32 = 0x0E00_0000;
    /// Maximum cartridge ROM size (32 MB)
    pub const SIZE: usize = 0x200_0000;
    pub const SKIP: u32 = 0x200_0000;
}

/// Game pak save RAM
pub mod sram {
    pub const NAME: &str = "gba.sram";
    pub const BASE: u32 = 0x0E00_0000;
    pub const END: u32 = 0x1000_0000;
    /// SRAM size (64 KB)
    pub const SIZE: usize = 0x1_0000;
    pub const SKIP: u32 = 0x1_0000;
}

/// I/O register window
pub mod io {
    /// Start of the I/O window
    pub const BASE: u32 = 0x0400_0000;
    /// End of the decoded I/O window (exclusive)
    pub const END: u32 = 0x0500_0000;
}
