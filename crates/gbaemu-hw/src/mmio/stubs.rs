//! Register windows for peripherals that are only modelled as stubs.

/// Sound controller (register latch)
pub mod sound {
    pub const BASE: u32 = 0x0400_0060;
    pub const SIZE: u32 = 0x50;
}

/// DMA channels 0-3
pub mod dma {
    pub const BASE: u32 = 0x0400_00B0;
    pub const SIZE: u32 = 0x30;
}

/// Timers 0-3
pub mod timer {
    pub const BASE: u32 = 0x0400_0100;
    pub const SIZE: u32 = 0x10;
}

/// Serial communication
pub mod serial {
    pub const BASE: u32 = 0x0400_0120;
    pub const SIZE: u32 = 0x10;
}

/// Keypad input
pub mod keypad {
    pub const BASE: u32 = 0x0400_0130;
    pub const SIZE: u32 = 0x4;
}

/// Post-boot flag, power-down control
pub mod system {
    pub const BASE: u32 = 0x0400_0300;
    pub const SIZE: u32 = 0x100;
}
