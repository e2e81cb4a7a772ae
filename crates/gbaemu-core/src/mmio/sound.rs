//! Sound controller register file.
//!
//! No audio is generated. The registers behave as plain storage so that
//! drivers reading back what they wrote see consistent values.

use super::Peripheral;
use gbaemu_hw::mmio::stubs::sound::SIZE;
use tracing::{trace, warn};

#[derive(Debug)]
pub struct SoundLatch {
    io_state: [u8; SIZE as usize],
}

impl SoundLatch {
    #[expect(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            io_state: [0; SIZE as usize],
        }
    }

    fn in_range(&self, offset: u32, size: usize) -> bool {
        offset as usize + size <= self.io_state.len()
    }
}

impl Peripheral for SoundLatch {
    fn name(&self) -> &str {
        "sound"
    }

    fn read(&mut self, offset: u32, size: usize) -> u32 {
        if !self.in_range(offset, size) {
            warn!("Sound register read out of range: offset={:#X}, size={}", offset, size);
            return 0;
        }
        let start = offset as usize;
        let value = self.io_state[start..start + size]
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | b as u32);
        trace!("Sound register read: offset={:#X}, value={:#X}", offset, value);
        value
    }

    fn write(&mut self, offset: u32, size: usize, value: u32) {
        if !self.in_range(offset, size) {
            warn!(
                "Sound register write out of range: offset={:#X}, value={:#X}",
                offset, value
            );
            return;
        }
        trace!("Sound register write: offset={:#X}, value={:#X}", offset, value);
        let start = offset as usize;
        for (i, byte) in self.io_state[start..start + size].iter_mut().enumerate() {
            *byte = (value >> (i * 8)) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_little_endian_bytes() {
        let mut sound = SoundLatch::new();
        sound.write(0x20, 4, 0x1122_3344);

        assert_eq!(sound.read(0x20, 1), 0x44);
        assert_eq!(sound.read(0x22, 2), 0x1122);
        assert_eq!(sound.read(0x20, 4), 0x1122_3344);
    }

    #[test]
    fn out_of_range_access_is_dropped() {
        let mut sound = SoundLatch::new();
        sound.write(0x4E, 4, 0xFFFF_FFFF);
        assert_eq!(sound.read(0x4E, 2), 0);
        assert_eq!(sound.read(0x4E, 4), 0);
    }
}
