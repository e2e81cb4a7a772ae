//! Memory setup for the CPU.
//!
//! The address space built by [`gbaemu_core::build_system`] is the single
//! source of truth. Every page-aligned mapping is handed to Unicorn as a
//! direct pointer into its backing store, so CPU accesses and
//! [`System::read`]/[`System::write`] observe the same bytes. Mappings smaller
//! than a page (palette RAM and OAM) are routed through MMIO callbacks that
//! forward to the address space instead.
//!
//! Read-only regions are mapped without write permission. Stores to them
//! fault the CPU and are dropped by the scheduler.

use crate::mmio;
use gbaemu_core::{Access, System};
use gbaemu_hw::memory_map::io;
use tracing::debug;
use unicorn_engine::{Unicorn, unicorn_const::Prot};

/// Unicorn's mapping granularity
pub const PAGE_SIZE: u32 = 0x1000;

fn is_page_aligned(start: u32, len: u32) -> bool {
    start % PAGE_SIZE == 0 && len % PAGE_SIZE == 0
}

/// Map every region of the system's address space plus the I/O window
pub fn map_system(emu: &mut Unicorn<'static, System>) -> Result<(), String> {
    let mappings = emu.get_data().memory.mappings().to_vec();

    for mapping in mappings {
        let (name, access) = {
            let region = emu.get_data().memory.region(mapping.region);
            (region.name().to_string(), region.access())
        };

        if is_page_aligned(mapping.start, mapping.len) {
            let prot = match access {
                Access::ReadWrite => Prot::ALL,
                Access::ReadOnly => Prot::READ | Prot::EXEC,
            };
            debug!(
                "  Mapping {}{} at {:#010X} ({:#X} bytes)",
                name,
                if mapping.alias { " mirror" } else { "" },
                mapping.start,
                mapping.len
            );
            let backing = emu
                .get_data_mut()
                .memory
                .backing_mut(mapping.region)
                .as_mut_ptr();
            // SAFETY: region backing stores are boxed slices owned by the
            // System stored inside this Unicorn instance. They are never
            // resized and outlive the mapping.
            unsafe {
                emu.mem_map_ptr(
                    mapping.start as u64,
                    mapping.len as u64,
                    prot,
                    backing as _,
                )
            }
            .map_err(|e| format!("Failed to map {} at {:#X}: {:?}", name, mapping.start, e))?;
        } else {
            let window = mapping.start & !(PAGE_SIZE - 1);
            debug!(
                "  Mapping {}{} at {:#010X} ({:#X} bytes) via MMIO page {:#010X}",
                name,
                if mapping.alias { " mirror" } else { "" },
                mapping.start,
                mapping.len,
                window
            );
            emu.mmio_map(
                window as u64,
                PAGE_SIZE as u64,
                Some(move |uc: &mut _, offset, size| {
                    mmio::memory_read(uc, window + offset as u32, size)
                }),
                Some(move |uc: &mut _, offset, size, value| {
                    mmio::memory_write(uc, window + offset as u32, size, value)
                }),
            )
            .map_err(|e| format!("Failed to map {} page {:#X}: {:?}", name, window, e))?;
        }
    }

    debug!("  Mapping I/O region {:#010X} - {:#010X}", io::BASE, io::END);
    emu.mmio_map(
        io::BASE as u64,
        (io::END - io::BASE) as u64,
        Some(mmio::read_handler),
        Some(mmio::write_handler),
    )
    .map_err(|e| format!("Failed to map I/O region: {:?}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbaemu_core::{SystemConfig, build_system};
    use gbaemu_hw::memory_map::{oam, palette_ram};

    #[test]
    fn only_palette_and_oam_need_mmio_pages() {
        let system = build_system(&SystemConfig::default()).unwrap();
        let unaligned: Vec<&str> = system
            .memory
            .mappings()
            .iter()
            .filter(|m| !is_page_aligned(m.start, m.len))
            .map(|m| system.memory.region(m.region).name())
            .collect();

        assert_eq!(
            unaligned,
            vec![palette_ram::NAME, palette_ram::NAME, oam::NAME, oam::NAME]
        );
    }

    #[test]
    fn mmio_pages_do_not_collide() {
        let system = build_system(&SystemConfig::default()).unwrap();
        let mut pages: Vec<u32> = system
            .memory
            .mappings()
            .iter()
            .filter(|m| !is_page_aligned(m.start, m.len))
            .map(|m| m.start & !(PAGE_SIZE - 1))
            .collect();
        let count = pages.len();
        pages.dedup();
        assert_eq!(pages.len(), count);

        for page in pages {
            for m in system.memory.mappings() {
                if is_page_aligned(m.start, m.len) {
                    assert!(
                        m.end() <= page as u64 || page as u64 + PAGE_SIZE as u64 <= m.start as u64
                    );
                }
            }
        }
    }
}
