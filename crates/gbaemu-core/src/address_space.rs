//! Flat system address space built from mirrored memory regions.
//!
//! The GBA bus repeats every memory block across a much larger decoded window.
//! Software only ever touches the start of a window and its very end (the IRQ
//! vector at `0x03FF_FFFC` is the classic example), so each region is mapped
//! once at the start of its window plus a single alias covering the tail of
//! the window.
//!
//! # Limitations
//! Accesses in the middle of an oversized window (e.g. `0x0208_0000`, past
//! the first copy of on-board WRAM) are unmapped. Full repeating mirrors are
//! deliberately not modelled.

use std::fmt;
use tracing::{debug, trace};

/// Handle to a backing store owned by an [`AddressSpace`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(usize);

/// Whether bus writes reach the backing store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadWrite,
    /// Bus writes are dropped without faulting (BIOS, cartridge ROM)
    ReadOnly,
}

/// A zero-initialised backing store
#[derive(Debug)]
pub struct Region {
    name: String,
    data: Box<[u8]>,
    access: Access,
}

impl Region {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// One placement of a region in the address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub region: RegionId,
    pub start: u32,
    pub len: u32,
    /// `true` for the end-of-window mirror
    pub alias: bool,
}

impl Mapping {
    /// Exclusive end address (may be `1 << 32`)
    pub fn end(&self) -> u64 {
        self.start as u64 + self.len as u64
    }

    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.start && (addr as u64) < self.end()
    }
}

/// Returned by [`AddressSpace::load_image`] when an image does not fit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTooLarge {
    pub region: String,
    pub len: usize,
    pub capacity: usize,
}

impl fmt::Display for ImageTooLarge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "image of {} bytes does not fit in {} ({} bytes)",
            self.len, self.region, self.capacity
        )
    }
}

impl std::error::Error for ImageTooLarge {}

#[derive(Debug, Default)]
pub struct AddressSpace {
    regions: Vec<Region>,
    mappings: Vec<Mapping>,
}

impl AddressSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a `size` byte region and map it into the window `[start, end)`.
    ///
    /// The region is placed at `start`. If the window is larger than the
    /// region, one alias of the same backing store is placed at `end - skip`.
    pub fn create_mirrored_region(
        &mut self,
        name: &str,
        start: u32,
        end: u32,
        size: usize,
        skip: u32,
        access: Access,
    ) -> RegionId {
        debug_assert!(skip > 0, "{name}: mirror stride must be non-zero");
        debug_assert!(
            size as u64 <= end as u64 - start as u64,
            "{name}: region larger than its window"
        );

        let id = RegionId(self.regions.len());
        self.regions.push(Region {
            name: name.to_string(),
            data: vec![0u8; size].into_boxed_slice(),
            access,
        });

        debug!(
            "  Mapping {} at {:#010X} ({:#X} bytes, {:?})",
            name, start, size, access
        );
        self.insert_mapping(Mapping {
            region: id,
            start,
            len: size as u32,
            alias: false,
        });

        if end as u64 > start as u64 + size as u64 {
            let alias_start = end - skip;
            debug!(
                "  Mirroring {} at {:#010X} - {:#010X}",
                name,
                alias_start,
                alias_start as u64 + size as u64
            );
            self.insert_mapping(Mapping {
                region: id,
                start: alias_start,
                len: size as u32,
                alias: true,
            });
        }

        id
    }

    fn insert_mapping(&mut self, mapping: Mapping) {
        debug_assert!(
            self.mappings
                .iter()
                .all(|m| mapping.end() <= m.start as u64 || m.end() <= mapping.start as u64),
            "mapping at {:#X} overlaps an existing mapping",
            mapping.start
        );
        let pos = self.mappings.partition_point(|m| m.start < mapping.start);
        self.mappings.insert(pos, mapping);
    }

    /// All mappings, ordered by start address
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn mapping_at(&self, addr: u32) -> Option<&Mapping> {
        let pos = self.mappings.partition_point(|m| m.start <= addr);
        pos.checked_sub(1)
            .map(|i| &self.mappings[i])
            .filter(|m| m.contains(addr))
    }

    pub fn region(&self, id: RegionId) -> &Region {
        &self.regions[id.0]
    }

    pub fn region_by_name(&self, name: &str) -> Option<RegionId> {
        self.regions
            .iter()
            .position(|r| r.name == name)
            .map(RegionId)
    }

    /// Mutable view of a backing store, bypassing the access mode.
    ///
    /// The slice never moves for the lifetime of the address space, so its
    /// pointer may be handed to a CPU collaborator that maps memory directly.
    pub fn backing_mut(&mut self, id: RegionId) -> &mut [u8] {
        &mut self.regions[id.0].data
    }

    /// Copy an image into a region, ignoring its access mode
    pub fn load_image(
        &mut self,
        id: RegionId,
        offset: usize,
        image: &[u8],
    ) -> Result<(), ImageTooLarge> {
        let region = &mut self.regions[id.0];
        if offset + image.len() > region.data.len() {
            return Err(ImageTooLarge {
                region: region.name.clone(),
                len: image.len(),
                capacity: region.data.len().saturating_sub(offset),
            });
        }
        region.data[offset..offset + image.len()].copy_from_slice(image);
        debug!(
            "Loaded {:#X} bytes into {} at offset {:#X}",
            image.len(),
            region.name,
            offset
        );
        Ok(())
    }

    pub fn read_u8(&self, addr: u32) -> Option<u8> {
        let mapping = self.mapping_at(addr)?;
        let offset = (addr - mapping.start) as usize;
        Some(self.regions[mapping.region.0].data[offset])
    }

    /// Little-endian read of `size` bytes; `None` if any byte is unmapped
    pub fn read(&self, addr: u32, size: usize) -> Option<u32> {
        let mut value = 0u32;
        for i in 0..size.min(4) {
            let byte = self.read_u8(addr.wrapping_add(i as u32))?;
            value |= (byte as u32) << (i * 8);
        }
        Some(value)
    }

    /// Little-endian write of `size` bytes.
    ///
    /// Returns `false` if any byte of the access is unmapped, in which case
    /// nothing is written. Writes to read-only regions are dropped but still
    /// count as mapped.
    pub fn write(&mut self, addr: u32, size: usize, value: u32) -> bool {
        let size = size.min(4);
        let mut targets = [(0usize, 0usize); 4];
        for (i, target) in targets.iter_mut().enumerate().take(size) {
            let byte_addr = addr.wrapping_add(i as u32);
            let Some(mapping) = self.mapping_at(byte_addr) else {
                return false;
            };
            *target = (mapping.region.0, (byte_addr - mapping.start) as usize);
        }

        if let Some(&(region, _)) = targets[..size]
            .iter()
            .find(|(region, _)| self.regions[*region].access == Access::ReadOnly)
        {
            trace!(
                "Dropped write to read-only {}: addr={:#010X}, value={:#X}",
                self.regions[region].name, addr, value
            );
            return true;
        }

        for (i, &(region, offset)) in targets[..size].iter().enumerate() {
            self.regions[region].data[offset] = (value >> (i * 8)) as u8;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(start: u32, end: u32, size: usize, skip: u32) -> (AddressSpace, RegionId) {
        let mut space = AddressSpace::new();
        let id = space.create_mirrored_region("ram", start, end, size, skip, Access::ReadWrite);
        (space, id)
    }

    #[test]
    fn alias_is_placed_at_end_minus_skip() {
        let (space, id) = single(0x0300_0000, 0x0400_0000, 0x8000, 0x8000);

        assert_eq!(
            space.mappings(),
            &[
                Mapping {
                    region: id,
                    start: 0x0300_0000,
                    len: 0x8000,
                    alias: false
                },
                Mapping {
                    region: id,
                    start: 0x03FF_8000,
                    len: 0x8000,
                    alias: true
                },
            ]
        );
    }

    #[test]
    fn alias_shares_backing_store() {
        let (mut space, _) = single(0x0300_0000, 0x0400_0000, 0x8000, 0x8000);

        assert!(space.write(0x03FF_FFFC, 4, 0xDEAD_BEEF));
        assert_eq!(space.read(0x0300_7FFC, 4), Some(0xDEAD_BEEF));

        assert!(space.write(0x0300_0010, 2, 0x1234));
        assert_eq!(space.read(0x03FF_8010, 2), Some(0x1234));
    }

    #[test]
    fn alias_with_stride_larger_than_region() {
        // VRAM: 96 KB decoded on a 128 KB stride
        let (mut space, _) = single(0x0600_0000, 0x0700_0000, 0x1_8000, 0x2_0000);

        let alias = space.mappings()[1];
        assert_eq!(alias.start, 0x06FE_0000);
        assert_eq!(alias.end(), 0x06FF_8000);

        assert!(space.write(0x0600_0100, 1, 0xAB));
        assert_eq!(space.read(0x06FE_0100, 1), Some(0xAB));
        assert_eq!(space.read(0x06FF_8000, 1), None);
    }

    #[test]
    fn exact_window_has_no_alias() {
        let (space, _) = single(0x0000_0000, 0x0000_4000, 0x4000, 0x4000);

        assert_eq!(space.mappings().len(), 1);
        assert_eq!(space.read(0x0000_3FFF, 1), Some(0));
        assert_eq!(space.read(0x0000_4000, 1), None);
    }

    #[test]
    fn middle_of_window_is_unmapped() {
        let (space, _) = single(0x0200_0000, 0x0300_0000, 0x4_0000, 0x4_0000);

        assert!(space.mapping_at(0x0204_0000).is_none());
        assert!(space.mapping_at(0x0280_0000).is_none());
        assert!(space.mapping_at(0x02FC_0000).is_some());
    }

    #[test]
    fn read_only_region_drops_writes() {
        let mut space = AddressSpace::new();
        let bios = space.create_mirrored_region(
            "bios",
            0x0000_0000,
            0x0000_4000,
            0x4000,
            0x4000,
            Access::ReadOnly,
        );
        space.load_image(bios, 0, &[0x12, 0x34]).unwrap();

        assert!(space.write(0x0000_0000, 2, 0xFFFF));
        assert_eq!(space.read(0x0000_0000, 2), Some(0x3412));
    }

    #[test]
    fn unmapped_write_is_reported() {
        let (mut space, _) = single(0x0300_0000, 0x0400_0000, 0x8000, 0x8000);
        assert!(!space.write(0x0100_0000, 4, 1));
    }

    #[test]
    fn write_straddling_mapping_end_changes_nothing() {
        let (mut space, _) = single(0x0300_0000, 0x0400_0000, 0x8000, 0x8000);
        assert!(space.write(0x0300_7FFC, 4, 0x1122_3344));

        assert!(!space.write(0x0300_7FFE, 4, 0xAABB_CCDD));
        assert_eq!(space.read(0x0300_7FFC, 4), Some(0x1122_3344));
    }

    #[test]
    fn load_image_rejects_oversized_image() {
        let (mut space, id) = single(0x0E00_0000, 0x1000_0000, 0x10, 0x10);
        let err = space.load_image(id, 0, &[0u8; 0x11]).unwrap_err();
        assert_eq!(err.capacity, 0x10);
        assert_eq!(err.len, 0x11);
    }

    #[test]
    fn region_lookup_by_name() {
        let mut space = AddressSpace::new();
        space.create_mirrored_region("a", 0x0, 0x100, 0x100, 0x100, Access::ReadWrite);
        let b = space.create_mirrored_region("b", 0x100, 0x400, 0x100, 0x100, Access::ReadWrite);

        assert_eq!(space.region_by_name("b"), Some(b));
        assert_eq!(space.region(b).len(), 0x100);
        assert_eq!(space.region_by_name("c"), None);
    }
}
