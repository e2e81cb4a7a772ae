//! Unicorn MMIO callbacks.
//!
//! These are thin adapters: all register semantics live in
//! [`gbaemu_core::IoBus`] and the address space. Unicorn hands callbacks an
//! offset relative to the mapped window, so each adapter rebuilds the absolute
//! bus address before forwarding.

use gbaemu_core::System;
use gbaemu_hw::memory_map::io;
use tracing::instrument;
use unicorn_engine::Unicorn;

/// I/O region read handler
#[instrument(level = "trace", skip(uc))]
pub fn read_handler(uc: &mut Unicorn<'_, System>, addr: u64, size: usize) -> u64 {
    uc.get_data_mut().io.read(io::BASE + addr as u32, size) as u64
}

/// I/O region write handler
#[instrument(level = "trace", skip(uc))]
pub fn write_handler(uc: &mut Unicorn<'_, System>, addr: u64, size: usize, value: u64) {
    uc.get_data_mut()
        .io
        .write(io::BASE + addr as u32, size, value as u32);
}

/// Read from a sub-page memory region through the address space
pub fn memory_read(uc: &mut Unicorn<'_, System>, addr: u32, size: usize) -> u64 {
    uc.get_data_mut().read(addr, size) as u64
}

/// Write to a sub-page memory region through the address space
pub fn memory_write(uc: &mut Unicorn<'_, System>, addr: u32, size: usize, value: u64) {
    uc.get_data_mut().write(addr, size, value as u32);
}

