//! I/O register windows, relative to the start of the I/O region.
//!
//! # References
//! - <https://problemkaputt.de/gbatek.htm#gbaiomap>

pub mod lcd;
pub mod pic;
pub mod stubs;
