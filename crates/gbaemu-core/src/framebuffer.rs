//! Display output collaborator.
//!
//! Pixel composition is not emulated; every line emitted by the display
//! controller is cleared to the backdrop colour.

use gbaemu_hw::specs::display::{HEIGHT, WIDTH};
use tracing::trace;

/// Colour shown while the display is force-blanked
pub const FORCED_BLANK_COLOR: u32 = 0xFFFFFF;

/// Receiver of scanline output from the display controller
pub trait DisplaySink {
    /// The drawing phase of visible line `ly` has started
    fn emit_line(&mut self, ly: u32, forced_blank: bool);

    /// The last visible line of a frame has been emitted
    fn end_frame(&mut self);
}

/// 240x160 frame in 0x00RRGGBB
#[derive(Debug)]
pub struct Framebuffer {
    pixels: Vec<u32>,
    backdrop: u32,
    frame_count: u64,
    frame_ready: bool,
}

impl Framebuffer {
    #[expect(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            pixels: vec![0; (WIDTH * HEIGHT) as usize],
            backdrop: 0,
            frame_count: 0,
            frame_ready: false,
        }
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn backdrop(&self) -> u32 {
        self.backdrop
    }

    /// Set the backdrop from a BGR555 palette entry
    pub fn set_backdrop_bgr555(&mut self, color: u16) {
        let expand = |c: u16| -> u32 {
            let c = (c & 0x1f) as u32;
            (c << 3) | (c >> 2)
        };
        let r = expand(color);
        let g = expand(color >> 5);
        let b = expand(color >> 10);
        self.backdrop = (r << 16) | (g << 8) | b;
    }

    /// Number of frames completed so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Returns whether a frame finished since the last call
    pub fn take_frame_ready(&mut self) -> bool {
        std::mem::take(&mut self.frame_ready)
    }
}

impl DisplaySink for Framebuffer {
    fn emit_line(&mut self, ly: u32, forced_blank: bool) {
        if ly >= HEIGHT {
            return;
        }
        let color = if forced_blank {
            FORCED_BLANK_COLOR
        } else {
            self.backdrop
        };
        let start = (ly * WIDTH) as usize;
        self.pixels[start..start + WIDTH as usize].fill(color);
    }

    fn end_frame(&mut self) {
        self.frame_count += 1;
        self.frame_ready = true;
        trace!("Frame {} complete", self.frame_count);
    }
}
