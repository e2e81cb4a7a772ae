//! GBA Screen Rendering Module
//!
//! This module presents the emulator framebuffer using winit for window
//! management and softbuffer for software rendering. A redraw is requested
//! whenever the display controller completes a frame.

use crate::core::EmulatorCore;
use crate::scheduler::QuantumResult;
use gbaemu_core::Framebuffer;
use gbaemu_hw::specs::display::{HEIGHT, WIDTH};
use softbuffer::{Context, Surface};
use std::num::NonZeroU32;
use std::rc::Rc;
use tracing::{info, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::Window;

// ================================================================================================
// Window Layout Constants
// ================================================================================================

/// Integer scale factor applied to the 240x160 screen
const SCALE: u32 = 3;

/// Total window width
const WINDOW_WIDTH: u32 = WIDTH * SCALE;

/// Total window height
const WINDOW_HEIGHT: u32 = HEIGHT * SCALE;

/// Emulator display application
pub struct EmulatorDisplay {
    emulator: EmulatorCore,

    // Display state
    window: Option<Rc<Window>>,
    surface: Option<Surface<Rc<Window>, Rc<Window>>>,
}

impl EmulatorDisplay {
    pub fn new(emulator: EmulatorCore) -> Self {
        Self {
            emulator,
            window: None,
            surface: None,
        }
    }
}

impl ApplicationHandler for EmulatorDisplay {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window = Rc::new(
            event_loop
                .create_window(
                    Window::default_attributes()
                        .with_title("gbaemu")
                        .with_inner_size(winit::dpi::PhysicalSize::new(
                            WINDOW_WIDTH,
                            WINDOW_HEIGHT,
                        )),
                )
                .expect("failed to create window"),
        );

        let context = Context::new(window.clone()).expect("failed to create softbuffer context");
        let mut surface =
            Surface::new(&context, window.clone()).expect("failed to create softbuffer surface");
        if let (Some(width), Some(height)) =
            (NonZeroU32::new(WINDOW_WIDTH), NonZeroU32::new(WINDOW_HEIGHT))
        {
            surface
                .resize(width, height)
                .expect("failed to resize surface");
        }

        self.window = Some(window.clone());
        self.surface = Some(surface);

        // Kick off the first frame
        window.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("=== Emulation Stopped ===");
                self.emulator.print_final_state();
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                if let Some(surface) = self.surface.as_mut() {
                    Self::render(surface, self.emulator.framebuffer());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Run a quantum
        let result = self.emulator.step();

        // Check stop conditions
        let should_stop = matches!(result, QuantumResult::Error(_)) || self.emulator.should_stop();

        if should_stop {
            info!("=== Stop Condition Reached ===");
            self.emulator.print_final_state();
            event_loop.exit();
            return;
        }

        if self.emulator.take_frame_ready()
            && let Some(window) = self.window.as_mut()
        {
            window.request_redraw();
        }
        event_loop.set_control_flow(ControlFlow::Poll);
    }
}

impl EmulatorDisplay {
    fn render(surface: &mut Surface<Rc<Window>, Rc<Window>>, framebuffer: &Framebuffer) {
        let Ok(mut buffer) = surface.buffer_mut() else {
            return;
        };
        scale_into(&mut buffer, framebuffer.pixels());
        if let Err(e) = buffer.present() {
            warn!("Failed to present frame: {}", e);
        }
    }
}

/// Nearest-neighbour upscale of a 240x160 0xRRGGBB frame into the window buffer
fn scale_into(buffer: &mut [u32], pixels: &[u32]) {
    for (window_y, row) in buffer
        .chunks_exact_mut(WINDOW_WIDTH as usize)
        .enumerate()
        .take(WINDOW_HEIGHT as usize)
    {
        let src_row = (window_y as u32 / SCALE * WIDTH) as usize;
        for (window_x, pixel) in row.iter_mut().enumerate() {
            let src = src_row + window_x / SCALE as usize;
            *pixel = pixels.get(src).copied().unwrap_or(0);
        }
    }
}

pub fn run(emulator: EmulatorCore) -> Result<(), Box<dyn std::error::Error>> {
    let event_loop = EventLoop::new()?;
    let mut app = EmulatorDisplay::new(emulator);
    event_loop.run_app(&mut app)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaling_replicates_each_pixel() {
        let mut pixels = vec![0u32; (WIDTH * HEIGHT) as usize];
        pixels[0] = 0xFF0000;
        pixels[1] = 0x00FF00;
        pixels[WIDTH as usize] = 0x0000FF;
        let mut buffer = vec![0u32; (WINDOW_WIDTH * WINDOW_HEIGHT) as usize];

        scale_into(&mut buffer, &pixels);

        let at = |x: u32, y: u32| buffer[(y * WINDOW_WIDTH + x) as usize];
        for d in 0..SCALE {
            assert_eq!(at(d, 0), 0xFF0000);
            assert_eq!(at(SCALE + d, SCALE - 1), 0x00FF00);
            assert_eq!(at(d, SCALE + d), 0x0000FF);
        }
        assert_eq!(at(WINDOW_WIDTH - 1, WINDOW_HEIGHT - 1), 0);
    }
}
