pub mod args;
pub mod core;
pub mod display;
pub mod loader;
pub mod memory;
pub mod mmio;
pub mod scheduler;

// Re-export commonly used types
pub use args::{Args, load_images};
pub use core::{EmulatorConfig, EmulatorCore, StopReason};
pub use loader::{Images, LoadError};
pub use scheduler::{QuantumResult, SchedulerConfig};
