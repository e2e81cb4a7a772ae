pub mod address_space;
pub mod clock;
pub mod framebuffer;
pub mod irq;
pub mod mmio;
pub mod system;

// Re-export commonly used types
pub use address_space::{Access, AddressSpace, ImageTooLarge, Mapping, RegionId};
pub use clock::{TimerId, VirtualClock};
pub use framebuffer::{DisplaySink, Framebuffer};
pub use irq::{IrqLine, IrqSink};
pub use mmio::{DeviceId, IoBus, Peripheral, PeripheralDescriptor};
pub use system::{System, SystemConfig, SystemError, build_system};
