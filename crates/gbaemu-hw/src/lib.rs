pub mod irq;
pub mod memory_map;
pub mod mmio;
pub mod specs;
