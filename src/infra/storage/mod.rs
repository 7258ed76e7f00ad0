pub mod memory;

pub use memory::MemoryNewsStore;
