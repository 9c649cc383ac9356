// # IP Directory
//
// The identifier → IP mapping that every propagation starts from.

pub mod memory;

pub use memory::IpRegistry;
