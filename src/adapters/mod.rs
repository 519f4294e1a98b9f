// Adapters layer: concrete implementations of the domain ports.

pub mod crm;
pub mod http;
pub mod memory;
