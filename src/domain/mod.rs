// Domain layer: catalog and chat models plus the ports adapters implement.

pub mod model;
pub mod ports;
