//! Pure entity types shared across the workspace (no I/O).

pub mod endpoint;

pub use endpoint::DeviceEndpoint;
