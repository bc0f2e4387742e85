//! Ports (Interfaces)
//!
//! Abstract interfaces that define how the domain layer interacts with
//! external systems (the REST prompt service, generation providers, the
//! trace sink).
//!
//! Implementations of these traits live in adapter crates.

pub mod repositories;
pub mod services;

// Re-exports
pub use repositories::*;
pub use services::*;
