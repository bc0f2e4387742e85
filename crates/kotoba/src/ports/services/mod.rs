//! Service Ports
//!
//! Abstract interfaces for external services.

mod generation;
mod trace_sink;

pub use generation::*;
pub use trace_sink::*;
