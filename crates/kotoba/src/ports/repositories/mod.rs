//! Repository Ports
//!
//! Abstract interfaces for prompt persistence operations.

mod prompt_store;

pub use prompt_store::*;
