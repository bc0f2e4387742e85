//! Value Objects
//!
//! Immutable objects defined by their attributes rather than identity.

mod message;
mod modalities;
mod template_type;
mod usage;

pub use message::*;
pub use modalities::*;
pub use template_type::*;
pub use usage::*;
