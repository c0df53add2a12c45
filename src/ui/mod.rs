//! Terminal output surface.
//!
//! - **term**: the character-stream writer with typed capabilities and the
//!   raw-mode screen lifecycle

pub mod term;

pub use term::{Capability, Screen, Term};
