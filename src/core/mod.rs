//! Core interactive logic.
//!
//! This module contains the command/animation loop:
//!
//! - **controller**: keyboard dispatch, command execution, full-CV playback
//! - **animation**: the typewriter state machine advanced one char per frame
//!
//! # Architecture
//!
//! ```text
//! Controller
//! ├── Term (output surface + capabilities)
//! ├── SessionState (command buffer, cursor, interrupt, full-CV cursor)
//! └── Typewriter (pending text + position + completion action)
//! ```

pub mod animation;
pub mod controller;

pub use animation::FrameClock;
pub use controller::{Controller, Flow};
