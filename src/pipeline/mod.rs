//! Diff-and-Encode Pipeline.
//!
//! ```text
//! dirty nodes → change store diff → RenderCycle → ChangeSink / Message
//! ```
//!
//! - [`operation`]: CREATE / SET / DESTROY / CALL and the message envelope
//! - [`sink`]: the property-change sink and the message-building writer
//! - [`render`]: prepare, inspect, commit or abort one cycle

pub mod operation;
pub mod render;
pub mod sink;

pub use operation::{Head, Message, Operation};
pub use render::RenderCycle;
pub use sink::{ChangeSink, MessageWriter};
