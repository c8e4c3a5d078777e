//! Translation between high-level robot operations and wire frames.
//!
//! Stateless: encoders turn an operation into a [`Command`] (code plus
//! payload), decoders turn a reply [`Frame`](crate::protocol::Frame) into
//! physical units.

pub mod color;
pub mod commands;

pub use color::Rgb;
pub use commands::{Acceleration, Command};
