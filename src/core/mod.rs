//! Core types describing simulated bodies and shared geometry data.

pub mod body;
pub mod types;

pub use body::{Body, BodyId};
pub use types::{Bounds, Rgba};
