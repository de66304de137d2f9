//! Utility helpers: the body arena and logging instrumentation.

pub mod allocator;
pub mod logging;

pub use allocator::{Arena, ArenaIndex};
pub use logging::ScopedTimer;
