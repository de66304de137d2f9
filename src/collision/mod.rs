//! Collision modules: the uniform grid, the two resolution strategies, and
//! the continuous-mode event types.

pub mod continuous;
pub mod discrete;
pub mod event;
pub mod grid;

pub use continuous::{ContinuousSolver, EventStats};
pub use discrete::{DiscreteSolver, PassStats};
pub use event::{CollisionEvent, EventKind, Side};
pub use grid::{Cell, SpatialGrid};
