//! Simulation dynamics: integration and the parallel collision dispatcher.

pub mod integrator;
#[cfg(feature = "parallel")]
pub mod parallel;

pub use integrator::Integrator;
#[cfg(feature = "parallel")]
pub use parallel::ParallelDispatcher;
