//! Mock implementations for testing.
//!
//! This module provides test doubles for infrastructure adapters,
//! enabling controlled, deterministic testing of time-driven behavior.

pub mod clock;
pub mod scheduler;
pub mod surface;

pub use clock::MockClock;
pub use scheduler::MockScheduler;
pub use surface::{MockSurface, SurfaceEvent};
