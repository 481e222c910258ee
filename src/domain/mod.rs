//! Domain layer - pure business logic with no external dependencies.
//!
//! This layer contains the core concepts and invariants of the crate:
//! - Gate state machines (throttle windows, debounce generations)
//! - The notification value type and its expiry rules
//!
//! All types in this layer are pure and easily testable.

pub mod gate;
pub mod notification;
