//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain gates and manages runtime behavior:
//! - Debouncer and throttler (callback wrappers around the gates)
//! - Keyed variants (independent gate per key, bounded by LRU eviction)
//! - Notification center (the single visible slot and its expiry timer)
//! - Metrics (shared counters)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod center;
pub mod debouncer;
pub mod keyed;
pub mod metrics;
pub mod ports;
pub mod throttler;

/// Error returned when wrapper configuration validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Debounce wait duration must be greater than zero
    ZeroWait,
    /// Throttle limit duration must be greater than zero
    ZeroLimit,
    /// Keyed gate capacity must be greater than zero
    ZeroMaxKeys,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ZeroWait => {
                write!(f, "debounce wait must be greater than 0")
            }
            ConfigError::ZeroLimit => {
                write!(f, "throttle limit must be greater than 0")
            }
            ConfigError::ZeroMaxKeys => {
                write!(f, "max keys must be greater than 0")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
