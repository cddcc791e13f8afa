//! Tracing and logging setup shared by the parties binaries and tests.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, TracingConfig};

/// Initialize process-wide tracing with defaults (`info`, JSON).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    crate::tracing::init(&TracingConfig::default());
}
