//! Process-wide logging setup for the `epiccrm` binary.

/// Subscriber configuration (filter, format, writer).
pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize process-wide logging.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}
