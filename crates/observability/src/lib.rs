//! Tracing setup and the tracing-backed audit hook.

/// Initialize process-wide tracing.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

pub mod audit;

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use audit::TracingAuditHook;
