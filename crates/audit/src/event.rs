use chrono::{DateTime, Utc};

/// A domain-agnostic audit fact.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **versioned** (schema evolution for downstream log shippers)
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "audit.contract.signed").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
