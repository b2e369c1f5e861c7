//! Entity trait: identity + continuity across state changes.

/// A stored record with a stable identity.
///
/// Record tables are keyed by `Id`, and `KIND` names the record in
/// not-found and conflict messages ("client", "contract", ...).
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Ord + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Human-readable record kind.
    const KIND: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
