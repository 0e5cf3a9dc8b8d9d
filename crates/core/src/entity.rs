//! Entity trait: identity + continuity across state changes.

/// A record with a stable identity, keyed by `id()` in stores.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
