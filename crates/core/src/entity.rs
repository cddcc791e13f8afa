//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Persisted records (customers, store infos, suppliers, stores) implement this; the
/// in-memory store looks rows up and patches them by `id()`.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + Ord + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
