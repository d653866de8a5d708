//! Entity trait: identity + continuity across state changes.

use chrono::{DateTime, Utc};

/// Entity marker + minimal interface.
///
/// Every stored record carries a strongly-typed identifier and the shared
/// creation/mutation timestamps. `updated_at` is refreshed on every
/// successful mutation; `id` and `created_at` are immutable after creation.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + Send + Sync;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Timestamp assigned at creation.
    fn created_at(&self) -> DateTime<Utc>;

    /// Timestamp of the most recent successful mutation.
    fn updated_at(&self) -> DateTime<Utc>;
}
