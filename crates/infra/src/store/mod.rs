//! Generic keyed storage for one entity kind.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use r#trait::{Mutator, Predicate, Store, StoreError};
