//! `lodge-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod actor;
pub mod password;
pub mod policy;

pub use actor::Actor;
pub use password::{derive_password, verify_password, PasswordError};
pub use policy::{can_create, can_delete, can_mutate, AuthzError, EntityKind, MutationTarget};
