//! Authorization policy: stateless decision functions.
//!
//! Decisions are a pure function of (actor, action, target ownership).
//! - No IO
//! - No panics
//! - No business logic (pure policy check)

use thiserror::Error;

use lodge_core::{DomainError, UserId};

use crate::Actor;

/// The entity kinds the policy knows about.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Place,
    Review,
    Amenity,
}

/// Ownership view of an existing record targeted by a mutation or deletion.
///
/// Only the ownership field matters for the decision, so callers pass that
/// instead of the whole record.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MutationTarget {
    /// A user record; owned by the user themselves.
    User { id: UserId },
    /// A place; owned by `owner_id`.
    Place { owner_id: UserId },
    /// A review; owned by its author.
    Review { author_id: UserId },
    /// Amenities have no owner and are admin-managed.
    Amenity,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("admin privileges required")]
    AdminRequired,

    #[error("unauthorized action")]
    NotOwner,
}

impl From<AuthzError> for DomainError {
    fn from(_: AuthzError) -> Self {
        DomainError::Unauthorized
    }
}

/// Decide whether `actor` may create a record of `kind`.
///
/// User creation is open (self-registration needs no credential). Amenities
/// are admin-managed. Everything else requires an authenticated actor.
pub fn can_create(actor: Option<&Actor>, kind: EntityKind) -> Result<(), AuthzError> {
    match kind {
        EntityKind::User => Ok(()),
        EntityKind::Amenity => match actor {
            Some(a) if a.is_admin => Ok(()),
            Some(_) => Err(AuthzError::AdminRequired),
            None => Err(AuthzError::Unauthenticated),
        },
        EntityKind::Place | EntityKind::Review => {
            actor.map(|_| ()).ok_or(AuthzError::Unauthenticated)
        }
    }
}

/// Decide whether `actor` may mutate the record described by `target`.
///
/// Admins may mutate anything. Non-admins may only mutate records they own.
pub fn can_mutate(actor: &Actor, target: MutationTarget) -> Result<(), AuthzError> {
    if actor.is_admin {
        return Ok(());
    }

    match target {
        MutationTarget::User { id } if actor.is_self(id) => Ok(()),
        MutationTarget::Place { owner_id } if actor.is_self(owner_id) => Ok(()),
        MutationTarget::Review { author_id } if actor.is_self(author_id) => Ok(()),
        MutationTarget::Amenity => Err(AuthzError::AdminRequired),
        _ => Err(AuthzError::NotOwner),
    }
}

/// Deletion follows the same ownership rules as mutation.
pub fn can_delete(actor: &Actor, target: MutationTarget) -> Result<(), AuthzError> {
    can_mutate(actor, target)
}
