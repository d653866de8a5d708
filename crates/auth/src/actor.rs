//! Actor descriptor: the authenticated caller context.

use serde::{Deserialize, Serialize};

use lodge_core::UserId;

/// The authenticated caller attached to a write operation.
///
/// This is the opaque credential the surrounding transport layer carries
/// around after `authenticate`: just the user id and the admin flag. How the
/// credential is transported (JWT, session cookie, ...) is outside this crate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub is_admin: bool,
}

impl Actor {
    pub fn new(id: UserId, is_admin: bool) -> Self {
        Self { id, is_admin }
    }

    /// Whether this actor is the user identified by `id`.
    pub fn is_self(&self, id: UserId) -> bool {
        self.id == id
    }
}
