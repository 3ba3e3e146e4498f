//! Authenticated actor performing catalog operations.
//!
//! The authentication collaborator resolves credentials; core only consumes
//! the resulting `(user_id, is_admin)` pair and never trusts request bodies
//! for either value.

use serde::{Deserialize, Serialize};

/// Numeric user identity assigned by the authentication collaborator.
pub type UserId = i64;

/// Verified principal attached to every catalog call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// `None` when the session carries no resolvable user.
    pub user_id: Option<UserId>,
    pub is_admin: bool,
}

impl Principal {
    /// Ordinary (non-admin) user.
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            is_admin: false,
        }
    }

    /// Administrator who also owns a private catalog partition.
    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            is_admin: true,
        }
    }

    /// Returns whether this principal may see and modify a material with the
    /// given owner.
    ///
    /// - Non-admin: only `owner_id == user_id`.
    /// - Admin: shared materials plus their own, never other users' private
    ///   materials.
    pub fn can_access(&self, owner_id: Option<UserId>) -> bool {
        self.scope().contains(owner_id)
    }

    /// Ownership partition visible to this principal.
    pub fn scope(&self) -> OwnerScope {
        OwnerScope {
            include_shared: self.is_admin,
            owner: self.user_id,
        }
    }
}

/// Ownership partition a catalog scan is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerScope {
    /// Include materials with no owner.
    pub include_shared: bool,
    /// Include materials owned by this user.
    pub owner: Option<UserId>,
}

impl OwnerScope {
    /// Returns whether a material with `owner_id` falls inside this scope.
    pub fn contains(&self, owner_id: Option<UserId>) -> bool {
        match owner_id {
            None => self.include_shared,
            Some(owner) => self.owner == Some(owner),
        }
    }

    /// Returns whether no material can ever match this scope.
    pub fn is_empty(&self) -> bool {
        !self.include_shared && self.owner.is_none()
    }
}
