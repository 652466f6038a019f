//! Role membership store.
//!
//! Owns the mapping from `(user, scope)` to a set of role names and is
//! the only mutation and query surface for it. A scope is either a named
//! group or the ungrouped ("global") scope, passed as `Option<&GroupName>`.
//!
//! Scoping policy: grouped and ungrouped role sets are fully independent.
//! A check against group `g` consults only the `g` assignment; there is
//! no fallback to the ungrouped set, and an ungrouped check never sees
//! grouped roles.

mod backend;
mod memory;
mod postgres;

pub use backend::RoleBackend;
pub use memory::MemoryBackend;
pub use postgres::PgBackend;

use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::RoleError;
use crate::model::{GroupName, RoleAssignment, RoleName};

/// Authoritative store and query surface for role membership.
///
/// Cheap to clone; clones share the same backend. All inputs are
/// validated before any mutation is attempted, so a failed call never
/// leaves a partial write behind.
#[derive(Clone)]
pub struct RoleStore {
    backend: Arc<dyn RoleBackend>,
}

impl RoleStore {
    /// Create a store over the given backend.
    pub fn new(backend: impl RoleBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Create a store over a fresh in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Grant each of `roles` to the user in the given scope.
    ///
    /// Idempotent per role: granting an already-held role is a no-op for
    /// that role. At least one role is required.
    #[tracing::instrument(skip(self, roles))]
    pub async fn add_user_to_roles(
        &self,
        user_id: Uuid,
        roles: &[RoleName],
        group: Option<&GroupName>,
    ) -> Result<(), RoleError> {
        let roles = require_roles(roles)?;
        self.backend.add_roles(user_id, group, &roles).await
    }

    /// Remove each of `roles` from each user's set in the given scope.
    ///
    /// Every user's update is independent; there is no cross-user
    /// transaction. Removing an unheld role is a no-op, not an error.
    #[tracing::instrument(skip(self, user_ids, roles))]
    pub async fn remove_users_from_roles(
        &self,
        user_ids: &[Uuid],
        roles: &[RoleName],
        group: Option<&GroupName>,
    ) -> Result<(), RoleError> {
        if user_ids.is_empty() {
            return Err(RoleError::InvalidArgument(
                "at least one user id is required".into(),
            ));
        }
        let roles = require_roles(roles)?;

        for &user_id in user_ids {
            self.backend.remove_roles(user_id, group, &roles).await?;
        }
        Ok(())
    }

    /// Replace the user's entire role set for the scope with exactly
    /// `roles`.
    ///
    /// The only operation that removes roles not explicitly named. An
    /// empty `roles` clears the assignment.
    #[tracing::instrument(skip(self, roles))]
    pub async fn set_user_roles(
        &self,
        user_id: Uuid,
        roles: &[RoleName],
        group: Option<&GroupName>,
    ) -> Result<(), RoleError> {
        let roles: BTreeSet<RoleName> = roles.iter().cloned().collect();
        self.backend.replace_roles(user_id, group, &roles).await
    }

    /// Whether the user holds at least one of `roles` in exactly the
    /// given scope.
    ///
    /// An unknown user, or a user with no assignment for the scope,
    /// answers `Ok(false)` rather than an error. An empty candidate list
    /// answers `Ok(false)`.
    #[tracing::instrument(skip(self, roles))]
    pub async fn user_is_in_role(
        &self,
        user_id: Uuid,
        roles: &[RoleName],
        group: Option<&GroupName>,
    ) -> Result<bool, RoleError> {
        if roles.is_empty() {
            return Ok(false);
        }
        let held = self.backend.roles(user_id, group).await?;
        Ok(roles.iter().any(|role| held.contains(role)))
    }

    /// The set of role names the user currently holds in the scope.
    /// Empty set, never an error, when there is no assignment.
    #[tracing::instrument(skip(self))]
    pub async fn get_roles_for_user(
        &self,
        user_id: Uuid,
        group: Option<&GroupName>,
    ) -> Result<BTreeSet<RoleName>, RoleError> {
        self.backend.roles(user_id, group).await
    }

    /// All users holding `role` in the scope. Administrative listing;
    /// reflects the same state as the mutation operations.
    #[tracing::instrument(skip(self))]
    pub async fn get_users_in_role(
        &self,
        role: &RoleName,
        group: Option<&GroupName>,
    ) -> Result<Vec<Uuid>, RoleError> {
        self.backend.users_in_role(role, group).await
    }

    /// The named groups in which the user holds `role` (or any role when
    /// `None`). Never includes the ungrouped scope.
    #[tracing::instrument(skip(self))]
    pub async fn get_groups_for_user(
        &self,
        user_id: Uuid,
        role: Option<&RoleName>,
    ) -> Result<Vec<GroupName>, RoleError> {
        self.backend.groups_for_user(user_id, role).await
    }

    /// Fetch the full assignment record for a `(user, scope)` pair.
    ///
    /// The returned [`RoleAssignment`] supports repeated membership
    /// checks ([`RoleAssignment::holds_any`]) without further store
    /// round-trips.
    #[tracing::instrument(skip(self))]
    pub async fn assignment(
        &self,
        user_id: Uuid,
        group: Option<&GroupName>,
    ) -> Result<RoleAssignment, RoleError> {
        let roles = self.backend.roles(user_id, group).await?;
        Ok(RoleAssignment {
            user_id,
            group: group.cloned(),
            roles,
        })
    }
}

/// Collect a non-empty role slice into a set, rejecting empty input.
fn require_roles(roles: &[RoleName]) -> Result<BTreeSet<RoleName>, RoleError> {
    if roles.is_empty() {
        return Err(RoleError::InvalidArgument(
            "at least one role is required".into(),
        ));
    }
    Ok(roles.iter().cloned().collect())
}
