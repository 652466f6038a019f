//! Backing-store contract for role assignments.

use std::collections::BTreeSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RoleError;
use crate::model::{GroupName, RoleName};

/// Storage contract for the `(user, scope) -> set<role>` mapping.
///
/// Implementations must serialize mutations per `(user, scope)` key (no
/// lost updates between a concurrent add and remove) and must give reads
/// a consistent per-key snapshot. When storage is unreachable they fail
/// fast with [`RoleError::StoreUnavailable`] rather than retrying.
#[async_trait]
pub trait RoleBackend: Send + Sync {
    /// Current role set for a `(user, scope)` key. Empty if no assignment
    /// exists; absence is not an error.
    async fn roles(
        &self,
        user_id: Uuid,
        group: Option<&GroupName>,
    ) -> Result<BTreeSet<RoleName>, RoleError>;

    /// Union `roles` into the key's set. Atomic per key; already-held
    /// roles are left untouched.
    async fn add_roles(
        &self,
        user_id: Uuid,
        group: Option<&GroupName>,
        roles: &BTreeSet<RoleName>,
    ) -> Result<(), RoleError>;

    /// Remove `roles` from the key's set. Atomic per key; unheld roles
    /// are a no-op.
    async fn remove_roles(
        &self,
        user_id: Uuid,
        group: Option<&GroupName>,
        roles: &BTreeSet<RoleName>,
    ) -> Result<(), RoleError>;

    /// Replace the key's set with exactly `roles`. Atomic per key: no
    /// concurrent reader observes a partially-applied set.
    async fn replace_roles(
        &self,
        user_id: Uuid,
        group: Option<&GroupName>,
        roles: &BTreeSet<RoleName>,
    ) -> Result<(), RoleError>;

    /// All users holding `role` in the scope, in a stable order.
    async fn users_in_role(
        &self,
        role: &RoleName,
        group: Option<&GroupName>,
    ) -> Result<Vec<Uuid>, RoleError>;

    /// Named groups in which the user holds `role` (or any role when
    /// `None`). The ungrouped scope is never included.
    async fn groups_for_user(
        &self,
        user_id: Uuid,
        role: Option<&RoleName>,
    ) -> Result<Vec<GroupName>, RoleError>;
}
