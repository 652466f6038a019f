//! In-memory backend.
//!
//! Keeps assignments in a `DashMap` keyed by `(user, scope)`; the map's
//! entry API holds the key's shard lock for the duration of a mutation,
//! which serializes read-modify-write cycles per key. Suited to tests and
//! single-process deployments where durability is not required.

use std::collections::BTreeSet;

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::backend::RoleBackend;
use crate::error::RoleError;
use crate::model::{scope_key, GroupName, RoleName, GLOBAL_SCOPE_KEY};

/// Thread-safe in-process role assignment store.
pub struct MemoryBackend {
    assignments: DashMap<(Uuid, String), BTreeSet<RoleName>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create a new empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            assignments: DashMap::new(),
        }
    }

    fn key(user_id: Uuid, group: Option<&GroupName>) -> (Uuid, String) {
        (user_id, scope_key(group).to_owned())
    }
}

#[async_trait]
impl RoleBackend for MemoryBackend {
    async fn roles(
        &self,
        user_id: Uuid,
        group: Option<&GroupName>,
    ) -> Result<BTreeSet<RoleName>, RoleError> {
        Ok(self
            .assignments
            .get(&Self::key(user_id, group))
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn add_roles(
        &self,
        user_id: Uuid,
        group: Option<&GroupName>,
        roles: &BTreeSet<RoleName>,
    ) -> Result<(), RoleError> {
        self.assignments
            .entry(Self::key(user_id, group))
            .or_default()
            .extend(roles.iter().cloned());
        Ok(())
    }

    async fn remove_roles(
        &self,
        user_id: Uuid,
        group: Option<&GroupName>,
        roles: &BTreeSet<RoleName>,
    ) -> Result<(), RoleError> {
        if let Some(mut entry) = self.assignments.get_mut(&Self::key(user_id, group)) {
            for role in roles {
                entry.remove(role);
            }
        }
        Ok(())
    }

    async fn replace_roles(
        &self,
        user_id: Uuid,
        group: Option<&GroupName>,
        roles: &BTreeSet<RoleName>,
    ) -> Result<(), RoleError> {
        // The emptied record stays present; emptiness and absence read
        // the same through `roles`.
        self.assignments
            .insert(Self::key(user_id, group), roles.clone());
        Ok(())
    }

    async fn users_in_role(
        &self,
        role: &RoleName,
        group: Option<&GroupName>,
    ) -> Result<Vec<Uuid>, RoleError> {
        let scope = scope_key(group);
        let users: BTreeSet<Uuid> = self
            .assignments
            .iter()
            .filter(|entry| entry.key().1 == scope && entry.value().contains(role))
            .map(|entry| entry.key().0)
            .collect();
        Ok(users.into_iter().collect())
    }

    async fn groups_for_user(
        &self,
        user_id: Uuid,
        role: Option<&RoleName>,
    ) -> Result<Vec<GroupName>, RoleError> {
        let groups: BTreeSet<GroupName> = self
            .assignments
            .iter()
            .filter(|entry| {
                entry.key().0 == user_id
                    && entry.key().1 != GLOBAL_SCOPE_KEY
                    && role.map_or(!entry.value().is_empty(), |r| entry.value().contains(r))
            })
            .map(|entry| GroupName::from_storage(entry.key().1.clone()))
            .collect();
        Ok(groups.into_iter().collect())
    }
}
