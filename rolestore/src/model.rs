//! Core data model for role membership.
//!
//! Role and group names are validated at construction, so the store and
//! its backends only ever see well-formed values. The "no group" scope is
//! expressed as `Option::None` in APIs and is therefore distinct from
//! every named group by construction.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RoleError;

/// Storage key under which ungrouped roles are kept.
///
/// Reserved: [`GroupName`] rejects it, so a named group can never collide
/// with the ungrouped scope.
pub(crate) const GLOBAL_SCOPE_KEY: &str = "__global_roles__";

/// Storage key for a scope: the group's name, or the reserved global key.
pub(crate) fn scope_key(group: Option<&GroupName>) -> &str {
    group.map_or(GLOBAL_SCOPE_KEY, GroupName::as_str)
}

// ============================================================================
// RoleName
// ============================================================================

/// A named capability label (e.g. "admin") assigned to a user.
///
/// Never empty or whitespace-only, and carries no leading/trailing
/// whitespace. Any splitting or trimming of user-supplied role specs
/// happens in the adapter layer ([`crate::helpers`]) before a `RoleName`
/// is constructed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleName(String);

impl RoleName {
    /// Validate and wrap a role name.
    pub fn new(name: impl Into<String>) -> Result<Self, RoleError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RoleError::InvalidArgument(
                "role name must not be empty".into(),
            ));
        }
        if name.trim().len() != name.len() {
            return Err(RoleError::InvalidArgument(format!(
                "role name {name:?} has leading or trailing whitespace"
            )));
        }
        Ok(Self(name))
    }

    /// Wrap a name read back from storage, which was validated on write.
    pub(crate) fn from_storage(name: String) -> Self {
        Self(name)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RoleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoleName {
    type Error = RoleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoleName> for String {
    fn from(name: RoleName) -> Self {
        name.0
    }
}

// ============================================================================
// GroupName
// ============================================================================

/// An optional scoping context; the same user may hold different roles in
/// different groups.
///
/// Never empty or whitespace-only. Names starting with `$` are rejected
/// so group names stay safe to use as storage keys, as is the reserved
/// global scope key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupName(String);

impl GroupName {
    /// Validate and wrap a group name.
    pub fn new(name: impl Into<String>) -> Result<Self, RoleError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RoleError::InvalidArgument(
                "group name must not be empty".into(),
            ));
        }
        if name.starts_with('$') {
            return Err(RoleError::InvalidArgument(format!(
                "group name {name:?} must not start with '$'"
            )));
        }
        if name == GLOBAL_SCOPE_KEY {
            return Err(RoleError::InvalidArgument(format!(
                "group name {GLOBAL_SCOPE_KEY:?} is reserved"
            )));
        }
        Ok(Self(name))
    }

    /// Wrap a name read back from storage, which was validated on write.
    pub(crate) fn from_storage(name: String) -> Self {
        Self(name)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for GroupName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GroupName {
    type Error = RoleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GroupName> for String {
    fn from(name: GroupName) -> Self {
        name.0
    }
}

// ============================================================================
// RoleAssignment
// ============================================================================

/// The role set a user holds in one scope.
///
/// At most one assignment exists per `(user, scope)` pair. An empty role
/// set and an absent record are observationally identical: both mean
/// "no roles", never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub user_id: Uuid,
    /// `None` for the ungrouped scope.
    pub group: Option<GroupName>,
    pub roles: BTreeSet<RoleName>,
}

impl RoleAssignment {
    /// Whether this assignment includes the given role.
    #[must_use]
    pub fn holds(&self, role: &RoleName) -> bool {
        self.roles.contains(role)
    }

    /// Whether this assignment includes at least one of the given roles.
    ///
    /// Supports membership checks against a pre-fetched record without
    /// another store round-trip. Empty input answers `false`.
    pub fn holds_any<'a>(&self, roles: impl IntoIterator<Item = &'a RoleName>) -> bool {
        roles.into_iter().any(|role| self.roles.contains(role))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
