//! Adapter-layer conveniences.
//!
//! The entry point UI bindings consume: a single role check that accepts
//! `"admin,editor"` shorthand for a list of roles and never raises. All
//! comma-splitting and trimming happens here; the store itself only
//! accepts validated [`RoleName`] lists.

use uuid::Uuid;

use crate::error::RoleError;
use crate::model::{GroupName, RoleName};
use crate::store::RoleStore;

/// Parse a role spec: a single role name or a comma-separated list.
///
/// Segments are trimmed and empty segments dropped, so `"admin, editor,"`
/// yields two names. Fails with [`RoleError::InvalidArgument`] only when
/// no valid name remains.
pub fn parse_role_spec(spec: &str) -> Result<Vec<RoleName>, RoleError> {
    let roles: Vec<RoleName> = spec
        .split(',')
        .filter_map(|segment| RoleName::new(segment.trim()).ok())
        .collect();

    if roles.is_empty() {
        return Err(RoleError::InvalidArgument(format!(
            "role spec {spec:?} contains no role names"
        )));
    }
    Ok(roles)
}

/// Check whether `user` holds at least one of the roles named in `spec`.
///
/// Convenience wrapper for UI/template bindings: a missing
/// (unauthenticated) user, an unparseable spec, an invalid group name,
/// and a store failure all answer `false` rather than raising. Store
/// failures are logged before being mapped to a deny.
pub async fn is_in_role(
    store: &RoleStore,
    user: Option<Uuid>,
    spec: &str,
    group: Option<&str>,
) -> bool {
    let Some(user_id) = user else {
        return false;
    };
    let Ok(roles) = parse_role_spec(spec) else {
        return false;
    };
    let group = match group.map(GroupName::new) {
        None => None,
        Some(Ok(group)) => Some(group),
        Some(Err(_)) => return false,
    };

    match store
        .user_is_in_role(user_id, &roles, group.as_ref())
        .await
    {
        Ok(held) => held,
        Err(err) => {
            tracing::warn!(error = %err, "role check failed, denying access");
            false
        }
    }
}
