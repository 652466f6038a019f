//! Error types for the role store.

use thiserror::Error;

/// Errors surfaced by [`RoleStore`](crate::store::RoleStore) operations.
///
/// "Not found" conditions are deliberately absent: an unknown user or a
/// scope with no assignment is valid state ("zero roles"), so queries
/// answer `false`/empty instead of failing.
#[derive(Debug, Error)]
pub enum RoleError {
    /// Malformed caller input: empty role name, invalid group name, or an
    /// empty role/user list where at least one entry is required. Raised
    /// before any mutation is attempted, so failed calls never leave
    /// partial writes behind.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The backing store cannot be reached. Surfaced to the caller as-is;
    /// the store does not retry internally.
    #[error("role store unavailable")]
    StoreUnavailable(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RoleError {
    fn from(err: sqlx::Error) -> Self {
        Self::StoreUnavailable(err)
    }
}
