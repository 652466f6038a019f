//! Group-scoped role membership store.
//!
//! A flat role-based authorization primitive for user-management systems:
//! each user holds a set of role names per scope (a named group, or the
//! ungrouped scope), and an access check asks whether the user holds at
//! least one of the candidate roles in exactly that scope. There is no
//! role hierarchy and no fallback between scopes.
//!
//! The store runs over a pluggable [`store::RoleBackend`]: a durable
//! `PostgreSQL` backend for deployments and an in-memory backend for
//! tests and single-process use.

pub mod config;
pub mod error;
pub mod helpers;
pub mod model;
pub mod store;

pub use config::Config;
pub use error::RoleError;
pub use model::{GroupName, RoleAssignment, RoleName};
pub use store::{MemoryBackend, PgBackend, RoleBackend, RoleStore};
