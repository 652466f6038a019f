//! `PostgreSQL` backend.
//!
//! One row per held role, keyed by `(user_id, group_name, role_name)`.
//! Ungrouped roles are stored under the reserved `__global_roles__` scope
//! key. Adds and removes are single statements and replace runs in one
//! transaction, so per-key mutations are atomic and concurrent readers
//! never observe a partially-applied set.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::backend::RoleBackend;
use crate::config::Config;
use crate::error::RoleError;
use crate::model::{scope_key, GroupName, RoleName, GLOBAL_SCOPE_KEY};

/// Durable role assignment store over `PostgreSQL`.
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool with health configuration from `config`.
    #[tracing::instrument(skip(config))]
    pub async fn connect(config: &Config) -> Result<Self, RoleError> {
        let pool = PgPoolOptions::new()
            // Keep minimum connections warm to prevent cold-start latency
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            // Prevent hanging callers on pool exhaustion
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            // Validate connections before use to catch stale/broken connections
            .test_before_acquire(true)
            .connect(&config.database_url)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn run_migrations(&self) -> Result<(), RoleError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(sqlx::Error::from)?;
        info!("Role store migrations completed");
        Ok(())
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn names(roles: &BTreeSet<RoleName>) -> Vec<String> {
        roles.iter().map(|role| role.as_str().to_owned()).collect()
    }
}

#[async_trait]
impl RoleBackend for PgBackend {
    async fn roles(
        &self,
        user_id: Uuid,
        group: Option<&GroupName>,
    ) -> Result<BTreeSet<RoleName>, RoleError> {
        let names: Vec<String> = sqlx::query_scalar(
            r"
            SELECT role_name
            FROM role_assignments
            WHERE user_id = $1
              AND group_name = $2
            ",
        )
        .bind(user_id)
        .bind(scope_key(group))
        .fetch_all(&self.pool)
        .await?;

        Ok(names.into_iter().map(RoleName::from_storage).collect())
    }

    async fn add_roles(
        &self,
        user_id: Uuid,
        group: Option<&GroupName>,
        roles: &BTreeSet<RoleName>,
    ) -> Result<(), RoleError> {
        sqlx::query(
            r"
            INSERT INTO role_assignments (user_id, group_name, role_name)
            SELECT $1, $2, t.role_name
            FROM UNNEST($3::text[]) AS t(role_name)
            ON CONFLICT (user_id, group_name, role_name) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(scope_key(group))
        .bind(Self::names(roles))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove_roles(
        &self,
        user_id: Uuid,
        group: Option<&GroupName>,
        roles: &BTreeSet<RoleName>,
    ) -> Result<(), RoleError> {
        sqlx::query(
            r"
            DELETE FROM role_assignments
            WHERE user_id = $1
              AND group_name = $2
              AND role_name = ANY($3)
            ",
        )
        .bind(user_id)
        .bind(scope_key(group))
        .bind(Self::names(roles))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn replace_roles(
        &self,
        user_id: Uuid,
        group: Option<&GroupName>,
        roles: &BTreeSet<RoleName>,
    ) -> Result<(), RoleError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            DELETE FROM role_assignments
            WHERE user_id = $1
              AND group_name = $2
            ",
        )
        .bind(user_id)
        .bind(scope_key(group))
        .execute(&mut *tx)
        .await?;

        if !roles.is_empty() {
            sqlx::query(
                r"
                INSERT INTO role_assignments (user_id, group_name, role_name)
                SELECT $1, $2, t.role_name
                FROM UNNEST($3::text[]) AS t(role_name)
                ",
            )
            .bind(user_id)
            .bind(scope_key(group))
            .bind(Self::names(roles))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn users_in_role(
        &self,
        role: &RoleName,
        group: Option<&GroupName>,
    ) -> Result<Vec<Uuid>, RoleError> {
        let users: Vec<Uuid> = sqlx::query_scalar(
            r"
            SELECT DISTINCT user_id
            FROM role_assignments
            WHERE role_name = $1
              AND group_name = $2
            ORDER BY user_id ASC
            ",
        )
        .bind(role.as_str())
        .bind(scope_key(group))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn groups_for_user(
        &self,
        user_id: Uuid,
        role: Option<&RoleName>,
    ) -> Result<Vec<GroupName>, RoleError> {
        let groups: Vec<String> = sqlx::query_scalar(
            r"
            SELECT DISTINCT group_name
            FROM role_assignments
            WHERE user_id = $1
              AND group_name <> $2
              AND ($3::text IS NULL OR role_name = $3)
            ORDER BY group_name ASC
            ",
        )
        .bind(user_id)
        .bind(GLOBAL_SCOPE_KEY)
        .bind(role.map(RoleName::as_str))
        .fetch_all(&self.pool)
        .await?;

        Ok(groups.into_iter().map(GroupName::from_storage).collect())
    }
}
