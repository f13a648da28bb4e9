//! PostgreSQL implementation of the config repository.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::models::{ConfigPatch, ConfigRecord, NewConfig};
use crate::repository::{ConfigRepository, RepoResult, RepositoryError};

/// Postgres-backed config repository.
pub struct PostgresConfigRepository {
    /// Database connection pool.
    pool: PgPool,
}

impl PostgresConfigRepository {
    /// Create repository with existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Connect to database and create repository.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn run_migrations(&self) -> RepoResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|err| RepositoryError::Database(err.to_string()))
    }
}

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(err.to_string())
}

fn row_to_record(row: &PgRow) -> RepoResult<ConfigRecord> {
    let cdn_ratio: i32 = row.try_get("cdn_ratio").map_err(map_sqlx_err)?;
    let origin_ratio: i32 = row.try_get("origin_ratio").map_err(map_sqlx_err)?;

    Ok(ConfigRecord {
        id: row.try_get("id").map_err(map_sqlx_err)?,
        cdn_host: row.try_get("cdn_host").map_err(map_sqlx_err)?,
        cdn_ratio: u32::try_from(cdn_ratio)
            .map_err(|_| RepositoryError::Corrupt(format!("negative cdn_ratio: {cdn_ratio}")))?,
        origin_ratio: u32::try_from(origin_ratio).map_err(|_| {
            RepositoryError::Corrupt(format!("negative origin_ratio: {origin_ratio}"))
        })?,
        is_active: row.try_get("is_active").map_err(map_sqlx_err)?,
        created_at: row.try_get("created_at").map_err(map_sqlx_err)?,
        updated_at: row.try_get("updated_at").map_err(map_sqlx_err)?,
    })
}

#[async_trait]
impl ConfigRepository for PostgresConfigRepository {
    async fn get_active(&self) -> RepoResult<Option<ConfigRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, cdn_host, cdn_ratio, origin_ratio, is_active, created_at, updated_at
            FROM balancer_configs
            WHERE is_active = TRUE
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn get_by_id(&self, id: i32) -> RepoResult<Option<ConfigRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, cdn_host, cdn_ratio, origin_ratio, is_active, created_at, updated_at
            FROM balancer_configs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn list(&self) -> RepoResult<Vec<ConfigRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, cdn_host, cdn_ratio, origin_ratio, is_active, created_at, updated_at
            FROM balancer_configs
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(row_to_record(row)?);
        }
        Ok(records)
    }

    async fn create(&self, config: NewConfig) -> RepoResult<ConfigRecord> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        sqlx::query("UPDATE balancer_configs SET is_active = FALSE WHERE is_active = TRUE")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;

        let row = sqlx::query(
            r#"
            INSERT INTO balancer_configs (cdn_host, cdn_ratio, origin_ratio, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING id, cdn_host, cdn_ratio, origin_ratio, is_active, created_at, updated_at
            "#,
        )
        .bind(&config.cdn_host)
        .bind(config.cdn_ratio as i32)
        .bind(config.origin_ratio as i32)
        .bind(config.is_active)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        tx.commit().await.map_err(map_sqlx_err)?;

        row_to_record(&row)
    }

    async fn update(&self, id: i32, patch: ConfigPatch) -> RepoResult<Option<ConfigRecord>> {
        let row = sqlx::query(
            r#"
            UPDATE balancer_configs
            SET cdn_host = COALESCE($2, cdn_host),
                cdn_ratio = COALESCE($3, cdn_ratio),
                origin_ratio = COALESCE($4, origin_ratio),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, cdn_host, cdn_ratio, origin_ratio, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.cdn_host.as_deref())
        .bind(patch.cdn_ratio.map(|v| v as i32))
        .bind(patch.origin_ratio.map(|v| v as i32))
        .bind(patch.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn delete(&self, id: i32) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM balancer_configs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn activate(&self, id: i32) -> RepoResult<Option<ConfigRecord>> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        sqlx::query("UPDATE balancer_configs SET is_active = FALSE WHERE is_active = TRUE")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;

        let row = sqlx::query(
            r#"
            UPDATE balancer_configs
            SET is_active = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING id, cdn_host, cdn_ratio, origin_ratio, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        // Unknown id: roll back so the previously active record stays active.
        let Some(row) = row else {
            tx.rollback().await.map_err(map_sqlx_err)?;
            return Ok(None);
        };

        tx.commit().await.map_err(map_sqlx_err)?;

        row_to_record(&row).map(Some)
    }
}
