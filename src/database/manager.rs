use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::filter::FilterError;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Rejected filter: {0}")]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Tables owned by this service. Organizations and user groups are owned by
/// other parts of the CRM and only created here so a fresh database works.
const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS organizations (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS persons (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        job_title TEXT NULL,
        emails JSONB NOT NULL DEFAULT '[]'::jsonb,
        contact_numbers JSONB NOT NULL DEFAULT '[]'::jsonb,
        organization_id BIGINT NULL REFERENCES organizations(id) ON DELETE SET NULL,
        user_id BIGINT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    "CREATE INDEX IF NOT EXISTS persons_user_id_idx ON persons (user_id)",
    "CREATE INDEX IF NOT EXISTS persons_emails_idx ON persons USING GIN (emails jsonb_path_ops)",
    r#"CREATE TABLE IF NOT EXISTS attribute_values (
        entity_type TEXT NOT NULL,
        entity_id BIGINT NOT NULL,
        attribute_code TEXT NOT NULL,
        value JSONB NULL,
        PRIMARY KEY (entity_type, entity_id, attribute_code)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS user_groups (
        user_id BIGINT NOT NULL,
        group_id BIGINT NOT NULL,
        PRIMARY KEY (user_id, group_id)
    )"#,
];

/// Connection pool construction and maintenance for the CRM database
pub struct DatabaseManager;

impl DatabaseManager {
    /// Create a pool from `DatabaseConfig::url`
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool for: {}", Self::redact_url(url)?);
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Create missing tables and indexes
    pub async fn bootstrap_schema(pool: &PgPool) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        info!("Database schema verified ({} statements)", SCHEMA.len());
        Ok(())
    }

    /// Strip credentials so the URL can be logged
    fn redact_url(url: &str) -> Result<String, DatabaseError> {
        let mut parsed = url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if parsed.password().is_some() {
            parsed
                .set_password(Some("***"))
                .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        }
        Ok(parsed.into())
    }
}
