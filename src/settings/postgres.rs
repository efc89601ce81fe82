//! Postgres-backed settings store.
//!
//! Uniqueness is enforced by the `settings.key` primary key, so the
//! read-modify-write path can never leave two rows for a key; a racing insert
//! fails with a unique violation that surfaces as [`SettingsError::Conflict`].

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Connection, PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};
use std::time::Duration;
use tracing::{Instrument, debug, info_span, instrument};

use super::{SettingsError, SettingsRecord, SettingsStore, UpsertConsistency};

pub const SETTINGS_SCHEMA_SQL: &str = include_str!("../../db/sql/settings.sql");

const SELECT_BY_KEY: &str = "SELECT key, value, updated_at FROM settings WHERE key = $1";
const SELECT_ALL: &str = "SELECT key, value, updated_at FROM settings ORDER BY key";
const UPSERT_ATOMIC: &str = r"
    INSERT INTO settings (key, value, updated_at)
    VALUES ($1, $2, now())
    ON CONFLICT (key) DO UPDATE
    SET value = EXCLUDED.value,
        updated_at = GREATEST(now(), settings.updated_at)
    RETURNING key, value, updated_at
";
const UPDATE_BY_KEY: &str = r"
    UPDATE settings
    SET value = $2,
        updated_at = GREATEST(now(), updated_at)
    WHERE key = $1
    RETURNING key, value, updated_at
";
const INSERT: &str = r"
    INSERT INTO settings (key, value, updated_at)
    VALUES ($1, $2, now())
    RETURNING key, value, updated_at
";

#[derive(Clone, Debug)]
pub struct PgSettingsStore {
    pool: PgPool,
    consistency: UpsertConsistency,
}

impl PgSettingsStore {
    #[must_use]
    pub fn new(pool: PgPool, consistency: UpsertConsistency) -> Self {
        Self { pool, consistency }
    }

    /// Connect a small pool to `dsn`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be reached.
    pub async fn connect(dsn: &str, consistency: UpsertConsistency) -> Result<Self, SettingsError> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await?;
        Ok(Self::new(pool, consistency))
    }

    /// Create the `settings` table when it does not exist yet.
    ///
    /// # Errors
    /// Returns an error if the DDL fails.
    pub async fn ensure_schema(&self) -> Result<(), SettingsError> {
        sqlx::raw_sql(SETTINGS_SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn upsert_read_modify_write(
        &self,
        key: &str,
        value: &Value,
    ) -> Result<SettingsRecord, SettingsError> {
        let existing = sqlx::query(SELECT_BY_KEY)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        if existing.is_some() {
            let row = sqlx::query(UPDATE_BY_KEY)
                .bind(key)
                .bind(value)
                .fetch_optional(&self.pool)
                .await?;
            return match row {
                Some(row) => record_from_row(&row),
                None => Err(SettingsError::Conflict(key.to_string())),
            };
        }

        match sqlx::query(INSERT)
            .bind(key)
            .bind(value)
            .fetch_one(&self.pool)
            .await
        {
            Ok(row) => record_from_row(&row),
            Err(err) if is_unique_violation(&err) => {
                debug!(key, "settings insert lost a race");
                Err(SettingsError::Conflict(key.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn record_from_row(row: &PgRow) -> Result<SettingsRecord, SettingsError> {
    Ok(SettingsRecord {
        key: row.try_get("key")?,
        value: row.try_get("value")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    #[instrument(skip(self))]
    async fn get_by_key(&self, key: &str) -> Result<Option<SettingsRecord>, SettingsError> {
        let row = sqlx::query(SELECT_BY_KEY)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(record_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<SettingsRecord>, SettingsError> {
        let rows = sqlx::query(SELECT_ALL).fetch_all(&self.pool).await?;
        rows.iter().map(record_from_row).collect()
    }

    #[instrument(skip(self, value))]
    async fn upsert(&self, key: &str, value: Value) -> Result<SettingsRecord, SettingsError> {
        match self.consistency {
            UpsertConsistency::Atomic => {
                let row = sqlx::query(UPSERT_ATOMIC)
                    .bind(key)
                    .bind(&value)
                    .fetch_one(&self.pool)
                    .await?;
                record_from_row(&row)
            }
            UpsertConsistency::ReadModifyWrite => self.upsert_read_modify_write(key, &value).await,
        }
    }

    async fn ping(&self) -> Result<(), SettingsError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self.pool.acquire().instrument(acquire_span).await?;
        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping().instrument(ping_span).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
