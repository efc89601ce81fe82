//! Keyed site settings.
//!
//! A settings record is a JSON document stored under a unique key (`site`,
//! `payment`, `contact`, ...). The store is built once at startup and shared
//! with handlers as `Arc<dyn SettingsStore>`; nothing here is process-global.
//!
//! Upsert is "find by key, then patch or insert". Whether the two steps run as
//! one unit is a [`UpsertConsistency`] choice made by the operator.

pub mod memory;
pub mod postgres;
pub mod remote;

pub use self::memory::MemorySettingsStore;
pub use self::postgres::PgSettingsStore;
pub use self::remote::RemoteSettingsStore;

use async_trait::async_trait;
use axum::{http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    pub key: String,
    /// Arbitrary JSON; its shape is owned by whoever reads the key.
    #[schema(value_type = Object)]
    pub value: Value,
    pub updated_at: DateTime<Utc>,
}

impl SettingsRecord {
    #[must_use]
    pub fn new(key: impl Into<String>, value: Value, updated_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            value,
            updated_at,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings store unavailable: {0}")]
    Unavailable(String),
    #[error("settings key {0:?} was written concurrently")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
    #[error("remote query failed: {0}")]
    Remote(String),
    #[error("remote request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("unexpected settings payload: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for SettingsError {
    /// Pool and socket failures mean the database cannot be reached.
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(format!("database unreachable: {err}"))
            }
            err => Self::Database(err),
        }
    }
}

impl From<reqwest::Error> for SettingsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Unavailable(format!("settings service unreachable: {err}"))
        } else {
            Self::Http(err)
        }
    }
}

impl IntoResponse for SettingsError {
    /// Store failures become stable status codes; details stay in the logs.
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::Unavailable(reason) => {
                error!("Settings store unavailable: {reason}");
                (StatusCode::SERVICE_UNAVAILABLE, "Settings store unavailable").into_response()
            }
            Self::Conflict(key) => (
                StatusCode::CONFLICT,
                format!("Settings key {key} was updated concurrently, retry"),
            )
                .into_response(),
            err => {
                error!("Settings store error: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// How `upsert` sequences its lookup and its write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UpsertConsistency {
    /// Lookup and write are one unit; concurrent upserts of a key serialize.
    #[default]
    Atomic,
    /// Lookup, then a separate write. Concurrent upserts of the same key may
    /// lose an update or fail with [`SettingsError::Conflict`].
    ReadModifyWrite,
}

impl UpsertConsistency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Atomic => "atomic",
            Self::ReadModifyWrite => "read-modify-write",
        }
    }
}

impl std::str::FromStr for UpsertConsistency {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "atomic" => Ok(Self::Atomic),
            "read-modify-write" | "rmw" => Ok(Self::ReadModifyWrite),
            other => Err(format!("invalid settings consistency: {other}")),
        }
    }
}

/// Which backend to build at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreKind {
    /// Postgres when a DSN is configured, else the remote service when its URL
    /// is configured, else memory.
    #[default]
    Auto,
    Memory,
    Postgres,
    Remote,
}

impl std::str::FromStr for StoreKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "memory" => Ok(Self::Memory),
            "postgres" => Ok(Self::Postgres),
            "remote" | "convex" => Ok(Self::Remote),
            other => Err(format!("invalid settings store: {other}")),
        }
    }
}

impl StoreKind {
    /// Resolve `Auto` against what is configured.
    #[must_use]
    pub const fn resolve(self, has_dsn: bool, has_remote_url: bool) -> Self {
        match self {
            Self::Auto if has_dsn => Self::Postgres,
            Self::Auto if has_remote_url => Self::Remote,
            Self::Auto => Self::Memory,
            other => other,
        }
    }
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_by_key(&self, key: &str) -> Result<Option<SettingsRecord>, SettingsError>;

    async fn get_all(&self) -> Result<Vec<SettingsRecord>, SettingsError>;

    /// Patch `value`/`updated_at` of the record for `key`, inserting it when absent.
    async fn upsert(&self, key: &str, value: Value) -> Result<SettingsRecord, SettingsError>;

    /// Cheap reachability check used by `/health`.
    async fn ping(&self) -> Result<(), SettingsError>;

    fn backend(&self) -> &'static str;
}
