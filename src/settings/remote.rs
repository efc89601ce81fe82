//! Settings store backed by a remote query service (Convex HTTP API).
//!
//! Functions are invoked with `POST {url}/api/query` and `POST {url}/api/mutation`
//! using the `settings:getByKey`, `settings:getAll` and `settings:upsert`
//! functions. The service runs each mutation as its own transaction, so the
//! upsert consistency option does not apply here.
//!
//! When no URL is configured the store still exists but every call fails with
//! [`SettingsError::Unavailable`], letting pages render without settings. Refused
//! connections and timeouts map to the same error.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{SettingsError, SettingsRecord, SettingsStore, UpsertConsistency};

const GET_BY_KEY: &str = "settings:getByKey";
const GET_ALL: &str = "settings:getAll";
const UPSERT: &str = "settings:upsert";
const REQUEST_TIMEOUT_SECONDS: u64 = 10;

#[derive(Clone, Copy, Debug)]
enum FunctionKind {
    Query,
    Mutation,
}

impl FunctionKind {
    const fn endpoint(self) -> &'static str {
        match self {
            Self::Query => "api/query",
            Self::Mutation => "api/mutation",
        }
    }
}

#[derive(Serialize)]
struct FunctionCall<'a> {
    path: &'a str,
    args: Value,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum FunctionResponse {
    Success {
        #[serde(default)]
        value: Value,
    },
    Error {
        #[serde(rename = "errorMessage", default)]
        error_message: String,
    },
}

/// Document shape returned by the remote `settings` table.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteRecord {
    key: String,
    #[serde(default)]
    value: Value,
    /// Epoch milliseconds.
    updated_at: f64,
}

impl TryFrom<RemoteRecord> for SettingsRecord {
    type Error = SettingsError;

    #[allow(clippy::cast_possible_truncation)]
    fn try_from(record: RemoteRecord) -> Result<Self, Self::Error> {
        let updated_at = DateTime::<Utc>::from_timestamp_millis(record.updated_at as i64)
            .ok_or_else(|| {
                SettingsError::Decode(format!("updatedAt out of range: {}", record.updated_at))
            })?;
        Ok(Self::new(record.key, record.value, updated_at))
    }
}

#[derive(Clone, Debug)]
pub struct RemoteSettingsStore {
    base_url: Option<Url>,
    client: Client,
}

impl RemoteSettingsStore {
    /// Build a store for `base_url`, or an unconfigured store when it is `None`.
    ///
    /// # Errors
    /// Returns an error if the URL is not an absolute http(s) URL or the HTTP
    /// client cannot be built.
    pub fn new(base_url: Option<&str>, consistency: UpsertConsistency) -> Result<Self> {
        let base_url = match base_url.map(str::trim).filter(|url| !url.is_empty()) {
            Some(raw) => {
                let mut parsed =
                    Url::parse(raw).with_context(|| format!("Invalid settings service URL: {raw}"))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(anyhow!("Settings service URL must use http(s): {raw}"));
                }
                // Url::join drops the last segment unless the path ends with '/'.
                if !parsed.path().ends_with('/') {
                    let path = format!("{}/", parsed.path());
                    parsed.set_path(&path);
                }
                Some(parsed)
            }
            None => {
                warn!("settings service URL not configured; remote settings are unavailable");
                None
            }
        };

        if consistency != UpsertConsistency::Atomic {
            debug!(
                consistency = consistency.as_str(),
                "remote settings service serializes mutations itself; consistency option ignored"
            );
        }

        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .build()
            .context("Failed to build settings service HTTP client")?;

        Ok(Self { base_url, client })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    async fn call(&self, kind: FunctionKind, path: &str, args: Value) -> Result<Value, SettingsError> {
        let base_url = self.base_url.as_ref().ok_or_else(|| {
            SettingsError::Unavailable("settings service URL is not configured".to_string())
        })?;
        let url = base_url
            .join(kind.endpoint())
            .map_err(|err| SettingsError::Unavailable(format!("invalid endpoint: {err}")))?;

        let response = self
            .client
            .post(url)
            .json(&FunctionCall {
                path,
                args,
                format: "json",
            })
            .send()
            .await?;

        let status = response.status();
        let body: FunctionResponse = response.json().await.map_err(|err| {
            SettingsError::Decode(format!("{path} returned {status} with unreadable body: {err}"))
        })?;

        match body {
            FunctionResponse::Success { value } => Ok(value),
            FunctionResponse::Error { error_message } => {
                Err(SettingsError::Remote(format!("{path}: {error_message}")))
            }
        }
    }
}

fn decode_record(value: Value) -> Result<Option<SettingsRecord>, SettingsError> {
    if value.is_null() {
        return Ok(None);
    }
    let record: RemoteRecord =
        serde_json::from_value(value).map_err(|err| SettingsError::Decode(err.to_string()))?;
    SettingsRecord::try_from(record).map(Some)
}

fn decode_records(value: Value) -> Result<Vec<SettingsRecord>, SettingsError> {
    let records: Vec<RemoteRecord> =
        serde_json::from_value(value).map_err(|err| SettingsError::Decode(err.to_string()))?;
    let mut records = records
        .into_iter()
        .map(SettingsRecord::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    records.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(records)
}

#[async_trait]
impl SettingsStore for RemoteSettingsStore {
    #[instrument(skip(self))]
    async fn get_by_key(&self, key: &str) -> Result<Option<SettingsRecord>, SettingsError> {
        let value = self
            .call(FunctionKind::Query, GET_BY_KEY, json!({ "key": key }))
            .await?;
        decode_record(value)
    }

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<SettingsRecord>, SettingsError> {
        let value = self.call(FunctionKind::Query, GET_ALL, json!({})).await?;
        decode_records(value)
    }

    #[instrument(skip(self, value))]
    async fn upsert(&self, key: &str, value: Value) -> Result<SettingsRecord, SettingsError> {
        let value = self
            .call(
                FunctionKind::Mutation,
                UPSERT,
                json!({ "key": key, "value": value }),
            )
            .await?;
        decode_record(value)?
            .ok_or_else(|| SettingsError::Decode(format!("{UPSERT} returned no document")))
    }

    async fn ping(&self) -> Result<(), SettingsError> {
        self.call(FunctionKind::Query, GET_BY_KEY, json!({ "key": "site" }))
            .await
            .map(|_| ())
    }

    fn backend(&self) -> &'static str {
        "remote"
    }
}
