//! URL canonicalization helpers exposed to the site's editors, and the
//! checkout VietQR image built from the stored bank details.

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::{
    content::{
        BankConfig, ThumbnailQuality, extract_video_id, normalize_slug, thumbnail_url,
        vietqr::image_url,
    },
    settings::{SettingsError, SettingsStore},
};

/// Settings keys searched for bank details, in order.
const BANK_SETTINGS_KEYS: [&str; 2] = ["payment", "site"];

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SlugQuery {
    /// Free text, e.g. a course title.
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SlugResponse {
    pub slug: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct YoutubeQuery {
    pub url: Option<String>,
    /// `hq` (default) or `max`.
    #[param(value_type = Option<String>)]
    #[serde(default)]
    pub quality: ThumbnailQuality,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct YoutubeResponse {
    pub video_id: String,
    pub thumbnail_url: String,
}

#[utoipa::path(
    get,
    path = "/api/slug",
    params(SlugQuery),
    responses(
        (status = 200, description = "Normalized slug; empty for empty input.", body = SlugResponse),
    ),
    tag = "content"
)]
#[instrument(skip_all)]
pub async fn slug(Query(query): Query<SlugQuery>) -> Json<SlugResponse> {
    Json(SlugResponse {
        slug: normalize_slug(query.text.as_deref()),
    })
}

#[utoipa::path(
    get,
    path = "/api/youtube",
    params(YoutubeQuery),
    responses(
        (status = 200, description = "Video id and thumbnail URL.", body = YoutubeResponse),
        (status = 404, description = "Not a recognized YouTube link."),
    ),
    tag = "content"
)]
#[instrument(skip_all)]
pub async fn youtube(Query(query): Query<YoutubeQuery>) -> Response {
    let url = query.url.as_deref();
    match (extract_video_id(url), thumbnail_url(url, query.quality)) {
        (Some(video_id), Some(thumbnail_url)) => (
            StatusCode::OK,
            Json(YoutubeResponse {
                video_id,
                thumbnail_url,
            }),
        )
            .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct VietQrQuery {
    /// Transfer amount in VND; rounded, ignored unless positive.
    pub amount: Option<f64>,
    /// Transfer note, e.g. an order code.
    pub add_info: Option<String>,
    /// Image template, `qr_only` by default.
    pub template: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VietQrResponse {
    pub image_url: String,
    pub bank_code: String,
    pub bank_account_name: String,
    /// Settings key the bank details were read from.
    pub source: String,
}

async fn find_bank_config(
    store: &dyn SettingsStore,
) -> Result<Option<(&'static str, BankConfig)>, SettingsError> {
    for key in BANK_SETTINGS_KEYS {
        if let Some(record) = store.get_by_key(key).await? {
            let config = BankConfig::from_settings(&record.value);
            if config.is_complete() {
                return Ok(Some((key, config)));
            }
        }
    }
    Ok(None)
}

#[utoipa::path(
    get,
    path = "/api/vietqr",
    params(VietQrQuery),
    responses(
        (status = 200, description = "VietQR image URL for the configured bank account.", body = VietQrResponse),
        (status = 404, description = "No complete bank details in the `payment` or `site` settings."),
        (status = 503, description = "Settings store unavailable."),
    ),
    tag = "content"
)]
#[instrument(skip_all)]
pub async fn vietqr(
    Query(query): Query<VietQrQuery>,
    store: Extension<Arc<dyn SettingsStore>>,
) -> Response {
    let (source, config) = match find_bank_config(store.0.as_ref()).await {
        Ok(Some(found)) => found,
        Ok(None) => {
            debug!("no bank details configured");
            return StatusCode::NOT_FOUND.into_response();
        }
        Err(err) => return err.into_response(),
    };

    let request = config.qr_request(
        query.amount,
        query.add_info.as_deref(),
        query.template.as_deref(),
    );
    let Some(url) = image_url(&request) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    (
        StatusCode::OK,
        Json(VietQrResponse {
            image_url: url,
            bank_code: config.bank_code.clone().unwrap_or_default(),
            bank_account_name: config.bank_account_name.clone().unwrap_or_default(),
            source: source.to_string(),
        }),
    )
        .into_response()
}
