//! `POST /resolve`: batch title lookup for URLs and legacy video ids.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Json,
};
use linktitle_core::ResolveResult;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::server::GatewayState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub video_ids: Vec<String>,
    /// Include full per-URL results alongside the titles.
    #[serde(default)]
    pub details: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub titles: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<HashMap<String, ResolveResult>>,
}

fn has_content(items: &[String]) -> bool {
    items.iter().any(|s| !s.trim().is_empty())
}

pub async fn resolve(
    State(state): State<GatewayState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let body = body.map_err(|rejection| ApiError::new(rejection.status(), rejection.body_text()))?;
    let request: ResolveRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid request body: {e}")))?;

    let submitted = request.urls.len() + request.video_ids.len();
    if submitted > state.limits.max_items {
        return Err(ApiError::too_large(format!(
            "too many items: {submitted} submitted, at most {} allowed",
            state.limits.max_items
        )));
    }

    // Items are trimmed for lookup only; responses are keyed by the
    // strings as submitted.
    let (urls, video_ids) = (request.urls, request.video_ids);
    if !has_content(&urls) && !has_content(&video_ids) {
        return Ok(Json(ResolveResponse::default()));
    }

    let (by_url, by_id) = tokio::join!(
        state.manager.resolve_multi(&urls),
        state.manager.resolve_legacy_ids(&video_ids),
    );

    let mut titles: HashMap<String, String> = by_url
        .iter()
        .map(|(url, result)| (url.clone(), result.title.clone()))
        .collect();
    titles.extend(by_id);

    info!(
        urls = urls.len(),
        video_ids = video_ids.len(),
        resolved = titles.len(),
        "Resolved batch"
    );

    Ok(Json(ResolveResponse {
        titles,
        results: request.details.then_some(by_url),
    }))
}
