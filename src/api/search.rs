//! Voice search endpoint
//!
//! The boundary external front-ends call with a query, the user's custom
//! commands, and a locale. Command matches short-circuit inference; degraded
//! model output is already normalized away below this layer, so the only
//! error surfaces here are a missing query (400) and an unreachable
//! upstream (500).

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use serde_json::json;

use super::ApiState;
use crate::i18n::Language;
use crate::settings::CustomCommand;

/// Build search router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/voice-search", post(voice_search))
        .with_state(state)
}

/// Request body for a voice search
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSearchRequest {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    custom_commands: Vec<CustomCommand>,
    #[serde(default)]
    language: Language,
}

/// Resolve a query into a structured response
async fn voice_search(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<VoiceSearchRequest>,
) -> Response {
    let Some(query) = request.query.filter(|q| !q.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Query is required" })),
        )
            .into_response();
    };

    match state
        .inference
        .infer(&query, &request.custom_commands, request.language)
        .await
    {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "voice search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to process voice search" })),
            )
                .into_response()
        }
    }
}
