//! Settings endpoints
//!
//! Read/update the settings blob and manage custom commands. All mutations
//! go through the [`SettingsStore`]'s update operations.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Serialize;
use serde_json::json;

use super::ApiState;
use crate::settings::{CommandDraft, CommandPatch, PresentationFlags, Settings, SettingsPatch};
use crate::Error;

/// Build settings router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/settings", get(get_settings).put(update_settings))
        .route("/api/settings/reset", post(reset_settings))
        .route("/api/settings/commands", post(add_command))
        .route(
            "/api/settings/commands/{id}",
            put(update_command).delete(delete_command),
        )
        .with_state(state)
}

/// Settings plus the presentation flags derived from them
#[derive(Serialize)]
struct SettingsView {
    settings: Settings,
    presentation: PresentationFlags,
}

fn view(settings: Settings) -> Json<SettingsView> {
    let presentation = PresentationFlags::derive(&settings);
    Json(SettingsView {
        settings,
        presentation,
    })
}

/// Current settings snapshot
async fn get_settings(State(state): State<Arc<ApiState>>) -> Json<SettingsView> {
    view(state.settings.get())
}

/// Shallow-merge a partial update
async fn update_settings(
    State(state): State<Arc<ApiState>>,
    Json(patch): Json<SettingsPatch>,
) -> Response {
    match state.settings.apply_patch(&patch) {
        Ok(settings) => view(settings).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Restore defaults and erase durable state
async fn reset_settings(State(state): State<Arc<ApiState>>) -> Response {
    match state.settings.reset() {
        Ok(settings) => view(settings).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Create a custom command
async fn add_command(
    State(state): State<Arc<ApiState>>,
    Json(draft): Json<CommandDraft>,
) -> Response {
    match state.settings.add_command(draft) {
        Ok(command) => (StatusCode::CREATED, Json(command)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Update a custom command by id
async fn update_command(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(patch): Json<CommandPatch>,
) -> Response {
    match state.settings.update_command(&id, &patch) {
        Ok(Some(command)) => Json(command).into_response(),
        Ok(None) => not_found(&id),
        Err(e) => error_response(&e),
    }
}

/// Delete a custom command by id
async fn delete_command(State(state): State<Arc<ApiState>>, Path(id): Path<String>) -> Response {
    match state.settings.delete_command(&id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found(&id),
        Err(e) => error_response(&e),
    }
}

fn not_found(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("command not found: {id}") })),
    )
        .into_response()
}

/// Map store errors: validation failures are the caller's fault
fn error_response(error: &Error) -> Response {
    let status = match error {
        Error::Settings(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}
