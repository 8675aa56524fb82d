//! Library workflow API handlers
//!
//! POST /library/scan, POST /library/apply, POST /library/cancel,
//! GET /library/status, GET /library/files,
//! PUT /library/files/:index/selection, GET /library/duplicates,
//! POST /library/restore

use agp_common::PassKind;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{AppSettings, ApplyReport, EnhancedAudioFile, Metadata, ProgressSnapshot},
    services::{find_duplicates, MetadataLookup},
    AppState,
};

/// POST /library/scan request
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub path: String,
}

/// Response for any pass-starting request
#[derive(Debug, Serialize)]
pub struct PassStartedResponse {
    pub pass_id: Uuid,
    pub pass: PassKind,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

/// GET /library/status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub progress: ProgressSnapshot,
    pub active_pass: Option<PassKind>,
    pub total_files: usize,
    pub last_apply_report: Option<ApplyReport>,
    /// Summary line of `last_apply_report`
    pub last_apply_message: Option<String>,
}

/// PUT /library/files/:index/selection request
///
/// `genre` absent leaves the override alone, `null` or blank clears it.
#[derive(Debug, Default, Deserialize)]
pub struct SelectionRequest {
    #[serde(default)]
    pub suggestion_index: Option<usize>,
    #[serde(default, deserialize_with = "present_field")]
    pub genre: Option<Option<String>>,
}

fn present_field<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
pub struct DuplicatesResponse {
    pub groups: Vec<Vec<usize>>,
}

/// POST /library/restore request
#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    pub backup_path: PathBuf,
    pub original_path: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct RestoreResponse {
    pub original_path: PathBuf,
    pub restored: Metadata,
    /// Whether an inventory entry was refreshed with the restored tags
    pub inventory_updated: bool,
}

fn load_settings(state: &AppState) -> ApiResult<AppSettings> {
    state.settings_store.load_settings().map_err(|e| {
        tracing::error!(
            path = %state.settings_store.path().display(),
            error = %e,
            "Failed to load settings"
        );
        ApiError::from(e)
    })
}

fn build_lookup(state: &AppState, settings: &AppSettings) -> ApiResult<Arc<dyn MetadataLookup>> {
    (state.lookup_factory)(settings)
        .map_err(|e| ApiError::Internal(format!("Failed to initialize metadata providers: {}", e)))
}

/// POST /library/scan
///
/// Scan a folder and resolve suggestions in the background. Returns 202.
pub async fn start_scan(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> ApiResult<(StatusCode, Json<PassStartedResponse>)> {
    let root = PathBuf::from(&request.path);
    if !root.exists() {
        return Err(ApiError::BadRequest(format!(
            "Folder does not exist: {}",
            request.path
        )));
    }
    if !root.is_dir() {
        return Err(ApiError::BadRequest(format!(
            "Path is not a directory: {}",
            request.path
        )));
    }

    let settings = load_settings(&state)?;
    let lookup = build_lookup(&state, &settings)?;
    let guard = state.session.begin_pass(PassKind::Scanning)?;

    let response = PassStartedResponse {
        pass_id: guard.pass_id(),
        pass: guard.kind(),
        started_at: chrono::Utc::now(),
    };

    state.orchestrator(lookup).spawn_scan_pass(guard, root);

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// POST /library/apply
///
/// Apply accepted suggestions with the current settings. Returns 202.
pub async fn start_apply(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<PassStartedResponse>)> {
    let settings = load_settings(&state)?;
    let lookup = build_lookup(&state, &settings)?;
    let guard = state.session.begin_pass(PassKind::Applying)?;

    // Checked under the guard so a concurrent scan cannot swap the inventory
    if state.session.inventory().await.is_empty() {
        return Err(crate::services::SessionError::NoInventory.into());
    }

    let response = PassStartedResponse {
        pass_id: guard.pass_id(),
        pass: guard.kind(),
        started_at: chrono::Utc::now(),
    };

    state.orchestrator(lookup).spawn_apply_pass(guard, settings);

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// POST /library/cancel
pub async fn cancel_pass(State(state): State<AppState>) -> Json<CancelResponse> {
    Json(CancelResponse {
        cancelled: state.session.cancel_active(),
    })
}

/// GET /library/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let last_apply_report = state.session.last_apply_report().await;

    Json(StatusResponse {
        progress: state.reporter.snapshot().await,
        active_pass: state.session.active_pass().map(|(_, kind)| kind),
        total_files: state.session.inventory().await.len(),
        last_apply_message: last_apply_report.as_ref().map(ApplyReport::message),
        last_apply_report,
    })
}

/// GET /library/files
pub async fn list_files(State(state): State<AppState>) -> Json<Vec<EnhancedAudioFile>> {
    Json(state.session.inventory().await)
}

/// PUT /library/files/:index/selection
///
/// Promote a suggestion to the top and/or set the genre override.
pub async fn update_selection(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(request): Json<SelectionRequest>,
) -> ApiResult<Json<EnhancedAudioFile>> {
    let entry = state
        .session
        .update_selection(index, request.suggestion_index, request.genre)
        .await?;

    tracing::debug!(
        index,
        file = %entry.file.path.display(),
        selected_genre = ?entry.selected_genre,
        "Selection updated"
    );

    Ok(Json(entry))
}

/// GET /library/duplicates
pub async fn list_duplicates(State(state): State<AppState>) -> Json<DuplicatesResponse> {
    let inventory = state.session.inventory().await;
    Json(DuplicatesResponse {
        groups: find_duplicates(&inventory),
    })
}

/// POST /library/restore
///
/// Write a tag backup back to its file. Rejected while a pass runs.
pub async fn restore_backup(
    State(state): State<AppState>,
    Json(request): Json<RestoreRequest>,
) -> ApiResult<Json<RestoreResponse>> {
    state.session.ensure_idle()?;

    if !request.backup_path.is_file() {
        return Err(ApiError::NotFound(format!(
            "Backup not found: {}",
            request.backup_path.display()
        )));
    }

    let restored = state
        .library
        .restore_from_backup(&request.backup_path, &request.original_path)
        .await?;

    let inventory_updated = state
        .session
        .refresh_metadata(&request.original_path, restored.clone())
        .await;

    tracing::info!(
        backup = %request.backup_path.display(),
        file = %request.original_path.display(),
        "Backup restored"
    );

    Ok(Json(RestoreResponse {
        original_path: request.original_path,
        restored,
        inventory_updated,
    }))
}

pub fn library_routes() -> Router<AppState> {
    Router::new()
        .route("/library/scan", post(start_scan))
        .route("/library/apply", post(start_apply))
        .route("/library/cancel", post(cancel_pass))
        .route("/library/status", get(get_status))
        .route("/library/files", get(list_files))
        .route("/library/files/:index/selection", put(update_selection))
        .route("/library/duplicates", get(list_duplicates))
        .route("/library/restore", post(restore_backup))
}
