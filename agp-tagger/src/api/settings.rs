//! Runtime settings endpoints
//!
//! GET /settings returns the persisted settings with secrets masked.
//! PUT /settings replaces them; a masked secret sent back keeps the stored
//! value.

use axum::{extract::State, routing::get, Json, Router};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    models::AppSettings,
    AppState,
};

/// Placeholder returned in place of a stored secret
pub const SECRET_MASK: &str = "********";

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        SECRET_MASK.to_string()
    }
}

fn masked(settings: &AppSettings) -> AppSettings {
    AppSettings {
        spotify_client_secret: mask(&settings.spotify_client_secret),
        beatport_password: mask(&settings.beatport_password),
        ..settings.clone()
    }
}

fn keep_if_masked(incoming: String, stored: &str) -> String {
    if incoming == SECRET_MASK {
        stored.to_string()
    } else {
        incoming
    }
}

/// GET /settings
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<AppSettings>> {
    let settings = state.settings_store.load_settings()?;
    Ok(Json(masked(&settings)))
}

/// PUT /settings
///
/// **Errors:**
/// - 400 Bad Request: empty folder pattern
/// - 409 Conflict: a pass is running
/// - 500 Internal Server Error: settings file unreadable or unwritable
pub async fn put_settings(
    State(state): State<AppState>,
    Json(incoming): Json<AppSettings>,
) -> ApiResult<Json<AppSettings>> {
    state.session.ensure_idle()?;

    if incoming.folder_pattern.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Folder pattern cannot be empty".to_string(),
        ));
    }

    let stored = state.settings_store.load_settings()?;
    let settings = AppSettings {
        spotify_client_secret: keep_if_masked(
            incoming.spotify_client_secret.clone(),
            &stored.spotify_client_secret,
        ),
        beatport_password: keep_if_masked(
            incoming.beatport_password.clone(),
            &stored.beatport_password,
        ),
        ..incoming
    };

    state.settings_store.save_settings(&settings)?;
    info!(
        backup = settings.backup_before_changes,
        rename = settings.rename_files,
        organize = settings.organize_files,
        folder_pattern = %settings.folder_pattern,
        "Settings updated via API"
    );

    Ok(Json(masked(&settings)))
}

pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).put(put_settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masking_hides_only_secrets() {
        let settings = AppSettings {
            spotify_client_id: "id".to_string(),
            spotify_client_secret: "secret".to_string(),
            beatport_username: "dj".to_string(),
            beatport_password: String::new(),
            ..Default::default()
        };
        let shown = masked(&settings);
        assert_eq!(shown.spotify_client_id, "id");
        assert_eq!(shown.spotify_client_secret, SECRET_MASK);
        assert_eq!(shown.beatport_username, "dj");
        assert_eq!(shown.beatport_password, "");
    }

    #[test]
    fn test_masked_secret_keeps_stored_value() {
        assert_eq!(keep_if_masked(SECRET_MASK.to_string(), "old"), "old");
        assert_eq!(keep_if_masked("new".to_string(), "old"), "new");
        assert_eq!(keep_if_masked(String::new(), "old"), "");
    }
}
