use crate::{
    AppState,
    cache::EntryInfo,
    photodex::{PhotodexError, TrainerSummary},
    security::require_admin,
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
pub struct CacheListing {
    lookups: Vec<EntryInfo>,
    pages: Vec<EntryInfo>,
}

#[derive(Serialize)]
pub struct InvalidateResponse {
    username: String,
    pages_removed: usize,
}

pub async fn trainer_api_handler(
    State(app_state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<TrainerSummary>, PhotodexError> {
    let dex = app_state.photodex.load(&username).await?;
    Ok(Json(dex.summary(app_state.config.app.base_url.as_deref())))
}

pub async fn admin_cache_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = require_admin(&headers, &app_state.config.security) {
        return denied;
    }

    Json(CacheListing {
        lookups: app_state.photodex.lookup_entries().await,
        pages: app_state.pages.entries().await,
    })
    .into_response()
}

pub async fn admin_clear_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = require_admin(&headers, &app_state.config.security) {
        return denied;
    }

    app_state.photodex.lookups().clear().await;
    app_state.pages.clear().await;
    info!("Admin cleared all caches");
    StatusCode::NO_CONTENT.into_response()
}

pub async fn admin_invalidate_handler(
    State(app_state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = require_admin(&headers, &app_state.config.security) {
        return denied;
    }

    app_state.photodex.lookups().invalidate(&username, None).await;
    let page = format!("/{}", username.to_lowercase());
    let pages_removed = app_state.pages.remove_where(|key| key == page).await;
    info!(username = %username, pages_removed, "Admin invalidated trainer");

    Json(InvalidateResponse {
        username,
        pages_removed,
    })
    .into_response()
}
