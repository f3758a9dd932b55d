use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::session_user_id;
use super::validation::validate_search_id;
use super::{ApiError, ApiResponse, AppState, ClearedHistoryDto, SearchHistoryDto, WeatherReportDto};

#[derive(Deserialize)]
pub struct WeatherSearchRequest {
    pub city: String,
    pub country: String,
}

/// POST /weather/search
/// Record the search and return current conditions plus the daily forecast,
/// served from cache when the entry is younger than the freshness window.
pub async fn search_weather(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<WeatherSearchRequest>,
) -> Result<Json<ApiResponse<WeatherReportDto>>, ApiError> {
    let user_id = session_user_id(&session).await?;

    let report = state
        .weather()
        .lookup(user_id, &payload.city, &payload.country)
        .await?;

    Ok(Json(ApiResponse::success(report.into())))
}

/// POST /weather/refresh/{search_id}
/// Re-run the fetch-or-cache lookup for an existing history entry.
pub async fn refresh_weather(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(search_id): Path<i32>,
) -> Result<Json<ApiResponse<WeatherReportDto>>, ApiError> {
    let user_id = session_user_id(&session).await?;
    let search_id = validate_search_id(search_id)?;

    let report = state.weather().lookup_saved(user_id, search_id).await?;

    Ok(Json(ApiResponse::success(report.into())))
}

/// GET /history
/// The acting user's most recent searches, newest first.
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<Vec<SearchHistoryDto>>>, ApiError> {
    let user_id = session_user_id(&session).await?;
    let limit = state.config().read().await.cache.history_limit;

    let records = state
        .store()
        .recent_searches(user_id, limit)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to fetch search history: {e}")))?;

    Ok(Json(ApiResponse::success(
        records.into_iter().map(SearchHistoryDto::from).collect(),
    )))
}

/// DELETE /history
/// Remove all of the acting user's search records and cache entries.
pub async fn clear_history(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<ClearedHistoryDto>>, ApiError> {
    let user_id = session_user_id(&session).await?;

    let removed = state
        .store()
        .clear_search_history(user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to clear search history: {e}")))?;

    tracing::info!("Cleared {removed} search records for user {user_id}");

    Ok(Json(ApiResponse::success(ClearedHistoryDto { removed })))
}
