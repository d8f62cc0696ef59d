//! Studios API endpoint (read-only listing).

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::db::{Studio, StudioResponse};
use crate::AppState;

use super::error::ApiError;

/// List all bookable studios
///
/// GET /api/studios
pub async fn list_studios(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StudioResponse>>, ApiError> {
    let studios = sqlx::query_as::<_, Studio>("SELECT * FROM studios ORDER BY name")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(
        studios.into_iter().map(StudioResponse::from).collect(),
    ))
}
