//! Availability API endpoint.
//!
//! Thin transport over the availability engine: parses and normalizes
//! the date, then returns the engine's result as-is.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::StudioResponse;
use crate::engine::availability::{compute_availability, AvailabilitySlot};
use crate::AppState;

use super::error::ApiError;
use super::validation;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub date: Option<String>,
    pub studio_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub date: String,
    pub slots: Vec<AvailabilitySlot>,
    /// Omitted when the request was filtered to a single studio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub studios: Option<Vec<StudioResponse>>,
}

/// Per-slot availability for one day
///
/// GET /api/availability?date=YYYY-MM-DD[&studioId=...]
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let date_str = query.date.as_deref().unwrap_or("");
    let date = validation::validate_date(date_str)
        .map_err(|e| ApiError::validation_field("date", e))?;

    let availability = compute_availability(&state.db, date, query.studio_id.as_deref()).await?;

    let studios = if query.studio_id.is_some() {
        None
    } else {
        Some(availability.studios)
    };

    Ok(Json(AvailabilityResponse {
        date: date_str.to_string(),
        slots: availability.slots,
        studios,
    }))
}
