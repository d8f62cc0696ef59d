//! Bookings API endpoints.
//!
//! The POST payload is a union of two request kinds: a bare
//! `reservationId` confirms an existing reservation, the full field set
//! creates a new one. The union is resolved into the engine's tagged
//! `BookingRequest` here, at the transport boundary, so the engine never
//! infers intent from missing fields.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::BookingSummary;
use crate::engine::booking::{book, BookingRequest, NewBooking};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingPayload {
    pub reservation_id: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub studio_id: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_phone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub reservation_id: String,
}

/// Resolve the wire payload into a typed booking request.
///
/// Validation failures return before any store access: a rejected
/// payload creates neither a user nor a reservation.
fn resolve_payload(payload: BookingPayload) -> Result<BookingRequest, ApiError> {
    if let Some(reservation_id) = payload.reservation_id {
        if let Err(e) = validation::validate_uuid(&reservation_id, "reservationId") {
            return Err(ApiError::validation_field("reservationId", e));
        }
        return Ok(BookingRequest::Confirm { reservation_id });
    }

    let mut errors = ValidationErrorBuilder::new();

    let date = match validation::validate_date(payload.date.as_deref().unwrap_or("")) {
        Ok(d) => Some(d),
        Err(e) => {
            errors.add("date", e);
            None
        }
    };

    let start_time = payload.start_time.as_deref().unwrap_or("");
    if let Err(e) = validation::validate_time(start_time, "startTime") {
        errors.add("startTime", e);
    }

    let end_time = payload.end_time.as_deref().unwrap_or("");
    if let Err(e) = validation::validate_time(end_time, "endTime") {
        errors.add("endTime", e);
    }

    let studio_id = payload.studio_id.as_deref().unwrap_or("");
    if let Err(e) = validation::validate_uuid(studio_id, "studioId") {
        errors.add("studioId", e);
    }

    let user_name = payload.user_name.as_deref().unwrap_or("");
    if let Err(e) = validation::validate_name(user_name) {
        errors.add("userName", e);
    }

    let user_email = payload.user_email.as_deref().unwrap_or("");
    if let Err(e) = validation::validate_email(user_email) {
        errors.add("userEmail", e);
    }

    if let Err(e) = validation::validate_phone(&payload.user_phone) {
        errors.add("userPhone", e);
    }

    errors.finish()?;

    Ok(BookingRequest::New(NewBooking {
        date: date.expect("date validated above"),
        start_time: start_time.to_string(),
        end_time: end_time.to_string(),
        studio_id: studio_id.to_string(),
        user_name: user_name.to_string(),
        user_email: user_email.to_string(),
        user_phone: payload.user_phone,
    }))
}

/// Create a reservation, or confirm an existing one by id
///
/// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BookingPayload>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let request = resolve_payload(payload)?;
    let created = matches!(request, BookingRequest::New(_));

    let reservation_id = book(&state.db, request).await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(BookingResponse { reservation_id })))
}

#[derive(Debug, Deserialize)]
pub struct BookingsQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListBookingsResponse {
    pub bookings: Vec<BookingSummary>,
}

/// List a requester's bookings, most recent date first
///
/// GET /api/bookings?email=...
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<ListBookingsResponse>, ApiError> {
    let email = query.email.as_deref().unwrap_or("");
    validation::validate_email(email).map_err(|e| ApiError::validation_field("email", e))?;

    let bookings = sqlx::query_as::<_, BookingSummary>(
        "SELECT r.id, r.date, r.start_time, r.end_time, s.name AS studio_name, r.status \
         FROM reservations r \
         INNER JOIN users u ON r.user_id = u.id \
         INNER JOIN studios s ON r.studio_id = s.id \
         WHERE u.email = ? \
         ORDER BY r.date DESC, r.start_time ASC",
    )
    .bind(email)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ListBookingsResponse { bookings }))
}
