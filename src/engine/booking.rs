//! Booking engine.
//!
//! The reservation write path: re-validates the requested slot, resolves
//! the requester, and commits the reservation. The conflict check and the
//! insert run inside one transaction, and the active-slot unique index
//! rejects whichever concurrent writer loses the race, so a slot can
//! never be double-booked regardless of interleaving.

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use super::catalog;
use super::identity;
use super::EngineError;
use crate::api::metrics::{record_booking_confirmed, record_slot_conflict};
use crate::db::{DbPool, Reservation, ReservationStatus};

/// A booking request, resolved from the transport payload.
///
/// `Confirm` carries only the idempotency handle of an existing
/// reservation; `New` carries the full slot, studio, and requester data.
#[derive(Debug, Clone)]
pub enum BookingRequest {
    Confirm { reservation_id: String },
    New(NewBooking),
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub studio_id: String,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: Option<String>,
}

/// Process a booking request, returning the reservation id.
pub async fn book(db: &DbPool, request: BookingRequest) -> Result<String, EngineError> {
    match request {
        BookingRequest::Confirm { reservation_id } => confirm_existing(db, &reservation_id).await,
        BookingRequest::New(booking) => create_reservation(db, booking).await,
    }
}

/// Confirm an existing reservation by id.
///
/// Idempotent: a reservation that is already CONFIRMED is returned
/// unchanged. Terminal statuses are not silently reopened.
async fn confirm_existing(db: &DbPool, reservation_id: &str) -> Result<String, EngineError> {
    let reservation = sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = ?")
        .bind(reservation_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| EngineError::NotFound("Reservation not found".to_string()))?;

    match reservation.status_enum() {
        ReservationStatus::Confirmed => Ok(reservation.id),
        ReservationStatus::Pending => {
            sqlx::query("UPDATE reservations SET status = 'CONFIRMED', updated_at = ? WHERE id = ?")
                .bind(chrono::Utc::now().to_rfc3339())
                .bind(&reservation.id)
                .execute(db)
                .await?;

            info!(reservation_id = %reservation.id, "Pending reservation confirmed");
            record_booking_confirmed();
            Ok(reservation.id)
        }
        status => Err(EngineError::InvalidInput(format!(
            "Reservation is {} and can no longer be confirmed",
            status
        ))),
    }
}

/// Create a new CONFIRMED reservation.
///
/// Requester upsert and reservation insert share one transaction; if the
/// insert fails nothing is committed, so no orphaned requester can be
/// left behind by this path.
async fn create_reservation(db: &DbPool, booking: NewBooking) -> Result<String, EngineError> {
    // Reservations may only occupy catalog slots
    if catalog::find_slot(&booking.start_time, &booking.end_time).is_none() {
        return Err(EngineError::InvalidInput(format!(
            "No {} - {} slot in the daily catalog",
            booking.start_time, booking.end_time
        )));
    }

    let day = booking.date.format("%Y-%m-%d").to_string();

    let mut tx = db.begin().await?;

    // Fast-path conflict check; the unique index remains the authority
    let existing: Option<(String,)> = sqlx::query_as(
        "SELECT id FROM reservations \
         WHERE date = ? AND start_time = ? AND studio_id = ? \
         AND status IN ('PENDING', 'CONFIRMED') LIMIT 1",
    )
    .bind(&day)
    .bind(&booking.start_time)
    .bind(&booking.studio_id)
    .fetch_optional(&mut *tx)
    .await?;

    if existing.is_some() {
        record_slot_conflict();
        return Err(EngineError::SlotConflict);
    }

    let studio: Option<(String,)> = sqlx::query_as("SELECT id FROM studios WHERE id = ?")
        .bind(&booking.studio_id)
        .fetch_optional(&mut *tx)
        .await?;
    if studio.is_none() {
        return Err(EngineError::NotFound("Studio not found".to_string()));
    }

    let user = identity::upsert_user(
        &mut *tx,
        &booking.user_name,
        &booking.user_email,
        booking.user_phone.as_deref(),
    )
    .await?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let insert = sqlx::query(
        r#"
        INSERT INTO reservations
            (id, date, start_time, end_time, studio_id, user_id, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 'CONFIRMED', ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&day)
    .bind(&booking.start_time)
    .bind(&booking.end_time)
    .bind(&booking.studio_id)
    .bind(&user.id)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await;

    if let Err(err) = insert {
        let err = EngineError::from(err);
        if matches!(err, EngineError::SlotConflict) {
            record_slot_conflict();
        }
        return Err(err);
    }

    tx.commit().await?;

    info!(
        reservation_id = %id,
        studio_id = %booking.studio_id,
        date = %day,
        start_time = %booking.start_time,
        "Reservation created"
    );
    record_booking_confirmed();

    Ok(id)
}
