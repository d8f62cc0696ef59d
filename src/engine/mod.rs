pub mod availability;
pub mod booking;
pub mod catalog;
pub mod expiry;
pub mod identity;

pub use availability::*;
pub use booking::*;
pub use expiry::*;

use thiserror::Error;

/// Errors produced by the availability and booking engines.
///
/// Every error is recoverable at the caller: invalid input and slot
/// conflicts by fixing the request, store failures by retrying. Nothing
/// here is fatal to the process.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or malformed request data; no store mutation occurred
    #[error("{0}")]
    InvalidInput(String),

    /// Referenced entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// The requested (date, studio, slot) is already occupied
    #[error("This time slot is no longer available")]
    SlotConflict,

    /// Transient store failure; the request may be retried
    #[error("Reservation store unavailable")]
    StoreUnavailable(#[source] sqlx::Error),
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // A violation of the active-slot unique index is the
            // authoritative conflict signal (the in-transaction pre-check
            // is only a fast path)
            if db_err.message().contains("ux_reservations_active_slot") {
                return EngineError::SlotConflict;
            }
        }
        EngineError::StoreUnavailable(err)
    }
}
