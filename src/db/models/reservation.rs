//! Reservation models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Expired,
}

impl ReservationStatus {
    /// PENDING and CONFIRMED block re-booking of their (date, studio, slot)
    /// triple; CANCELLED and EXPIRED are terminal and do not.
    pub fn is_occupying(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Confirmed => write!(f, "CONFIRMED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

impl From<String> for ReservationStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PENDING" => Self::Pending,
            "CONFIRMED" => Self::Confirmed,
            "CANCELLED" => Self::Cancelled,
            "EXPIRED" => Self::Expired,
            _ => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub id: String,
    /// Day granularity ("YYYY-MM-DD"); any time-of-day is normalized away
    /// before storage
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub studio_id: String,
    pub user_id: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Reservation {
    pub fn status_enum(&self) -> ReservationStatus {
        ReservationStatus::from(self.status.clone())
    }
}

/// Reservation joined with its studio, for the bookings listing
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub studio_name: String,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ReservationStatus::Pending,
            ReservationStatus::Confirmed,
            ReservationStatus::Cancelled,
            ReservationStatus::Expired,
        ] {
            assert_eq!(ReservationStatus::from(status.to_string()), status);
        }
    }

    #[test]
    fn test_occupying_statuses() {
        assert!(ReservationStatus::Pending.is_occupying());
        assert!(ReservationStatus::Confirmed.is_occupying());
        assert!(!ReservationStatus::Cancelled.is_occupying());
        assert!(!ReservationStatus::Expired.is_occupying());
    }
}
