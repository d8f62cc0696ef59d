//! Pending-reservation expiry module
//!
//! A PENDING reservation holds its slot while the requester completes the
//! flow; abandoned ones would block the slot forever. This background
//! task periodically transitions PENDING reservations older than the
//! configured hold window to EXPIRED, releasing their slots.

use crate::config::BookingConfig;
use crate::DbPool;
use anyhow::Result;
use chrono::{Duration, Utc};
use tokio::time::interval;

/// Expires stale pending reservations
pub struct ReservationExpiry {
    db: DbPool,
    config: BookingConfig,
}

impl ReservationExpiry {
    pub fn new(db: DbPool, config: BookingConfig) -> Self {
        Self { db, config }
    }

    /// Run a single expiry sweep, returning how many reservations expired
    pub async fn run_sweep(&self) -> Result<u64> {
        let cutoff = (Utc::now() - Duration::minutes(self.config.pending_hold_minutes)).to_rfc3339();
        let now = Utc::now().to_rfc3339();

        // Timestamps are UTC RFC 3339, so string comparison is chronological
        let result = sqlx::query(
            "UPDATE reservations SET status = 'EXPIRED', updated_at = ? \
             WHERE status = 'PENDING' AND created_at < ?",
        )
        .bind(&now)
        .bind(&cutoff)
        .execute(&self.db)
        .await?;

        let expired = result.rows_affected();
        if expired > 0 {
            tracing::info!(expired, "Expired stale pending reservations");
        }

        Ok(expired)
    }

    /// Run the sweep on an interval, forever
    pub async fn run(self) {
        let mut ticker = interval(std::time::Duration::from_secs(
            self.config.expiry_sweep_interval,
        ));

        tracing::info!(
            interval_secs = self.config.expiry_sweep_interval,
            hold_minutes = self.config.pending_hold_minutes,
            "Reservation expiry sweep started"
        );

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_sweep().await {
                tracing::warn!(error = %e, "Expiry sweep failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::{insert_studio, insert_user};
    use uuid::Uuid;

    async fn insert_pending_aged(pool: &DbPool, studio_id: &str, user_id: &str, start: &str, age_minutes: i64) -> String {
        let id = Uuid::new_v4().to_string();
        let created_at = (Utc::now() - Duration::minutes(age_minutes)).to_rfc3339();
        sqlx::query(
            "INSERT INTO reservations \
             (id, date, start_time, end_time, studio_id, user_id, status, created_at, updated_at) \
             VALUES (?, '2025-06-02', ?, ?, ?, ?, 'PENDING', ?, ?)",
        )
        .bind(&id)
        .bind(start)
        .bind(format!("{:02}:00", start.split(':').next().unwrap().parse::<u32>().unwrap() + 1))
        .bind(studio_id)
        .bind(user_id)
        .bind(&created_at)
        .bind(&created_at)
        .execute(pool)
        .await
        .unwrap();
        id
    }

    #[tokio::test]
    async fn test_sweep_expires_only_stale_pending() {
        let pool = crate::db::test_pool().await;
        let studio_id = insert_studio(&pool, "Arethusa", None).await;
        let user_id = insert_user(&pool, "Dana Ellison", "dana@example.com").await;

        let stale = insert_pending_aged(&pool, &studio_id, &user_id, "09:00", 60).await;
        let fresh = insert_pending_aged(&pool, &studio_id, &user_id, "10:00", 5).await;

        let expiry = ReservationExpiry::new(pool.clone(), BookingConfig::default());
        let expired = expiry.run_sweep().await.unwrap();
        assert_eq!(expired, 1);

        let stale_status: (String,) = sqlx::query_as("SELECT status FROM reservations WHERE id = ?")
            .bind(&stale)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stale_status.0, "EXPIRED");

        let fresh_status: (String,) = sqlx::query_as("SELECT status FROM reservations WHERE id = ?")
            .bind(&fresh)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(fresh_status.0, "PENDING");
    }

    #[tokio::test]
    async fn test_sweep_leaves_confirmed_untouched() {
        let pool = crate::db::test_pool().await;
        let studio_id = insert_studio(&pool, "Arethusa", None).await;
        let user_id = insert_user(&pool, "Dana Ellison", "dana@example.com").await;

        let old = (Utc::now() - Duration::minutes(120)).to_rfc3339();
        sqlx::query(
            "INSERT INTO reservations \
             (id, date, start_time, end_time, studio_id, user_id, status, created_at, updated_at) \
             VALUES (?, '2025-06-02', '09:00', '10:00', ?, ?, 'CONFIRMED', ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&studio_id)
        .bind(&user_id)
        .bind(&old)
        .bind(&old)
        .execute(&pool)
        .await
        .unwrap();

        let expiry = ReservationExpiry::new(pool.clone(), BookingConfig::default());
        assert_eq!(expiry.run_sweep().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_expired_slot_becomes_bookable_again() {
        let pool = crate::db::test_pool().await;
        let studio_id = insert_studio(&pool, "Arethusa", None).await;
        let user_id = insert_user(&pool, "Dana Ellison", "dana@example.com").await;
        insert_pending_aged(&pool, &studio_id, &user_id, "09:00", 60).await;

        let expiry = ReservationExpiry::new(pool.clone(), BookingConfig::default());
        expiry.run_sweep().await.unwrap();

        use crate::engine::booking::{book, BookingRequest, NewBooking};
        book(
            &pool,
            BookingRequest::New(NewBooking {
                date: crate::engine::testutil::date(2025, 6, 2),
                start_time: "09:00".to_string(),
                end_time: "10:00".to_string(),
                studio_id,
                user_name: "Theo Marsh".to_string(),
                user_email: "theo@example.com".to_string(),
                user_phone: None,
            }),
        )
        .await
        .unwrap();
    }
}
