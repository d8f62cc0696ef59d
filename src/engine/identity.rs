//! Identity upsert.
//!
//! Resolves a requester to a durable user record keyed by email.

use sqlx::Sqlite;
use uuid::Uuid;

use super::EngineError;
use crate::db::User;

/// Create or update the user identified by `email`.
///
/// Last-write-wins: an existing user's name and phone are overwritten
/// with the supplied values, so an absent phone clears any stored one.
/// The row id and created_at survive updates, keeping the email-to-user
/// mapping stable. Generic over the executor so it can join the booking
/// transaction.
pub async fn upsert_user<'e, E>(
    executor: E,
    name: &str,
    email: &str,
    phone: Option<&str>,
) -> Result<User, EngineError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let now = chrono::Utc::now().to_rfc3339();

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, email, phone, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(email) DO UPDATE SET
            name = excluded.name,
            phone = excluded.phone,
            updated_at = excluded.updated_at
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name)
    .bind(email)
    .bind(phone)
    .bind(&now)
    .bind(&now)
    .fetch_one(executor)
    .await?;

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_creates_user_on_first_sight() {
        let pool = crate::db::test_pool().await;

        let user = upsert_user(&pool, "Dana Ellison", "dana@example.com", Some("555-0101"))
            .await
            .unwrap();
        assert_eq!(user.name, "Dana Ellison");
        assert_eq!(user.email, "dana@example.com");
        assert_eq!(user.phone.as_deref(), Some("555-0101"));
    }

    #[tokio::test]
    async fn test_same_email_never_duplicates() {
        let pool = crate::db::test_pool().await;

        let first = upsert_user(&pool, "Dana Ellison", "dana@example.com", Some("555-0101"))
            .await
            .unwrap();
        let second = upsert_user(&pool, "Dana E.", "dana@example.com", Some("555-0202"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Dana E.");
        assert_eq!(second.phone.as_deref(), Some("555-0202"));

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind("dana@example.com")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_absent_phone_clears_stored_phone() {
        let pool = crate::db::test_pool().await;

        upsert_user(&pool, "Dana Ellison", "dana@example.com", Some("555-0101"))
            .await
            .unwrap();
        let updated = upsert_user(&pool, "Dana Ellison", "dana@example.com", None)
            .await
            .unwrap();

        assert_eq!(updated.phone, None);
    }
}
