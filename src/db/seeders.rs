//! Database seeders for built-in data
//!
//! Seeds the studio catalog on startup. Studios are created out-of-band
//! from the booking flow; re-running updates descriptions in place.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

/// Seed the studio catalog (runs on every startup to add/update studios)
pub async fn seed_studios(pool: &SqlitePool) -> Result<()> {
    info!("Seeding studio catalog...");

    // Format: (name, description)
    let studios: Vec<(&str, &str)> = vec![
        ("Arethusa", "Standard Pilates Studio"),
        ("Leander", "Premium Suite with Garden View"),
        ("Galatea", "Private Couple's Studio"),
    ];

    for (name, description) in studios {
        let now = chrono::Utc::now().to_rfc3339();

        // Upsert by name so existing studios keep their id (reservations
        // reference it)
        sqlx::query(
            r#"
            INSERT INTO studios (id, name, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                description = excluded.description,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(description)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;
    }

    info!("Studio catalog seeded");
    Ok(())
}
