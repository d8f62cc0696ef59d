//! Availability engine.
//!
//! Computes, for one calendar day, which catalog slots still have a free
//! studio, and decorates free studios with deterministic presentation
//! metadata. Read-only: the booking engine re-validates before writing,
//! so a stale availability response can never cause a double booking.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use std::collections::{HashMap, HashSet};

use super::catalog::{AMENITIES, STUDIO_IMAGES, TIMESLOTS};
use super::EngineError;
use crate::db::{DbPool, Studio, StudioResponse};

/// A free studio decorated with presentation metadata.
///
/// The image, amenity, and capacity fields are deterministic placeholders
/// derived from the studio name and slot position. They stand in for a
/// real inventory system and never influence availability decisions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedStudio {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: String,
    pub amenities: Vec<String>,
    pub slots_available: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlot {
    pub start: &'static str,
    pub end: &'static str,
    pub label: &'static str,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_studios: Option<Vec<EnrichedStudio>>,
}

#[derive(Debug, Clone)]
pub struct Availability {
    pub slots: Vec<AvailabilitySlot>,
    pub studios: Vec<StudioResponse>,
}

#[derive(FromRow)]
struct OccupiedSlot {
    start_time: String,
    studio_id: String,
}

/// Compute per-slot availability for `date`.
///
/// Without a filter, each slot lists its free studios (enriched) and the
/// full studio set is returned alongside. With `studio_id`, only that
/// studio's per-slot booleans are computed and no enrichment is done.
pub async fn compute_availability(
    db: &DbPool,
    date: NaiveDate,
    studio_id: Option<&str>,
) -> Result<Availability, EngineError> {
    let day = date.format("%Y-%m-%d").to_string();

    let mut query = String::from(
        "SELECT start_time, studio_id FROM reservations \
         WHERE date = ? AND status IN ('PENDING', 'CONFIRMED')",
    );
    if studio_id.is_some() {
        query.push_str(" AND studio_id = ?");
    }

    let mut reservations = sqlx::query_as::<_, OccupiedSlot>(&query).bind(&day);
    if let Some(id) = studio_id {
        reservations = reservations.bind(id);
    }
    let reservations = reservations.fetch_all(db).await?;

    // Single-studio mode: per-slot booleans only
    if studio_id.is_some() {
        let booked: HashSet<&str> = reservations.iter().map(|r| r.start_time.as_str()).collect();
        let slots = TIMESLOTS
            .iter()
            .map(|slot| AvailabilitySlot {
                start: slot.start,
                end: slot.end,
                label: slot.label,
                available: !booked.contains(slot.start),
                available_studios: None,
            })
            .collect();

        return Ok(Availability {
            slots,
            studios: Vec::new(),
        });
    }

    // Insertion order keeps the free-studio index stable across calls
    let studios = sqlx::query_as::<_, Studio>("SELECT * FROM studios ORDER BY created_at, name")
        .fetch_all(db)
        .await?;

    let mut booked: HashMap<&str, HashSet<&str>> = HashMap::new();
    for r in &reservations {
        booked
            .entry(r.studio_id.as_str())
            .or_default()
            .insert(r.start_time.as_str());
    }

    let slots = TIMESLOTS
        .iter()
        .enumerate()
        .map(|(slot_index, slot)| {
            let free: Vec<EnrichedStudio> = studios
                .iter()
                .filter(|studio| {
                    booked
                        .get(studio.id.as_str())
                        .map_or(true, |taken| !taken.contains(slot.start))
                })
                .enumerate()
                .map(|(free_index, studio)| enrich(studio, slot_index, free_index))
                .collect();

            AvailabilitySlot {
                start: slot.start,
                end: slot.end,
                label: slot.label,
                available: !free.is_empty(),
                available_studios: Some(free),
            }
        })
        .collect();

    Ok(Availability {
        slots,
        studios: studios.into_iter().map(StudioResponse::from).collect(),
    })
}

/// Derive presentation metadata for a free studio.
///
/// Pure function of the studio name, the slot position, and the studio's
/// position within the slot's free list; identical inputs always yield
/// identical outputs.
fn enrich(studio: &Studio, slot_index: usize, free_index: usize) -> EnrichedStudio {
    let image_index = (studio.name.len() + slot_index) % STUDIO_IMAGES.len();
    let amenity_count = 2 + studio.name.len() % 3;
    let slots_available = 1 + (slot_index + free_index) % 5;

    EnrichedStudio {
        id: studio.id.clone(),
        name: studio.name.clone(),
        description: studio.description.clone(),
        image_url: STUDIO_IMAGES[image_index].to_string(),
        amenities: AMENITIES[..amenity_count]
            .iter()
            .map(|a| a.to_string())
            .collect(),
        slots_available: slots_available as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::{date, insert_reservation, insert_studio, insert_user};

    #[tokio::test]
    async fn test_empty_day_has_every_slot_free() {
        let pool = crate::db::test_pool().await;
        insert_studio(&pool, "Arethusa", Some("Standard Pilates Studio")).await;

        let availability = compute_availability(&pool, date(2025, 6, 2), None)
            .await
            .unwrap();

        assert_eq!(availability.slots.len(), TIMESLOTS.len());
        assert_eq!(availability.studios.len(), 1);
        assert!(availability.slots.iter().all(|s| s.available));
    }

    #[tokio::test]
    async fn test_enrichment_fields_for_known_studio() {
        let pool = crate::db::test_pool().await;
        insert_studio(&pool, "Arethusa", Some("Standard Pilates Studio")).await;

        let availability = compute_availability(&pool, date(2025, 6, 2), None)
            .await
            .unwrap();

        // "09:00 - 10:00" sits at catalog position 2; "Arethusa" has 8 chars
        let slot = &availability.slots[2];
        assert_eq!(slot.start, "09:00");
        assert!(slot.available);

        let free = slot.available_studios.as_ref().unwrap();
        let studio = &free[0];
        assert_eq!(studio.name, "Arethusa");
        // amenity_count = 2 + 8 % 3 = 4
        assert_eq!(studio.amenities, vec!["ac", "parking", "shower", "lockers"]);
        // image_index = (8 + 2) % 4 = 2
        assert_eq!(studio.image_url, STUDIO_IMAGES[2]);
        // slots_available = 1 + (2 + 0) % 5 = 3
        assert_eq!(studio.slots_available, 3);
    }

    #[tokio::test]
    async fn test_occupying_reservation_blocks_its_slot_only() {
        let pool = crate::db::test_pool().await;
        let studio_id = insert_studio(&pool, "Arethusa", None).await;
        let user_id = insert_user(&pool, "Dana Ellison", "dana@example.com").await;
        insert_reservation(
            &pool,
            "2025-06-02",
            "09:00",
            "10:00",
            &studio_id,
            &user_id,
            "CONFIRMED",
        )
        .await;

        let availability = compute_availability(&pool, date(2025, 6, 2), None)
            .await
            .unwrap();

        let booked_slot = &availability.slots[2];
        assert!(!booked_slot.available);
        assert!(booked_slot.available_studios.as_ref().unwrap().is_empty());

        for (i, slot) in availability.slots.iter().enumerate() {
            if i != 2 {
                assert!(slot.available, "slot {} should be free", slot.start);
            }
        }

        // A different day is unaffected
        let other_day = compute_availability(&pool, date(2025, 6, 3), None)
            .await
            .unwrap();
        assert!(other_day.slots.iter().all(|s| s.available));
    }

    #[tokio::test]
    async fn test_terminal_statuses_do_not_block() {
        let pool = crate::db::test_pool().await;
        let studio_id = insert_studio(&pool, "Arethusa", None).await;
        let user_id = insert_user(&pool, "Dana Ellison", "dana@example.com").await;
        insert_reservation(
            &pool,
            "2025-06-02",
            "09:00",
            "10:00",
            &studio_id,
            &user_id,
            "CANCELLED",
        )
        .await;
        insert_reservation(
            &pool,
            "2025-06-02",
            "10:00",
            "11:00",
            &studio_id,
            &user_id,
            "EXPIRED",
        )
        .await;

        let availability = compute_availability(&pool, date(2025, 6, 2), None)
            .await
            .unwrap();
        assert!(availability.slots.iter().all(|s| s.available));
    }

    #[tokio::test]
    async fn test_single_studio_mode_returns_booleans_only() {
        let pool = crate::db::test_pool().await;
        let arethusa = insert_studio(&pool, "Arethusa", None).await;
        let leander = insert_studio(&pool, "Leander", None).await;
        let user_id = insert_user(&pool, "Dana Ellison", "dana@example.com").await;
        insert_reservation(
            &pool,
            "2025-06-02",
            "09:00",
            "10:00",
            &arethusa,
            &user_id,
            "PENDING",
        )
        .await;
        insert_reservation(
            &pool,
            "2025-06-02",
            "14:00",
            "15:00",
            &leander,
            &user_id,
            "CONFIRMED",
        )
        .await;

        let availability = compute_availability(&pool, date(2025, 6, 2), Some(&arethusa))
            .await
            .unwrap();

        assert!(availability.studios.is_empty());
        for slot in &availability.slots {
            assert!(slot.available_studios.is_none());
            // Only Arethusa's own reservation counts against it
            assert_eq!(slot.available, slot.start != "09:00");
        }
    }

    #[tokio::test]
    async fn test_free_index_feeds_capacity_hint() {
        let pool = crate::db::test_pool().await;
        insert_studio(&pool, "Arethusa", None).await;
        insert_studio(&pool, "Leander", None).await;

        let availability = compute_availability(&pool, date(2025, 6, 2), None)
            .await
            .unwrap();

        let free = availability.slots[0].available_studios.as_ref().unwrap();
        assert_eq!(free.len(), 2);
        // slot_index 0: first studio 1 + 0 % 5, second 1 + 1 % 5
        assert_eq!(free[0].slots_available, 1);
        assert_eq!(free[1].slots_available, 2);
    }

    #[tokio::test]
    async fn test_enrichment_is_deterministic() {
        let pool = crate::db::test_pool().await;
        insert_studio(&pool, "Arethusa", Some("Standard Pilates Studio")).await;
        insert_studio(&pool, "Leander", Some("Premium Suite with Garden View")).await;
        insert_studio(&pool, "Galatea", Some("Private Couple's Studio")).await;

        let first = compute_availability(&pool, date(2025, 6, 2), None)
            .await
            .unwrap();
        let second = compute_availability(&pool, date(2025, 6, 2), None)
            .await
            .unwrap();

        assert_eq!(first.slots, second.slots);
        assert_eq!(first.studios, second.studios);
    }
}
