//! Studio models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Studio {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Studio as exposed on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<Studio> for StudioResponse {
    fn from(studio: Studio) -> Self {
        Self {
            id: studio.id,
            name: studio.name,
            description: studio.description,
        }
    }
}
