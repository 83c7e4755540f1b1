use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

pub type ClubId = Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Club {
    pub club_id: Uuid,
    pub name: String,
    pub crest_url: Option<String>,
    pub address: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}
