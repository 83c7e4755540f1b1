use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

pub type TournamentId = Uuid;

/// A tournament (e.g. "Apertura") played inside a league season.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Tournament {
    pub tournament_id: Uuid,
    pub league_id: Uuid,
    pub name: String,
    pub league_name: String,
    pub season: String,
    pub created_at: chrono::NaiveDateTime,
}
