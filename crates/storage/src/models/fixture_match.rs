use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::club::ClubId;

/// One pass of the double round-robin. Stored as `SMALLINT` 1 / 2.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
    sqlx::Type,
)]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum Leg {
    First = 1,
    Second = 2,
}

impl Leg {
    pub const ALL: [Leg; 2] = [Leg::First, Leg::Second];

    pub fn label(self) -> &'static str {
        match self {
            Leg::First => "First leg",
            Leg::Second => "Second leg (return)",
        }
    }
}

/// A scheduled match as persisted in `fixture_matches`.
///
/// Pairing fields are written once at generation time. `played`, the scores
/// and `scheduled_at` belong to result entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FixtureMatch {
    pub fixture_match_id: Uuid,
    pub tournament_id: Uuid,
    pub leg: Leg,
    pub matchday: i16,
    /// Position of the pairing within its matchday
    pub slot: i16,
    pub home_club_id: Uuid,
    pub away_club_id: Uuid,
    pub played: bool,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: chrono::NaiveDateTime,
}

/// A generated pairing that has not been written yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NewFixtureMatch {
    pub leg: Leg,
    pub matchday: i16,
    pub slot: i16,
    pub home_club_id: ClubId,
    pub away_club_id: ClubId,
}

/// Fixture row joined with the club names, used by the fixture view.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FixtureMatchDetail {
    pub fixture_match_id: Uuid,
    pub leg: Leg,
    pub matchday: i16,
    pub slot: i16,
    pub home_club_id: Uuid,
    pub home_club_name: String,
    pub away_club_id: Uuid,
    pub away_club_name: String,
    pub played: bool,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub scheduled_at: Option<DateTime<Utc>>,
}
