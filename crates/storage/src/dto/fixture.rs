use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Club, FixtureMatch, FixtureMatchDetail, Leg, Tournament};

/// Request payload for generating a tournament fixture.
///
/// Without `participant_ids` the clubs entered in the tournament's league are
/// used, ordered by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct GenerateFixtureRequest {
    #[validate(length(max = 512, message = "At most 512 participants are supported"))]
    pub participant_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GenerationOutcome {
    Created,
    AlreadyExists,
}

/// Response of a generation request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateFixtureResponse {
    pub outcome: GenerationOutcome,
    pub message: String,
    pub matches: Vec<FixtureMatch>,
}

impl GenerateFixtureResponse {
    pub fn created(matches: Vec<FixtureMatch>) -> Self {
        Self {
            outcome: GenerationOutcome::Created,
            message: format!("Fixture generated with {} matches", matches.len()),
            matches,
        }
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self {
            outcome: GenerationOutcome::AlreadyExists,
            message: message.into(),
            matches: Vec::new(),
        }
    }
}

/// Request payload for recording a match result
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RecordResultRequest {
    #[validate(range(min = 0, max = 999, message = "Score must be between 0 and 999"))]
    pub home_score: Option<i32>,

    #[validate(range(min = 0, max = 999, message = "Score must be between 0 and 999"))]
    pub away_score: Option<i32>,

    #[serde(default = "default_played")]
    pub played: bool,

    pub scheduled_at: Option<DateTime<Utc>>,
}

fn default_played() -> bool {
    true
}

impl RecordResultRequest {
    /// Additional validation that requires multiple fields
    pub fn validate_scores(&self) -> Result<(), &'static str> {
        match (self.home_score, self.away_score) {
            (Some(_), None) | (None, Some(_)) => Err("Both scores must be given together"),
            (None, None) if self.played => Err("A played match needs both scores"),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ClubSummary {
    pub club_id: Uuid,
    pub name: String,
}

impl From<&Club> for ClubSummary {
    fn from(club: &Club) -> Self {
        Self {
            club_id: club.club_id,
            name: club.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MatchdayFixture {
    pub number: i16,
    pub matches: Vec<FixtureMatchDetail>,
    /// Participants without a match on this matchday
    pub resting: Vec<ClubSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LegFixture {
    pub leg: Leg,
    pub label: String,
    pub matchdays: Vec<MatchdayFixture>,
}

/// Fixture of a tournament grouped by leg and matchday
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FixtureView {
    pub tournament: Tournament,
    pub fixture_exists: bool,
    pub participant_count: usize,
    pub participants: Vec<ClubSummary>,
    pub legs: Vec<LegFixture>,
}

impl FixtureView {
    /// Group `matches` (already in generation order) by leg and matchday.
    ///
    /// Once a fixture exists its participants are the clubs that appear in
    /// it. `candidates` (the league's clubs) are listed only while nothing has
    /// been generated.
    pub fn assemble(
        tournament: Tournament,
        candidates: &[Club],
        matches: Vec<FixtureMatchDetail>,
    ) -> Self {
        let fixture_exists = !matches.is_empty();
        let participants = if fixture_exists {
            scheduled_clubs(&matches)
        } else {
            candidates.iter().map(ClubSummary::from).collect()
        };

        let mut grouped: BTreeMap<Leg, BTreeMap<i16, Vec<FixtureMatchDetail>>> = Leg::ALL
            .into_iter()
            .map(|leg| (leg, BTreeMap::new()))
            .collect();
        for m in matches {
            grouped
                .entry(m.leg)
                .or_default()
                .entry(m.matchday)
                .or_default()
                .push(m);
        }

        let legs = grouped
            .into_iter()
            .map(|(leg, matchdays)| LegFixture {
                leg,
                label: leg.label().to_string(),
                matchdays: matchdays
                    .into_iter()
                    .map(|(number, matches)| {
                        let playing: HashSet<Uuid> = matches
                            .iter()
                            .flat_map(|m| [m.home_club_id, m.away_club_id])
                            .collect();
                        let resting = participants
                            .iter()
                            .filter(|club| !playing.contains(&club.club_id))
                            .cloned()
                            .collect();
                        MatchdayFixture {
                            number,
                            matches,
                            resting,
                        }
                    })
                    .collect(),
            })
            .collect();

        Self {
            tournament,
            fixture_exists,
            participant_count: participants.len(),
            participants,
            legs,
        }
    }
}

/// Distinct clubs of a stored fixture, ordered by name then id.
fn scheduled_clubs(matches: &[FixtureMatchDetail]) -> Vec<ClubSummary> {
    let mut seen = HashSet::new();
    let mut clubs: Vec<ClubSummary> = matches
        .iter()
        .flat_map(|m| {
            [
                (m.home_club_id, &m.home_club_name),
                (m.away_club_id, &m.away_club_name),
            ]
        })
        .filter(|(club_id, _)| seen.insert(*club_id))
        .map(|(club_id, name)| ClubSummary {
            club_id,
            name: name.clone(),
        })
        .collect();
    clubs.sort_by(|a, b| a.name.cmp(&b.name).then(a.club_id.cmp(&b.club_id)));
    clubs
}
