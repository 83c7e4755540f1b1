use sqlx::PgPool;
use storage::{
    dto::fixture::{FixtureView, GenerateFixtureRequest, RecordResultRequest},
    error::{FixtureError, Result},
    models::{ClubId, FixtureMatch, TournamentId},
    repository::{fixture::FixtureRepository, tournament::TournamentRepository},
    services::{fixture_generation::FixtureGenerator, pairing::HomeAwayPolicy},
};
use uuid::Uuid;

/// Get a tournament's fixture grouped by leg and matchday
pub async fn get_fixture(pool: &PgPool, tournament_id: TournamentId) -> Result<FixtureView> {
    let tournaments = TournamentRepository::new(pool);
    let tournament = tournaments.find_by_id(tournament_id).await?;
    let participants = tournaments.participants(tournament_id).await?;
    let matches = FixtureRepository::new(pool)
        .list_detailed(tournament_id)
        .await?;

    Ok(FixtureView::assemble(tournament, &participants, matches))
}

/// Generate the fixture, resolving participants from the league when the
/// request does not list them
pub async fn generate_fixture(
    pool: &PgPool,
    tournament_id: TournamentId,
    request: &GenerateFixtureRequest,
    policy: HomeAwayPolicy,
) -> std::result::Result<Vec<FixtureMatch>, FixtureError> {
    let tournaments = TournamentRepository::new(pool);
    tournaments.find_by_id(tournament_id).await?;

    let participants: Vec<ClubId> = match &request.participant_ids {
        Some(ids) => ids.clone(),
        None => tournaments
            .participants(tournament_id)
            .await?
            .into_iter()
            .map(|club| club.club_id)
            .collect(),
    };

    let generator = FixtureGenerator::new(FixtureRepository::new(pool), policy);
    generator.generate(tournament_id, &participants).await
}

/// Record a match result
pub async fn record_result(
    pool: &PgPool,
    tournament_id: TournamentId,
    fixture_match_id: Uuid,
    request: &RecordResultRequest,
) -> Result<FixtureMatch> {
    FixtureRepository::new(pool)
        .record_result(tournament_id, fixture_match_id, request)
        .await
}
