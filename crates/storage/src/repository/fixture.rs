use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::fixture::RecordResultRequest;
use crate::error::{Result, StorageError};
use crate::models::{ClubId, FixtureMatch, FixtureMatchDetail, NewFixtureMatch, TournamentId};
use crate::services::fixture_generation::FixtureStore;

const FIXTURE_COLUMNS: &str = r#"
    fixture_match_id, tournament_id, leg, matchday, slot, home_club_id, away_club_id,
    played, home_score, away_score, scheduled_at, created_at
"#;

/// Repository for fixture match database operations
pub struct FixtureRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FixtureRepository<'a> {
    /// Create a new FixtureRepository
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a tournament's matches in generation order
    pub async fn list_by_tournament(&self, tournament_id: TournamentId) -> Result<Vec<FixtureMatch>> {
        let query = format!(
            "SELECT {FIXTURE_COLUMNS} FROM fixture_matches
             WHERE tournament_id = $1
             ORDER BY leg, matchday, slot"
        );

        let matches = sqlx::query_as::<_, FixtureMatch>(&query)
            .bind(tournament_id)
            .fetch_all(self.pool)
            .await
            .map_err(StorageError::classify)?;

        Ok(matches)
    }

    /// List a tournament's matches with club names, in generation order
    pub async fn list_detailed(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<FixtureMatchDetail>> {
        let matches = sqlx::query_as::<_, FixtureMatchDetail>(
            r#"
            SELECT fm.fixture_match_id, fm.leg, fm.matchday, fm.slot,
                   fm.home_club_id, home.name AS home_club_name,
                   fm.away_club_id, away.name AS away_club_name,
                   fm.played, fm.home_score, fm.away_score, fm.scheduled_at
            FROM fixture_matches fm
            INNER JOIN clubs home ON home.club_id = fm.home_club_id
            INNER JOIN clubs away ON away.club_id = fm.away_club_id
            WHERE fm.tournament_id = $1
            ORDER BY fm.leg, fm.matchday, fm.slot
            "#,
        )
        .bind(tournament_id)
        .fetch_all(self.pool)
        .await
        .map_err(StorageError::classify)?;

        Ok(matches)
    }

    /// Record the outcome of one match. Pairing columns are never touched.
    pub async fn record_result(
        &self,
        tournament_id: TournamentId,
        fixture_match_id: Uuid,
        req: &RecordResultRequest,
    ) -> Result<FixtureMatch> {
        let query = format!(
            "UPDATE fixture_matches
             SET home_score = $3,
                 away_score = $4,
                 played = $5,
                 scheduled_at = COALESCE($6, scheduled_at)
             WHERE tournament_id = $1 AND fixture_match_id = $2
             RETURNING {FIXTURE_COLUMNS}"
        );

        let updated = sqlx::query_as::<_, FixtureMatch>(&query)
            .bind(tournament_id)
            .bind(fixture_match_id)
            .bind(req.home_score)
            .bind(req.away_score)
            .bind(req.played)
            .bind(req.scheduled_at)
            .fetch_optional(self.pool)
            .await
            .map_err(StorageError::classify)?
            .ok_or(StorageError::NotFound)?;

        Ok(updated)
    }
}

#[async_trait]
impl FixtureStore for FixtureRepository<'_> {
    async fn saved_participants(&self, ids: &[ClubId]) -> Result<HashSet<ClubId>> {
        let found: Vec<ClubId> =
            sqlx::query_scalar("SELECT club_id FROM clubs WHERE club_id = ANY($1)")
                .bind(ids)
                .fetch_all(self.pool)
                .await
                .map_err(StorageError::classify)?;

        Ok(found.into_iter().collect())
    }

    async fn has_existing_schedule(&self, tournament_id: TournamentId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM fixture_matches WHERE tournament_id = $1)",
        )
        .bind(tournament_id)
        .fetch_one(self.pool)
        .await
        .map_err(StorageError::classify)?;

        Ok(exists)
    }

    async fn save_all(
        &self,
        tournament_id: TournamentId,
        matches: &[NewFixtureMatch],
    ) -> Result<Vec<FixtureMatch>> {
        // Dropping `tx` on any early return rolls everything back.
        let mut tx = self.pool.begin().await.map_err(StorageError::classify)?;

        // Serializes concurrent generations for the same tournament.
        let locked: Option<TournamentId> = sqlx::query_scalar(
            "SELECT tournament_id FROM tournaments WHERE tournament_id = $1 FOR UPDATE",
        )
        .bind(tournament_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(StorageError::classify)?;

        if locked.is_none() {
            return Err(StorageError::NotFound);
        }

        let already: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM fixture_matches WHERE tournament_id = $1)",
        )
        .bind(tournament_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(StorageError::classify)?;

        if already {
            return Err(StorageError::ConstraintViolation(
                "A fixture was generated concurrently for this tournament".to_string(),
            ));
        }

        let insert = format!(
            "INSERT INTO fixture_matches (
                tournament_id, leg, matchday, slot, home_club_id, away_club_id
             )
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {FIXTURE_COLUMNS}"
        );

        let mut created = Vec::with_capacity(matches.len());
        for m in matches {
            let row = sqlx::query_as::<_, FixtureMatch>(&insert)
                .bind(tournament_id)
                .bind(m.leg)
                .bind(m.matchday)
                .bind(m.slot)
                .bind(m.home_club_id)
                .bind(m.away_club_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(StorageError::classify)?;
            created.push(row);
        }

        tx.commit().await.map_err(StorageError::classify)?;

        Ok(created)
    }
}
