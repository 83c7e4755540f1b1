use sqlx::PgPool;

use crate::error::{Result, StorageError};
use crate::models::{Club, Tournament, TournamentId};

/// Repository for Tournament database operations
pub struct TournamentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TournamentRepository<'a> {
    /// Create a new TournamentRepository
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a tournament by ID, with its league name and season
    pub async fn find_by_id(&self, id: TournamentId) -> Result<Tournament> {
        let tournament = sqlx::query_as::<_, Tournament>(
            r#"
            SELECT t.tournament_id, t.league_id, t.name, l.name AS league_name,
                   l.season, t.created_at
            FROM tournaments t
            INNER JOIN leagues l ON l.league_id = t.league_id
            WHERE t.tournament_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(StorageError::classify)?
        .ok_or(StorageError::NotFound)?;

        Ok(tournament)
    }

    /// Clubs entered in the tournament: every club with a team in one of the
    /// league's categories, in a stable (name, id) order
    pub async fn participants(&self, id: TournamentId) -> Result<Vec<Club>> {
        let clubs = sqlx::query_as::<_, Club>(
            r#"
            SELECT DISTINCT c.club_id, c.name, c.crest_url, c.address, c.created_at
            FROM clubs c
            INNER JOIN teams tm ON tm.club_id = c.club_id
            INNER JOIN categories cat ON cat.category_id = tm.category_id
            INNER JOIN tournaments t ON t.league_id = cat.league_id
            WHERE t.tournament_id = $1
            ORDER BY c.name, c.club_id
            "#,
        )
        .bind(id)
        .fetch_all(self.pool)
        .await
        .map_err(StorageError::classify)?;

        Ok(clubs)
    }
}
