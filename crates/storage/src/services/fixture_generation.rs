use std::collections::HashSet;
use std::num::TryFromIntError;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{FixtureError, Result};
use crate::models::{ClubId, FixtureMatch, NewFixtureMatch, TournamentId};
use crate::services::pairing::{HomeAwayPolicy, Schedule, compute_schedule};

/// Storage seam for fixture generation.
#[async_trait]
pub trait FixtureStore: Send + Sync {
    /// Subset of `ids` that exist as persisted clubs.
    async fn saved_participants(&self, ids: &[ClubId]) -> Result<HashSet<ClubId>>;

    async fn has_existing_schedule(&self, tournament_id: TournamentId) -> Result<bool>;

    /// Write every match or none of them.
    async fn save_all(
        &self,
        tournament_id: TournamentId,
        matches: &[NewFixtureMatch],
    ) -> Result<Vec<FixtureMatch>>;
}

pub struct FixtureGenerator<S> {
    store: S,
    policy: HomeAwayPolicy,
}

impl<S: FixtureStore> FixtureGenerator<S> {
    pub fn new(store: S, policy: HomeAwayPolicy) -> Self {
        Self { store, policy }
    }

    /// Generate and persist the home-and-away fixture of a tournament.
    ///
    /// Returns the created matches in generation order (first leg by
    /// matchday, then second leg, pairing order inside a matchday).
    pub async fn generate(
        &self,
        tournament_id: TournamentId,
        participants: &[ClubId],
    ) -> std::result::Result<Vec<FixtureMatch>, FixtureError> {
        let saved = self.store.saved_participants(participants).await?;
        let participants = normalize_participants(participants, &saved);

        if participants.len() < 2 {
            return Err(FixtureError::NotEnoughParticipants {
                found: participants.len(),
            });
        }

        if self.store.has_existing_schedule(tournament_id).await? {
            warn!(%tournament_id, "Fixture already exists, skipping generation");
            return Err(FixtureError::AlreadyExists);
        }

        let schedule = compute_schedule(&participants, self.policy)?;
        let rows = schedule_rows(&schedule).map_err(|_| FixtureError::TooManyParticipants {
            found: participants.len(),
        })?;

        let created = self.store.save_all(tournament_id, &rows).await?;

        info!(
            %tournament_id,
            participants = participants.len(),
            matchdays_per_leg = schedule.matchdays_per_leg(),
            matches = created.len(),
            "Fixture generated"
        );

        Ok(created)
    }
}

/// Drop unsaved ids and duplicates; the first occurrence keeps its position.
pub fn normalize_participants(ids: &[ClubId], saved: &HashSet<ClubId>) -> Vec<ClubId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .copied()
        .filter(|id| saved.contains(id) && seen.insert(*id))
        .collect()
}

/// Flatten a schedule into rows; matchday and slot must fit `SMALLINT`.
fn schedule_rows(
    schedule: &Schedule<ClubId>,
) -> std::result::Result<Vec<NewFixtureMatch>, TryFromIntError> {
    schedule
        .iter()
        .map(|(leg, matchday, slot, pairing)| {
            Ok(NewFixtureMatch {
                leg,
                matchday: i16::try_from(matchday.number)?,
                slot: i16::try_from(slot)?,
                home_club_id: pairing.home,
                away_club_id: pairing.away,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::models::Leg;
    use crate::services::pairing::{Matchday, Pairing};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    /// In-memory stand-in for `fixture_matches` with the same uniqueness rule.
    #[derive(Clone, Default)]
    struct MemoryStore {
        clubs: HashSet<ClubId>,
        rows: Arc<Mutex<Vec<FixtureMatch>>>,
        fail_at_row: Option<usize>,
        schema_missing: bool,
        yield_after_check: bool,
    }

    impl MemoryStore {
        fn with_clubs(clubs: &[ClubId]) -> Self {
            Self {
                clubs: clubs.iter().copied().collect(),
                ..Self::default()
            }
        }

        fn rows_for(&self, tournament_id: TournamentId) -> Vec<FixtureMatch> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.tournament_id == tournament_id)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl FixtureStore for MemoryStore {
        async fn saved_participants(&self, ids: &[ClubId]) -> Result<HashSet<ClubId>> {
            if self.schema_missing {
                return Err(StorageError::UndefinedTable(
                    "relation \"clubs\" does not exist".to_string(),
                ));
            }
            Ok(ids.iter().copied().filter(|id| self.clubs.contains(id)).collect())
        }

        async fn has_existing_schedule(&self, tournament_id: TournamentId) -> Result<bool> {
            let exists = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .any(|m| m.tournament_id == tournament_id);
            if self.yield_after_check {
                tokio::task::yield_now().await;
            }
            Ok(exists)
        }

        async fn save_all(
            &self,
            tournament_id: TournamentId,
            matches: &[NewFixtureMatch],
        ) -> Result<Vec<FixtureMatch>> {
            let mut rows = self.rows.lock().unwrap();
            let mut staged: Vec<FixtureMatch> = Vec::with_capacity(matches.len());

            for (i, m) in matches.iter().enumerate() {
                if self.fail_at_row == Some(i) {
                    return Err(StorageError::Database(sqlx::Error::PoolTimedOut));
                }
                let duplicate = rows.iter().chain(staged.iter()).any(|r| {
                    r.tournament_id == tournament_id
                        && r.leg == m.leg
                        && r.matchday == m.matchday
                        && r.home_club_id == m.home_club_id
                        && r.away_club_id == m.away_club_id
                });
                if duplicate {
                    return Err(StorageError::ConstraintViolation(
                        "duplicate key value violates unique constraint \"uq_fixture_match\""
                            .to_string(),
                    ));
                }
                staged.push(FixtureMatch {
                    fixture_match_id: Uuid::new_v4(),
                    tournament_id,
                    leg: m.leg,
                    matchday: m.matchday,
                    slot: m.slot,
                    home_club_id: m.home_club_id,
                    away_club_id: m.away_club_id,
                    played: false,
                    home_score: None,
                    away_score: None,
                    scheduled_at: None,
                    created_at: chrono::Utc::now().naive_utc(),
                });
            }

            rows.extend(staged.iter().cloned());
            Ok(staged)
        }
    }

    fn clubs(n: usize) -> Vec<ClubId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn generator(store: &MemoryStore) -> FixtureGenerator<MemoryStore> {
        FixtureGenerator::new(store.clone(), HomeAwayPolicy::Parity)
    }

    #[tokio::test]
    async fn test_generate_fixture_even_clubs() {
        let ids = clubs(4);
        let store = MemoryStore::with_clubs(&ids);
        let tournament = Uuid::new_v4();

        let created = generator(&store).generate(tournament, &ids).await.unwrap();
        assert_eq!(created.len(), 12);

        let stored = store.rows_for(tournament);
        assert_eq!(stored.len(), 12);
        assert_eq!(stored.iter().filter(|m| m.leg == Leg::First).count(), 6);
        assert_eq!(stored.iter().filter(|m| m.leg == Leg::Second).count(), 6);
        assert!(stored.iter().all(|m| m.matchday >= 1 && m.matchday <= 3));
        assert!(stored.iter().all(|m| {
            !m.played && m.home_score.is_none() && m.away_score.is_none() && m.scheduled_at.is_none()
        }));

        let mut by_pair: HashMap<(ClubId, ClubId), Vec<&FixtureMatch>> = HashMap::new();
        for m in &stored {
            let key = if m.home_club_id < m.away_club_id {
                (m.home_club_id, m.away_club_id)
            } else {
                (m.away_club_id, m.home_club_id)
            };
            by_pair.entry(key).or_default().push(m);
        }
        assert_eq!(by_pair.len(), 6);
        for matches in by_pair.values() {
            assert_eq!(matches.len(), 2);
            let legs: HashSet<Leg> = matches.iter().map(|m| m.leg).collect();
            assert_eq!(legs.len(), 2);
            assert_ne!(matches[0].home_club_id, matches[1].home_club_id);
        }

        let mut home: HashMap<ClubId, usize> = HashMap::new();
        let mut away: HashMap<ClubId, usize> = HashMap::new();
        for m in &stored {
            *home.entry(m.home_club_id).or_default() += 1;
            *away.entry(m.away_club_id).or_default() += 1;
        }
        for id in &ids {
            assert_eq!(home[id], away[id]);
        }
    }

    #[tokio::test]
    async fn test_scenario_a_pairings_in_generation_order() {
        let ids = clubs(4);
        let (a, b, c, d) = (ids[0], ids[1], ids[2], ids[3]);
        let store = MemoryStore::with_clubs(&ids);

        let created = generator(&store)
            .generate(Uuid::new_v4(), &ids)
            .await
            .unwrap();

        let first_leg: Vec<(i16, ClubId, ClubId)> = created
            .iter()
            .filter(|m| m.leg == Leg::First)
            .map(|m| (m.matchday, m.home_club_id, m.away_club_id))
            .collect();
        assert_eq!(
            first_leg,
            vec![(1, a, d), (1, b, c), (2, c, a), (2, b, d), (3, a, b), (3, c, d)]
        );

        let order: Vec<(Leg, i16, i16)> = created.iter().map(|m| (m.leg, m.matchday, m.slot)).collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
    }

    #[tokio::test]
    async fn test_generate_fixture_odd_clubs() {
        let ids = clubs(5);
        let store = MemoryStore::with_clubs(&ids);
        let tournament = Uuid::new_v4();

        generator(&store).generate(tournament, &ids).await.unwrap();

        let stored = store.rows_for(tournament);
        assert_eq!(stored.len(), 20);

        for leg in Leg::ALL {
            let mut rests: HashMap<ClubId, usize> = HashMap::new();
            for matchday in 1..=5 {
                let playing: HashSet<ClubId> = stored
                    .iter()
                    .filter(|m| m.leg == leg && m.matchday == matchday)
                    .flat_map(|m| [m.home_club_id, m.away_club_id])
                    .collect();
                assert_eq!(playing.len(), 4);
                let free: Vec<&ClubId> = ids.iter().filter(|id| !playing.contains(id)).collect();
                assert_eq!(free.len(), 1);
                *rests.entry(*free[0]).or_default() += 1;
            }
            assert_eq!(rests.len(), 5);
            assert!(rests.values().all(|&n| n == 1));
        }
    }

    #[tokio::test]
    async fn test_second_generation_is_rejected_and_changes_nothing() {
        let ids = clubs(4);
        let store = MemoryStore::with_clubs(&ids);
        let tournament = Uuid::new_v4();
        let generator = generator(&store);

        generator.generate(tournament, &ids).await.unwrap();
        let before = store.rows_for(tournament);

        let err = generator.generate(tournament, &ids).await.unwrap_err();
        assert!(matches!(err, FixtureError::AlreadyExists));
        assert!(!err.is_generation_error());
        assert_eq!(store.rows_for(tournament), before);
    }

    #[tokio::test]
    async fn test_fewer_than_two_participants_writes_nothing() {
        let ids = clubs(1);
        let store = MemoryStore::with_clubs(&ids);
        let tournament = Uuid::new_v4();

        for input in [vec![], ids.clone(), vec![ids[0], ids[0]]] {
            let err = generator(&store).generate(tournament, &input).await.unwrap_err();
            assert!(err.is_generation_error());
        }
        assert!(store.rows_for(tournament).is_empty());
    }

    #[tokio::test]
    async fn test_unsaved_participants_are_dropped_before_validation() {
        let ids = clubs(2);
        let store = MemoryStore::with_clubs(&ids[..1]);

        let err = generator(&store)
            .generate(Uuid::new_v4(), &ids)
            .await
            .unwrap_err();
        assert!(matches!(err, FixtureError::NotEnoughParticipants { found: 1 }));
    }

    #[tokio::test]
    async fn test_missing_schema_becomes_generation_error() {
        let ids = clubs(4);
        let store = MemoryStore {
            schema_missing: true,
            ..MemoryStore::with_clubs(&ids)
        };

        let err = generator(&store)
            .generate(Uuid::new_v4(), &ids)
            .await
            .unwrap_err();
        assert!(matches!(err, FixtureError::SchemaNotReady));
        assert!(err.to_string().contains("migrations"));
    }

    #[tokio::test]
    async fn test_mid_batch_failure_leaves_no_rows() {
        let ids = clubs(6);
        let store = MemoryStore {
            fail_at_row: Some(17),
            ..MemoryStore::with_clubs(&ids)
        };
        let tournament = Uuid::new_v4();

        let err = generator(&store).generate(tournament, &ids).await.unwrap_err();
        assert!(matches!(err, FixtureError::Storage(StorageError::Database(_))));
        assert!(store.rows_for(tournament).is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_generations_produce_one_schedule() {
        let ids = clubs(4);
        let store = MemoryStore {
            yield_after_check: true,
            ..MemoryStore::with_clubs(&ids)
        };
        let tournament = Uuid::new_v4();
        let first = generator(&store);
        let second = generator(&store);

        let (a, b) = tokio::join!(
            first.generate(tournament, &ids),
            second.generate(tournament, &ids)
        );

        assert!(a.is_ok() != b.is_ok());
        let loser = a.err().or(b.err()).unwrap();
        assert!(matches!(
            loser,
            FixtureError::Storage(StorageError::ConstraintViolation(_)) | FixtureError::AlreadyExists
        ));
        assert_eq!(store.rows_for(tournament).len(), 12);
    }

    #[tokio::test]
    async fn test_identical_input_gives_identical_schedule() {
        let ids = clubs(7);
        let store = MemoryStore::with_clubs(&ids);
        let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());
        let generator = generator(&store);

        let strip = |rows: Vec<FixtureMatch>| -> Vec<(Leg, i16, i16, ClubId, ClubId)> {
            rows.into_iter()
                .map(|m| (m.leg, m.matchday, m.slot, m.home_club_id, m.away_club_id))
                .collect()
        };

        let one = strip(generator.generate(t1, &ids).await.unwrap());
        let two = strip(generator.generate(t2, &ids).await.unwrap());
        assert_eq!(one, two);
        assert_eq!(one.len(), 42);
    }

    #[test]
    fn test_schedule_rows_reject_matchdays_beyond_smallint() {
        let ids = clubs(2);
        let matchday = |number| Matchday {
            number,
            pairings: vec![Pairing {
                home: ids[0],
                away: ids[1],
            }],
            resting: None,
        };

        let fits = Schedule {
            first_leg: vec![matchday(i16::MAX as usize)],
            second_leg: Vec::new(),
        };
        assert_eq!(schedule_rows(&fits).unwrap()[0].matchday, i16::MAX);

        let overflows = Schedule {
            first_leg: vec![matchday(i16::MAX as usize + 1)],
            second_leg: Vec::new(),
        };
        assert!(schedule_rows(&overflows).is_err());
    }

    #[test]
    fn test_too_many_participants_is_a_generation_error() {
        let err = FixtureError::TooManyParticipants { found: 40_000 };
        assert!(err.is_generation_error());
        assert!(err.to_string().contains("40000"));
    }

    #[test]
    fn test_normalize_keeps_first_occurrence_order() {
        let ids = clubs(4);
        let saved: HashSet<ClubId> = ids[..3].iter().copied().collect();
        let input = vec![ids[2], ids[0], ids[3], ids[2], ids[1], ids[0]];

        assert_eq!(
            normalize_participants(&input, &saved),
            vec![ids[2], ids[0], ids[1]]
        );
    }
}
