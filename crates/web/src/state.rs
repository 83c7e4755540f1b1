use axum::extract::FromRef;
use storage::Database;
use storage::services::pairing::HomeAwayPolicy;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub home_away_policy: HomeAwayPolicy,
}

impl FromRef<AppState> for Database {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for HomeAwayPolicy {
    fn from_ref(state: &AppState) -> Self {
        state.home_away_policy
    }
}
