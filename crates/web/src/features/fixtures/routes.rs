use axum::{
    Router,
    routing::{get, put},
};

use super::handlers::{generate_fixture, get_fixture, record_result};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:tournament_id/fixture", get(get_fixture).post(generate_fixture))
        .route(
            "/:tournament_id/fixture/:fixture_match_id/result",
            put(record_result),
        )
}
