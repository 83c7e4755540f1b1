use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use storage::{
    Database,
    dto::fixture::{FixtureView, GenerateFixtureRequest, GenerateFixtureResponse, RecordResultRequest},
    error::FixtureError,
    models::FixtureMatch,
    services::pairing::HomeAwayPolicy,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    get,
    path = "/api/tournaments/{tournament_id}/fixture",
    params(
        ("tournament_id" = Uuid, Path, description = "Tournament ID")
    ),
    responses(
        (status = 200, description = "Fixture grouped by leg and matchday, with resting clubs", body = FixtureView),
        (status = 404, description = "Tournament not found")
    ),
    tag = "fixtures"
)]
pub async fn get_fixture(
    State(db): State<Database>,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<FixtureView>, WebError> {
    let fixture = services::get_fixture(db.pool(), tournament_id).await?;

    Ok(Json(fixture))
}

#[utoipa::path(
    post,
    path = "/api/tournaments/{tournament_id}/fixture",
    params(
        ("tournament_id" = Uuid, Path, description = "Tournament ID")
    ),
    request_body(content = GenerateFixtureRequest, description = "Optional ordered participant list. An empty body uses the league's clubs"),
    responses(
        (status = 201, description = "Fixture generated", body = GenerateFixtureResponse),
        (status = 200, description = "Fixture already existed, nothing was changed", body = GenerateFixtureResponse),
        (status = 400, description = "Malformed request body"),
        (status = 404, description = "Tournament not found"),
        (status = 409, description = "Concurrent generation or constraint violation"),
        (status = 422, description = "Not enough participants or schema not migrated")
    ),
    tag = "fixtures"
)]
pub async fn generate_fixture(
    State(db): State<Database>,
    State(policy): State<HomeAwayPolicy>,
    Path(tournament_id): Path<Uuid>,
    body: Bytes,
) -> Result<(StatusCode, Json<GenerateFixtureResponse>), WebError> {
    let req = parse_generate_request(&body)?;
    req.validate()?;

    generation_response(services::generate_fixture(db.pool(), tournament_id, &req, policy).await)
}

/// Only an empty body falls back to the league's clubs; anything else must
/// be a valid request.
fn parse_generate_request(body: &[u8]) -> Result<GenerateFixtureRequest, WebError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(GenerateFixtureRequest::default());
    }

    Json::<GenerateFixtureRequest>::from_bytes(body)
        .map(|Json(req)| req)
        .map_err(|rejection| WebError::BadRequest(rejection.body_text()))
}

fn generation_response(
    result: Result<Vec<FixtureMatch>, FixtureError>,
) -> Result<(StatusCode, Json<GenerateFixtureResponse>), WebError> {
    let matches = result?;

    Ok((
        StatusCode::CREATED,
        Json(GenerateFixtureResponse::created(matches)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/tournaments/{tournament_id}/fixture/{fixture_match_id}/result",
    params(
        ("tournament_id" = Uuid, Path, description = "Tournament ID"),
        ("fixture_match_id" = Uuid, Path, description = "Fixture match ID")
    ),
    request_body = RecordResultRequest,
    responses(
        (status = 200, description = "Result recorded", body = FixtureMatch),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Match not found in this tournament")
    ),
    tag = "fixtures"
)]
pub async fn record_result(
    State(db): State<Database>,
    Path((tournament_id, fixture_match_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<RecordResultRequest>,
) -> Result<Json<FixtureMatch>, WebError> {
    req.validate()?;

    req.validate_scores()
        .map_err(|e| WebError::BadRequest(e.to_string()))?;

    let updated = services::record_result(db.pool(), tournament_id, fixture_match_id, &req).await?;

    Ok(Json(updated))
}
