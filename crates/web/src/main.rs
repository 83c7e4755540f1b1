use anyhow::Context;
use axum::Router;
use storage::Database;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod state;

use config::Config;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::fixtures::handlers::get_fixture,
        features::fixtures::handlers::generate_fixture,
        features::fixtures::handlers::record_result,
    ),
    components(
        schemas(
            storage::dto::fixture::GenerateFixtureRequest,
            storage::dto::fixture::GenerateFixtureResponse,
            storage::dto::fixture::GenerationOutcome,
            storage::dto::fixture::RecordResultRequest,
            storage::dto::fixture::FixtureView,
            storage::dto::fixture::LegFixture,
            storage::dto::fixture::MatchdayFixture,
            storage::dto::fixture::ClubSummary,
            storage::models::Tournament,
            storage::models::Club,
            storage::models::FixtureMatch,
            storage::models::FixtureMatchDetail,
            storage::models::Leg,
        )
    ),
    tags(
        (name = "fixtures", description = "Round-robin fixture generation and results"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting league fixture API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!(
        home_away_policy = ?config.home_away_policy,
        "Configuration loaded successfully"
    );

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    if config.run_migrations {
        tracing::info!("Running database migrations");
        db.run_migrations()
            .await
            .context("Failed to run migrations")?;
        tracing::info!("Database migrations completed successfully");
    } else {
        tracing::warn!("RUN_MIGRATIONS is disabled, assuming the schema is up to date");
    }

    let state = AppState {
        db,
        home_away_policy: config.home_away_policy,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/tournaments", features::fixtures::routes::routes())
        .layer(cors)
        .with_state(state);

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
