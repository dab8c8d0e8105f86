// Gatherly events API server
// Decision: storage backend picked from the environment — Postgres when
// DATABASE_URL is set, in-memory dev mode otherwise

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use gatherly_api::events;
use gatherly_contracts::{ErrorBody, Event, EventForm, JoinRequest, Participant, SweepResponse};
use gatherly_storage::StorageBackend;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    storage_mode: String,
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    storage_mode: String,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage_mode: state.storage_mode.clone(),
    })
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        events::list_events,
        events::get_event_counts,
        events::create_event,
        events::get_event,
        events::get_group_uuid,
        events::update_event,
        events::delete_events,
        events::delete_in_group,
        events::join_event,
        events::leave_event,
        events::sweep_expired,
    ),
    components(
        schemas(
            Event, Participant, EventForm, JoinRequest,
            ErrorBody, SweepResponse,
        )
    ),
    tags(
        (name = "events", description = "Event management endpoints"),
        (name = "participants", description = "Event membership endpoints")
    ),
    info(
        title = "Gatherly Events API",
        version = "0.2.0",
        description = "API for managing events and their participants",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatherly_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("gatherly-api starting...");

    // Initialize storage
    let db = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let db = StorageBackend::postgres(&database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");
            db
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage (dev mode)");
            StorageBackend::in_memory()
        }
    };
    db.migrate().await.context("Failed to run migrations")?;

    let storage_mode = if db.is_dev_mode() {
        "in-memory"
    } else {
        "postgres"
    };
    let db = Arc::new(db);

    let events_state = events::AppState::new(db);
    let health_state = HealthState {
        storage_mode: storage_mode.to_string(),
    };

    // Load CORS allowed origins from environment (optional)
    // Only needed when a UI is served from a different origin than the API
    // Example: CORS_ALLOWED_ORIGINS="https://app.example.com,https://admin.example.com"
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();

    if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
    }

    // Build main router with health and event routes
    let app = Router::new()
        .route("/health", get(health).with_state(health_state))
        .merge(events::routes(events_state));

    // Add Swagger UI
    let app =
        app.merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    // Add CORS layer only if origins are configured
    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]),
        )
    } else {
        app
    };

    // Add tracing
    let app = app.layer(TraceLayer::new_for_http());

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:9000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
