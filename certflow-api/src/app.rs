/// Application state and router builder
///
/// This module defines the shared application state and provides a function
/// to build the axum router with all routes and middleware.
///
/// The state carries the workflow's capabilities as trait objects - the
/// store and the mailer are injected at startup (Postgres + SMTP in
/// production, fakes in tests) and handed to the orchestrator per request.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use certflow_api::{app::{build_router, AppState}, config::Config, workflow::PgStore};
/// use certflow_shared::mailer::LogMailer;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(
///     Arc::new(PgStore::new(pool)),
///     Arc::new(LogMailer::new()),
///     config,
/// );
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer, workflow::WorkflowStore};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use certflow_shared::mailer::Mailer;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via axum's `State` extractor; all fields
/// are cheap Arc clones.
#[derive(Clone)]
pub struct AppState {
    /// Workflow persistence capability
    pub store: Arc<dyn WorkflowStore>,

    /// Outbound notification capability
    pub mailer: Arc<dyn Mailer>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn WorkflowStore>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        Self {
            store,
            mailer,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                     # Health check (public)
/// └── /v1/                        # API v1 (versioned)
///     └── /assignments/
///         └── POST /batch         # Batch course assignment
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Request tracing (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Assignment workflow routes
    let assignment_routes =
        Router::new().route("/batch", post(routes::assignments::assign_employees));

    // Build complete v1 API
    let v1_routes = Router::new().nest("/assignments", assignment_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configured origins only
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
