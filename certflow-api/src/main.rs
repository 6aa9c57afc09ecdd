//! # CertFlow API Server
//!
//! API server for CertFlow, the compliance-training assignment service.
//!
//! ## Architecture
//!
//! The server is built with Axum and provides:
//! - The batch course-assignment endpoint (resolve -> provision -> guard ->
//!   write -> notify, with per-reference failure isolation)
//! - Health checking
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p certflow-api
//! ```

use std::sync::Arc;

use certflow_api::{
    app::{build_router, AppState},
    config::Config,
    workflow::PgStore,
};
use certflow_shared::{
    db::{
        migrations::run_migrations,
        pool::{create_pool, DatabaseConfig},
    },
    mailer::{LogMailer, Mailer, SmtpMailer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certflow_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "CertFlow API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool).await?;

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(settings) => Arc::new(SmtpMailer::new(settings.to_mailer_config())?),
        None => {
            tracing::warn!("SMTP_HOST not set; notification email will be logged, not sent");
            Arc::new(LogMailer::new())
        }
    };

    let bind_address = config.bind_address();
    let state = AppState::new(Arc::new(PgStore::new(pool)), mailer, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
