use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use clap::Parser;
use pollcast_db::DbPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pollcast=info,tower_http=debug")),
        )
        .init();

    let args = cli::Args::parse();
    let config = config::Config::load(args.config.as_deref())?;

    let db = connect_with_retry(&config.database).await?;

    let state = pollcast_core::AppState::new(
        db,
        pollcast_core::AppConfig {
            client_origin: config.server.client_url.clone(),
            vote_write_attempts: config.votes.write_attempts,
        },
    );

    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .client_origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid client_url {:?}", state.config.client_origin))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let app = pollcast_api::build_router()
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_address))?;
    tracing::info!(
        address = %config.server.bind_address,
        client_origin = %config.server.client_url,
        "pollcast server listening"
    );

    let shutdown_signal = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down...");
    };

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

/// Open the pool, confirm it answers, and apply migrations, backing off
/// between failed attempts. Requests are not served until this succeeds.
async fn connect_with_retry(db: &config::DatabaseConfig) -> Result<DbPool> {
    let max_attempts = db.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match try_connect(db).await {
            Ok(pool) => {
                tracing::info!(attempt, "connected to database");
                return Ok(pool);
            }
            Err(err) if attempt < max_attempts => {
                let delay = db.backoff(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    retry_in_ms = delay.as_millis() as u64,
                    "database connection failed: {err:#}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(attempt, "giving up on database: {err:#}");
                return Err(err);
            }
        }
    }
}

async fn try_connect(db: &config::DatabaseConfig) -> Result<DbPool> {
    let pool = pollcast_db::create_pool(&db.url, db.max_connections)
        .await
        .context("failed to open database")?;
    pollcast_db::ping(&pool).await.context("database did not answer")?;
    pollcast_db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;
    Ok(pool)
}
