//! events-sync-gateway server entry point.
//!
//! Connects to PostgreSQL, applies migrations, starts the periodic sync
//! loop, and serves the REST API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use events_sync_gateway::api;
use events_sync_gateway::api::seat_cache::SeatCache;
use events_sync_gateway::app_state::AppState;
use events_sync_gateway::config::GatewayConfig;
use events_sync_gateway::persistence::{PostgresStore, SyncStore};
use events_sync_gateway::provider::{EventsProvider, ProviderClient};
use events_sync_gateway::service::{SyncScheduler, SyncService, TicketService};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (also reads .env, which may set LOG_FORMAT)
    let config = GatewayConfig::from_env().context("invalid configuration")?;
    init_tracing();
    tracing::info!(addr = %config.listen_addr, "starting events-sync-gateway");

    // Database
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    let store = Arc::new(PostgresStore::new(pool));
    store.migrate().await.context("failed to apply migrations")?;

    // Provider
    let provider: Arc<dyn EventsProvider> = Arc::new(
        ProviderClient::new(
            &config.provider_base_url,
            &config.provider_api_key,
            config.provider_timeout(),
        )
        .context("failed to build provider client")?,
    );

    // Services
    let sync_service = SyncService::new(
        Arc::clone(&provider),
        Arc::clone(&store) as Arc<dyn SyncStore>,
    );
    let sync_scheduler = Arc::new(SyncScheduler::new(sync_service));
    let ticket_service = Arc::new(TicketService::new(provider, store));

    if config.sync_enabled {
        let scheduler = Arc::clone(&sync_scheduler);
        let interval = config.sync_interval();
        tokio::spawn(async move { scheduler.run_periodic(interval).await });
        tracing::info!(interval_secs = config.sync_interval_secs, "periodic sync enabled");
    }

    let app_state = AppState {
        ticket_service,
        sync_scheduler,
        seat_cache: SeatCache::new(config.seats_cache_ttl()),
    };

    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
