//! Venues server binary.
//!
//! Starts the venue/artist/show listing service with structured logging,
//! database initialization, and graceful shutdown on SIGTERM/SIGINT.

use medley_server::{boot, config, venues_app, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    let (resolved_path, config_source) = boot::resolve_config_path("MEDLEY_VENUES_CONFIG_PATH");
    let selected_path = resolved_path.as_deref().or(Some("venues.toml"));

    let config = config::load_config(selected_path, &config::VENUES_DEFAULTS)
        .expect("failed to load configuration — the server cannot start without valid config");

    boot::init_tracing(&config.logging);
    tracing::info!(
        source = config_source,
        path = selected_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    let pool = medley_db::create_pool(
        &config.database.path,
        medley_db::DbRuntimeSettings {
            busy_timeout_ms: config.database.busy_timeout_ms,
            pool_max_size: config.database.pool_max_size,
        },
    )
    .expect("failed to create database pool — check database.path in config");

    {
        let conn = pool
            .get()
            .expect("failed to get database connection for migrations");
        let applied =
            medley_db::run_venues_migrations(&conn).expect("failed to run database migrations");
        if applied > 0 {
            tracing::info!(count = applied, "applied database migrations");
        }
    }

    let app = venues_app(AppState { pool });
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting venues server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address — is another process using this port?");

    axum::serve(listener, app)
        .with_graceful_shutdown(boot::shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("venues server shut down");
}
