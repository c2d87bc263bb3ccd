use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tower::make::Shared;
use tracing_subscriber::EnvFilter;

use assignment_backend::assignments::{AssignmentCoordinator, Timeouts};
use assignment_backend::config::AppConfig;
use assignment_backend::db;
use assignment_backend::repository::DieselAssignmentRepository;
use assignment_backend::routes;
use assignment_backend::s3::build_client;
use assignment_backend::state::AppState;
use assignment_backend::storage::S3Storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "server",
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        server_host = %config.server_host,
        server_port = config.server_port,
        assignments_bucket = %config.assignments_bucket,
        storage_endpoint = config.aws_endpoint_url.as_deref().unwrap_or("aws"),
        storage_timeout_secs = config.storage_timeout.map(|t| t.as_secs()),
        database_timeout_secs = config.database_timeout.map(|t| t.as_secs()),
        "loaded backend configuration"
    );

    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)
        .context("failed to build database pool")?;
    let s3_client = build_client(&config).await?;
    let storage = Arc::new(S3Storage::new(s3_client, config.assignments_bucket.clone()));
    let repository = Arc::new(DieselAssignmentRepository::new(pool));
    let coordinator = AssignmentCoordinator::new(repository, storage).with_timeouts(Timeouts {
        storage: config.storage_timeout,
        database: config.database_timeout,
    });

    let listen_addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("invalid listen address")?;
    let state = AppState::new(config, coordinator);
    let router = routes::create_router(state);

    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {}", listen_addr);

    axum::serve(listener, Shared::new(router))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("server received shutdown signal");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
