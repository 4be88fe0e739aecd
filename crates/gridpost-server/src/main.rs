mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bundling_worker::{BundlingWorker, BundlingWorkerConfig};
use gridpost_domain::{BundlingConfig, BundlingService};
use gridpost_postgres::{PostgresBundleRepository, PostgresClient, PostgresConfig};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    let config = match config::ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("Starting gridpost server");

    if let Err(e) = run(config).await {
        error!("Server exiting with error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: config::ServiceConfig) -> Result<()> {
    let client = PostgresClient::new(&PostgresConfig {
        host: config.postgres_host.clone(),
        port: config.postgres_port,
        database: config.postgres_database.clone(),
        username: config.postgres_username.clone(),
        password: config.postgres_password.clone(),
        max_pool_size: config.postgres_max_pool_size,
    })?;
    client.ping().await?;
    client.apply_schema().await?;

    let bundling_config = BundlingConfig {
        max_bundle_message_count: config.max_bundle_message_count,
        max_bundle_data_count: config.max_bundle_data_count,
        bundle_messages_older_than: chrono::Duration::seconds(
            config.bundle_messages_older_than_secs as i64,
        ),
        delegation_enabled: config.delegation_enabled,
    };

    let bundles = Arc::new(PostgresBundleRepository::new(client));
    let service = Arc::new(BundlingService::new(bundles, bundling_config));
    let worker = BundlingWorker::new(
        service,
        BundlingWorkerConfig {
            interval: Duration::from_secs(config.bundling_interval_secs),
        },
    );

    let token = CancellationToken::new();
    spawn_signal_handlers(token.clone());

    let handle = tokio::spawn(worker.run(token));
    handle.await??;

    info!("Server stopped gracefully");
    Ok(())
}

fn spawn_signal_handlers(token: CancellationToken) {
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                ctrl_c_token.cancel();
            }
            Err(err) => {
                error!("Error setting up signal handler: {}", err);
            }
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM signal");
                token.cancel();
            }
            Err(err) => {
                error!("Error setting up SIGTERM handler: {}", err);
            }
        }
    });
}
