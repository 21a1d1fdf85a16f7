//! Startup binary: load configuration, open the store, wire the pipeline
//! controller, and serve the admin HTTP facade alongside it.
//!
//! Grounded on the `Bitsage-Network-obelysk` relayer's `main.rs`: parse
//! CLI args, init tracing, load config (exit 1 on failure), build state,
//! bind, `axum::serve(...).with_graceful_shutdown(...)`.

mod config;

use ach_core::{Clock, Metrics, SystemClock};
use ach_pipeline::{Controller, Merger, Processor, Uploader};
use ach_store::{ConfigRepository, Store};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ach-gateway", about = "ACH payment gateway file-pipeline service")]
struct Cli {
    /// Path to the gateway's TOML configuration file.
    #[arg(long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let gateway_config = match config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load configuration from {}: {e}", cli.config.display());
            std::process::exit(1);
        }
    };

    tracing::info!(
        data_dir = %gateway_config.data_dir.display(),
        admin_bind = %gateway_config.admin_bind,
        interval = ?gateway_config.interval,
        batch_size = gateway_config.batch_size,
        micro_deposit_amounts = gateway_config.micro_deposit_amounts.len(),
        "starting ach-gateway",
    );

    std::fs::create_dir_all(&gateway_config.data_dir)?;
    let store = Store::open(gateway_config.data_dir.join("db"))?;

    let mut config_repo = ConfigRepository::new();
    for transfer_config in gateway_config.transfer_configs {
        config_repo.insert_transfer_config(transfer_config);
    }
    for cutoff in gateway_config.cutoffs {
        config_repo.insert_cutoff(cutoff);
    }
    let config_repo = Arc::new(config_repo);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let metrics: Arc<dyn Metrics> = Arc::new(ach_core::InMemoryMetrics::new());

    let merger = Merger::new(
        store.clone(),
        gateway_config.data_dir.join("merged"),
        gateway_config.max_lines,
        clock.clone(),
    );
    let uploader = Uploader::new(
        (*config_repo).clone(),
        metrics.clone(),
        clock.clone(),
        gateway_config.forced_cutoff_upload_delta,
    );
    let processor = Processor::new(
        store.clone(),
        metrics,
        clock,
        gateway_config.update_depositories_from_nocs,
    );

    let controller = Controller::new(
        merger,
        uploader,
        processor,
        config_repo,
        gateway_config.batch_size,
        gateway_config.interval,
    );
    let (pipeline, controller_handle) = ach_pipeline::controller::spawn(controller);

    let admin_state = ach_admin::AdminState::new(pipeline.clone(), store.depositories.clone(), store.micro_deposits.clone());
    let app = ach_admin::router(admin_state);

    let listener = tokio::net::TcpListener::bind(gateway_config.admin_bind).await?;
    tracing::info!(addr = %gateway_config.admin_bind, "admin HTTP facade listening");

    let shutdown = CancellationToken::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received ctrl-c, shutting down");
        signal_shutdown.cancel();
    });

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
        .await?;

    pipeline.shutdown();
    let _ = controller_handle.await;
    store.flush()?;

    Ok(())
}
