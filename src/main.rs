use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use metacat::config::{context::build_context, schema::load_config};
use metacat::frontend::http::run_server;

const DEFAULT_CONFIG_PATH: &str = "metacat.toml";
const DEFAULT_LOG_FILTER: &str = "metacat=info,warp=info";

#[derive(Debug, Parser)]
#[clap(name = "metacat", about = "Metadata catalog for datasets, jobs and their runs")]
struct Args {
    #[clap(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[clap(long, help = "Emit logs as JSON lines")]
    json_logs: bool,
}

fn prepare_tracing(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    prepare_tracing(args.json_logs);

    info!("Starting metacat {}", env!("CARGO_PKG_VERSION"));

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading the config from {}: {e}", args.config.display());
            exit(1);
        }
    };

    let context = match build_context(&config).await {
        Ok(context) => Arc::new(context),
        Err(e) => {
            error!("Error building the catalog: {e}");
            exit(1);
        }
    };

    let Some(http) = config.frontend.http.clone() else {
        warn!("No frontends configured. You will not be able to connect to metacat.");
        return;
    };

    if let Err(e) = run_server(context, http, shutdown_signal()).await {
        error!("{e}");
        exit(1);
    }
}
