//! DPM reference backend binary.
//!
//! Serves the REST API over an in-memory store. Prints `{"port": N}` to
//! stdout once bound so scripts and tests can discover an ephemeral port.

use clap::Parser;
use dpm_api::config::ApiConfig;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// CLI arguments for the backend.
#[derive(Parser, Debug)]
#[command(name = "dpm_server", about = "DPM reference REST backend")]
struct Args {
    /// Address to listen on (port 0 = ephemeral).
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8080")]
    bind: String,

    /// Start with an empty store instead of the demo data.
    #[arg(long, default_value_t = false)]
    empty: bool,

    /// Lifetime of issued application bind tokens, in hours.
    #[arg(long, env = "DPM_BIND_TOKEN_EXPIRY_HOURS")]
    bind_token_expiry_hours: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries the JSON port message.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,dpm_api=debug,dpm_core=debug")),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    config.bind_addr = args.bind;
    if args.empty {
        config.seed_demo_data = false;
    }
    if let Some(hours) = args.bind_token_expiry_hours {
        config.bind_token_expiry_hours = hours;
    }

    info!(
        bind = %config.bind_addr,
        seed = config.seed_demo_data,
        bind_token_expiry_hours = config.bind_token_expiry_hours,
        "starting dpm_server"
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;

    let state = dpm_api::AppState::new(config);
    let app = dpm_api::router(state);

    println!("{}", serde_json::json!({"port": local_addr.port()}));
    info!(addr = %local_addr, "REST API listening");

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
            }
            info!("shutdown requested");
            shutdown.cancel();
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("stopped");
    Ok(())
}
