use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use api_shield::http::echo;
use api_shield::lifecycle::{signals, startup, Shutdown};
use api_shield::ShieldServer;

#[derive(Parser)]
#[command(name = "api-shield")]
#[command(about = "Security pipeline in front of an HTTP API", long_about = None)]
struct Args {
    /// TOML config file; defaults and environment variables apply without one
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = startup::load(args.config.as_deref())?;
    startup::init_observability(&config);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        bind_address = %config.listener.bind_address,
        rate_limit_window_ms = config.rate_limit.window_ms,
        rate_limit_max = config.rate_limit.max_for(config.environment),
        "Configuration loaded"
    );

    let listener = startup::bind(&config).await?;
    let server = ShieldServer::new(config, echo::router())?;

    let shutdown = Arc::new(Shutdown::new());
    let receiver = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
