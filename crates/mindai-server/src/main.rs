use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mindai_core::Settings;
use mindai_server::{app, AppState};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mindai-server")]
#[command(about = "Mind AI HTTP service: single prompts and auto-routed queries")]
#[command(version)]
struct Cli {
    /// Address to bind to; overrides the config file and PORT
    #[arg(short, long, env = "MINDAI_BIND")]
    bind: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file path (defaults to the user config directory)
    #[arg(short, long, env = "MINDAI_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "mindai_server=debug,mindai_core=debug,tower_http=debug"
    } else {
        "mindai_server=info,mindai_core=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };

    let router = settings.build_router();
    if router.registry().is_empty() {
        warn!("No provider has an API key; every query will fail");
    } else {
        let names: Vec<&str> = router.registry().ids().iter().map(|id| id.as_str()).collect();
        info!("Providers: {}", names.join(", "));
    }

    let state = AppState {
        router,
        transport: Arc::new(settings.build_transport()),
    };

    let bind = cli.bind.unwrap_or_else(|| settings.bind_address());
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", bind))?;
    info!("Starting mindai-server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
