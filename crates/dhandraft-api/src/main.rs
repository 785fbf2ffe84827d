use std::path::PathBuf;

use clap::Parser;
use dhandraft_api::Server;
use dhandraft_core::ConfigManager;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "dhandraft-api", version, about = "DhanDraft HTTP and WebSocket server")]
struct Cli {
    /// Directory holding default.toml and per-environment overrides.
    #[arg(long, env = "DHANDRAFT_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Environment name, selects `<env>.toml`.
    #[arg(long, env = "APP_ENV")]
    env: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,
}

fn init_tracing(default_level: &str) {
    let fallback = format!("dhandraft_api={default_level},dhandraft_core={default_level},tower_http={default_level}");
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut settings = ConfigManager::load(cli.config_dir, cli.env)?;
    init_tracing(&settings.logging.level);

    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    settings.validate()?;

    Server::new(settings).await?.run().await
}
