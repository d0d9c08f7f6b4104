//! JWT Mock Server - Entry Point

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use jwt_mock::{config::Config, server::Server};

#[derive(Parser, Debug)]
#[command(name = "jwt-mock")]
#[command(about = "Mock JWT authorization server for integration tests")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(long, env = "JWT_MOCK_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP server port
    #[arg(long)]
    port: Option<u16>,

    /// RSA key size in bits
    #[arg(long)]
    key_length: Option<usize>,

    /// Lifetime of the published certificates, in days
    #[arg(long)]
    cert_life_days: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    /// Flags override every other configuration source.
    fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(key_length) = self.key_length {
            config.key_length = key_length;
        }
        if let Some(days) = self.cert_life_days {
            config.cert_life_days = days;
        }
        if let Some(ref level) = self.log_level {
            config.log_level.clone_from(level);
        }
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    init_tracing(&config.log_level, cli.json_logs);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), %config, "Starting JWT mock server");

    let server = Server::new(config).context("initialize key store")?;
    server.run().await
}
