//! Configuration tree viewer.
//!
//! Loads the `[Infisical]` section of a TOML file (overridable from the
//! command line), starts the provider and prints the whole configuration
//! tree on an interval and whenever the secrets change.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use infisical_config::config::{parse_options, RepositoryOptions};
use infisical_config::observability::{logging, metrics};
use infisical_config::ConfigurationProvider;

#[derive(Parser)]
#[command(name = "infisical-config")]
#[command(about = "Print configuration loaded from a secrets instance", long_about = None)]
struct Cli {
    /// TOML file with an [Infisical] section.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    site_url: Option<String>,

    #[arg(long)]
    project_id: Option<String>,

    #[arg(long)]
    client_id: Option<String>,

    #[arg(long)]
    client_secret: Option<String>,

    #[arg(long)]
    access_token: Option<String>,

    #[arg(short, long)]
    environment: Option<String>,

    /// Background refresh interval in milliseconds.
    #[arg(long)]
    polling_interval: Option<u64>,

    /// Load deadline in milliseconds; negative waits forever.
    #[arg(long, allow_hyphen_values = true)]
    load_timeout: Option<i64>,

    /// Seconds between tree printouts.
    #[arg(long, default_value_t = 5)]
    print_interval: u64,

    /// Expose Prometheus metrics on this address.
    #[arg(long)]
    metrics_address: Option<SocketAddr>,

    /// Log as JSON.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn options(&self) -> Result<RepositoryOptions, Box<dyn std::error::Error>> {
        let mut options = match &self.config {
            Some(path) => parse_options(&std::fs::read_to_string(path)?)?,
            None => RepositoryOptions::default(),
        };

        if let Some(v) = &self.site_url {
            options.site_url = Some(v.clone());
        }
        if let Some(v) = &self.project_id {
            options.project_id = Some(v.clone());
        }
        if let Some(v) = &self.client_id {
            options.client_id = Some(v.clone());
        }
        if let Some(v) = &self.client_secret {
            options.client_secret = Some(v.clone());
        }
        if let Some(v) = &self.access_token {
            options.access_token = Some(v.clone());
        }
        if let Some(v) = &self.environment {
            options.environment_name = v.clone();
        }
        if self.polling_interval.is_some() {
            options.polling_interval = self.polling_interval;
        }
        if self.load_timeout.is_some() {
            options.load_timeout = self.load_timeout;
        }

        Ok(options)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, cli.log_json);

    if let Some(addr) = cli.metrics_address {
        metrics::init_metrics(addr);
    }

    let options = cli.options()?;
    tracing::info!(options = ?options, "infisical-config v{} starting", env!("CARGO_PKG_VERSION"));

    let provider = ConfigurationProvider::with_http_backend(&options)?;
    provider.load().await?;

    let mut ticker = tokio::time::interval(Duration::from_secs(cli.print_interval.max(1)));
    loop {
        let token = provider.reload_token();

        tokio::select! {
            _ = ticker.tick() => {}
            _ = token.changed() => {
                tracing::info!("Secrets changed");
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }

        print_tree(&provider, "", 0);
    }

    provider.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn print_tree(provider: &ConfigurationProvider, path: &str, indent: usize) {
    for child in provider.get_children(path) {
        let child_path = if path.is_empty() {
            child.clone()
        } else {
            format!("{}:{}", path, child)
        };
        let value = provider.try_get(&child_path).unwrap_or_default();

        println!("{}[{}]: {}", "\t".repeat(indent), child, value);
        print_tree(provider, &child_path, indent + 1);
    }
}
