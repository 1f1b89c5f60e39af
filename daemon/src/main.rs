//! Trust validator daemon: entry point for running the HTTP trust service.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use trustval_engine::{TrustValidator, ValidatorConfig};
use trustval_utils::{init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "trustval-daemon", about = "X.509 trust validator daemon")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base; CLI
    /// flags and env vars override them.
    #[arg(long, env = "TRUSTVAL_CONFIG")]
    config: Option<PathBuf>,

    /// Address the HTTP server binds to.
    #[arg(long, env = "TRUSTVAL_BIND_ADDRESS")]
    bind_address: Option<IpAddr>,

    /// HTTP server port.
    #[arg(long, env = "TRUSTVAL_PORT")]
    port: Option<u16>,

    /// Directory for downloaded trusted-list documents.
    #[arg(long, env = "TRUSTVAL_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TRUSTVAL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TRUSTVAL_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Enable revocation checking (unsupported: every chain is rejected).
    #[arg(long, env = "TRUSTVAL_REVOCATION_ENABLED")]
    revocation_enabled: Option<bool>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the validator until SIGINT or SIGTERM.
    Run,
    /// Validate the configuration and print the effective settings.
    CheckConfig,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<ValidatorConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let path = path.to_string_lossy();
                ValidatorConfig::from_toml_file(&path)
                    .with_context(|| format!("loading config from {path}"))?
            }
            None => ValidatorConfig::default(),
        };

        if let Some(bind_address) = self.bind_address {
            config.server.bind_address = bind_address;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = &self.cache_dir {
            config.cache.location = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(enabled) = self.revocation_enabled {
            config.validation.revocation_enabled = enabled;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    init_logging(config.log_format, &config.log_level);

    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    match cli.command {
        Command::CheckConfig => {
            let validator = TrustValidator::new(config).context("invalid configuration")?;
            print!("{}", validator.config().to_toml_string());
        }
        Command::Run => {
            tracing::info!("Starting trust validator on {}", config.listen_addr());
            let mut validator = TrustValidator::new(config).context("invalid configuration")?;
            let shutdown = validator.shutdown_controller().clone();
            // Subscribe before start so an early server failure is not missed.
            let stopped = shutdown.signalled();
            validator.start().await?;

            tokio::select! {
                _ = shutdown.wait_for_signal() => {}
                _ = stopped => {
                    tracing::warn!("validator requested shutdown");
                }
            }
            validator.stop().await;

            tracing::info!("trust validator daemon exited cleanly");
        }
    }

    Ok(())
}
