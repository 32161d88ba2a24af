//! keybridge daemon
//!
//! Reads host keyboard notifications as JSON lines on stdin and writes the
//! coalesced keysym press/release events as JSON lines on stdout.

mod driver;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use keybridge_config::Config;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "keybridged")]
#[command(about = "Keyboard notification to X11 keysym bridge")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/keybridge/config.kdl")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&args.config).into_owned().into();

    // The configured log level is only known once the config is parsed, so
    // parser warnings go through a temporary stderr subscriber
    let bootstrap = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new("warn"))
        .finish();
    let config = tracing::subscriber::with_default(bootstrap, || load_config(&config_path))?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.global.log_level.as_directive())),
        )
        .init();

    tracing::info!(
        "keybridge daemon starting (auto-repeat={}, delay={:?}, interval={:?}, release-delay={:?})",
        config.keyboard.auto_repeat,
        config.keyboard.repeat_delay,
        config.keyboard.repeat_interval,
        config.keyboard.release_delay
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    tokio::select! {
        result = driver::run(stdin, &mut stdout, config.keyboard) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
        }
    }

    tracing::info!("Shutting down...");

    Ok(())
}

/// Load the config file, falling back to defaults when it does not exist.
fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::warn!(
            "No configuration at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let config = keybridge_config::parse_config(path)?;
    Ok(config)
}
