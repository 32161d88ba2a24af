//! keybridge CLI
//!
//! Configuration checks, keysym lookups and offline trace replay.

mod replay;

use std::path::{Path, PathBuf};

use clap::{ArgGroup, Parser, Subcommand};
use keybridge_config::Config;
use keybridge_core::{resolver, tables, Keysym};

#[derive(Parser, Debug)]
#[command(name = "keybridge")]
#[command(about = "Keyboard notification to X11 keysym bridge")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/keybridge/config.kdl")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the configuration file
    Validate,

    /// Resolve a raw code, symbolic identifier or character to a keysym
    #[command(group(ArgGroup::new("input").required(true).args(["code", "identifier", "character"])))]
    Resolve {
        /// Raw host key code
        #[arg(long)]
        code: Option<u32>,

        /// Symbolic key identifier, e.g. "Enter" or "U+0041"
        #[arg(long)]
        identifier: Option<String>,

        /// Typed character
        #[arg(long = "char")]
        character: Option<char>,

        /// Resolve as if shift were held
        #[arg(long)]
        shift: bool,
    },

    /// Print the static keysym tables
    Tables,

    /// Replay a recorded JSON-lines trace on virtual time
    Replay {
        /// Trace file
        file: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&cli.config).into_owned().into();

    match cli.command {
        Commands::Validate => cmd_validate(&config_path),
        Commands::Resolve {
            code,
            identifier,
            character,
            shift,
        } => cmd_resolve(code, identifier.as_deref(), character, shift),
        Commands::Tables => cmd_tables(),
        Commands::Replay { file } => cmd_replay(&config_path, &file),
    }
}

fn cmd_validate(config_path: &Path) -> miette::Result<()> {
    println!("Validating configuration: {}", config_path.display());

    let config = keybridge_config::parse_config(config_path).map_err(miette::Report::new)?;

    println!("Configuration is valid!");
    println!("  Log level: {}", config.global.log_level.as_directive());
    println!("  Auto-repeat: {}", config.keyboard.auto_repeat);
    println!("  Repeat delay: {:?}", config.keyboard.repeat_delay);
    println!("  Repeat interval: {:?}", config.keyboard.repeat_interval);
    println!("  Release delay: {:?}", config.keyboard.release_delay);

    Ok(())
}

fn cmd_resolve(
    code: Option<u32>,
    identifier: Option<&str>,
    character: Option<char>,
    shift: bool,
) -> miette::Result<()> {
    let keysym = if let Some(code) = code {
        resolver::keysym_from_raw_code(code, shift)
    } else if let Some(identifier) = identifier {
        println!(
            "typable: {}",
            if resolver::is_typable(identifier) { "yes" } else { "no" }
        );
        resolver::keysym_from_identifier(identifier, shift)
    } else if let Some(c) = character {
        resolver::keysym_from_char_code(u32::from(c))
    } else {
        return Err(miette::miette!(
            "one of --code, --identifier or --char is required"
        ));
    };

    println!("{}", describe(keysym));
    Ok(())
}

fn describe(keysym: Option<Keysym>) -> String {
    match keysym {
        Some(keysym) if keysym.is_unicode() => format!("{} (unicode)", keysym),
        Some(keysym) => keysym.to_string(),
        None => "unresolved".to_string(),
    }
}

fn cmd_tables() -> miette::Result<()> {
    println!("Raw codes (unshifted):");
    for (code, keysym) in tables::UNSHIFTED_KEYSYMS {
        println!("  {:>4}  {}", code, describe(*keysym));
    }

    println!("\nRaw codes (shifted overrides):");
    for (code, keysym) in tables::SHIFTED_KEYSYMS {
        println!("  {:>4}  {}", code, describe(*keysym));
    }

    println!("\nIdentifiers:");
    for (identifier, keysym) in tables::IDENTIFIER_KEYSYMS {
        println!("  {:<18}  {}", identifier, describe(*keysym));
    }

    Ok(())
}

fn cmd_replay(config_path: &Path, trace_path: &Path) -> miette::Result<()> {
    let config = load_config(config_path)?;
    for line in replay::replay_file(trace_path, config.keyboard)? {
        println!("{}", line);
    }
    Ok(())
}

/// Load the config file, falling back to defaults when it does not exist.
fn load_config(path: &Path) -> miette::Result<Config> {
    if !path.exists() {
        tracing::info!("No configuration at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    keybridge_config::parse_config(path).map_err(miette::Report::new)
}
