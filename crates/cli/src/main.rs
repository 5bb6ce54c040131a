//! mergelens command-line tool.
//!
//! Provides subcommands for listing, navigating, and resolving conflict
//! markers in a file, printing their sign ranges, and viewing or diffing a
//! file against any git revision.

mod conflicts;
mod revision;
mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use mergelens_core::config::MergelensConfig;
use mergelens_core::conflict::ActionKind;
use mergelens_core::MergelensEngine;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// mergelens command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "mergelens",
    version,
    about = "Inspect and resolve merge conflicts, and diff files against git revisions"
)]
struct Cli {
    /// Path to the TOML configuration file.
    /// [default: <config dir>/mergelens/config.toml, if present]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (e.g. `debug` or `mergelens_core=trace`). Overrides
    /// RUST_LOG and the configured level.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the conflict regions of a file.
    Conflicts {
        /// File containing conflict markers.
        file: PathBuf,
    },

    /// Resolve a conflict and write the file back.
    Resolve {
        /// File containing conflict markers.
        file: PathBuf,

        /// A line inside the conflict to resolve (1-based).
        #[arg(short, long, required_unless_present = "all")]
        line: Option<usize>,

        /// Which side to keep.
        #[arg(short, long, value_enum)]
        accept: Accept,

        /// Apply the same resolution to every conflict in the file.
        #[arg(long)]
        all: bool,
    },

    /// Print the start line of the next conflict after a line.
    Next {
        file: PathBuf,

        /// Cursor line (1-based); 0 finds the first conflict.
        #[arg(short, long, default_value = "0")]
        line: usize,
    },

    /// Print the start line of the previous conflict before a line.
    Prev {
        file: PathBuf,

        /// Cursor line (1-based); 0 wraps to the last conflict.
        #[arg(short, long, default_value = "0")]
        line: usize,
    },

    /// Print the sign ranges of every conflict section.
    Signs {
        file: PathBuf,

        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print a file as it was at a revision.
    Show {
        /// Revision name, e.g. HEAD, main, v1.2~3.
        revision: String,
        file: PathBuf,
    },

    /// Show how the working copy of a file differs from a revision.
    Diff {
        /// Revision name, e.g. HEAD, main, v1.2~3.
        revision: String,
        file: PathBuf,

        /// Print a unified diff instead of change blocks.
        #[arg(short, long)]
        unified: bool,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        /// [default: <config dir>/mergelens/config.toml]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a configuration file.
    Validate,
}

/// Resolution choices as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Accept {
    /// Keep our side.
    Current,
    /// Keep their side.
    Incoming,
    /// Keep ours followed by theirs.
    Both,
    /// Drop the whole conflict.
    #[value(name = "none")]
    Discard,
}

impl From<Accept> for ActionKind {
    fn from(accept: Accept) -> Self {
        match accept {
            Accept::Current => ActionKind::AcceptCurrent,
            Accept::Incoming => ActionKind::AcceptIncoming,
            Accept::Both => ActionKind::AcceptBoth,
            Accept::Discard => ActionKind::Discard,
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Init { output } = &cli.command {
        return cmd_init(output.as_deref());
    }

    let config = load_config(cli.config.as_deref())?;
    init_tracing(cli.log_level.as_deref(), &config)?;

    if let Commands::Validate = cli.command {
        return cmd_validate(cli.config.as_deref(), &config);
    }

    let mut engine =
        MergelensEngine::from_config(&config).context("failed to initialize mergelens")?;

    match cli.command {
        Commands::Conflicts { file } => conflicts::run_list(&mut engine, &file),
        Commands::Resolve {
            file,
            line,
            accept,
            all,
        } => conflicts::run_resolve(&mut engine, &file, accept.into(), line, all),
        Commands::Next { file, line } => conflicts::run_navigate(&mut engine, &file, line, true),
        Commands::Prev { file, line } => conflicts::run_navigate(&mut engine, &file, line, false),
        Commands::Signs { file, json } => conflicts::run_signs(&mut engine, &file, json),
        Commands::Show { revision, file } => revision::run_show(&engine, &revision, &file).await,
        Commands::Diff {
            revision,
            file,
            unified,
        } => revision::run_diff(&engine, &revision, &file, unified).await,
        Commands::Init { .. } | Commands::Validate => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Config & logging helpers
// ---------------------------------------------------------------------------

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mergelens").join("config.toml"))
}

/// Load the explicit config file, or the default one if it exists, or fall
/// back to built-in defaults. Environment overrides apply in every case.
fn load_config(explicit: Option<&Path>) -> Result<MergelensConfig> {
    let mut config = match explicit {
        Some(path) => MergelensConfig::load_from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => match default_config_path() {
            Some(path) if path.exists() => MergelensConfig::load_from_file(&path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?,
            _ => MergelensConfig::default(),
        },
    };
    config.apply_env_overrides();
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// `--log-level` wins, then RUST_LOG, then `logging.level` from the config.
fn log_filter(cli_level: Option<&str>, config: &MergelensConfig) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return EnvFilter::try_new(level).with_context(|| format!("invalid log level '{}'", level));
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.logging.level)
        .with_context(|| format!("invalid logging.level '{}'", config.logging.level))
}

fn init_tracing(cli_level: Option<&str>, config: &MergelensConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli_level, config)?)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Config subcommands
// ---------------------------------------------------------------------------

fn cmd_init(output: Option<&Path>) -> Result<()> {
    let output = match output {
        Some(path) => path.to_path_buf(),
        None => default_config_path().context("could not determine the config directory")?,
    };

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    let body = MergelensConfig::default()
        .to_toml()
        .context("failed to render default configuration")?;
    let contents = format!(
        "# mergelens configuration\n# MERGELENS_GIT overrides git.binary.\n\n{}",
        body
    );

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&output, contents).context("failed to write config file")?;

    println!(
        "{}",
        style::success(&format!(
            "Default configuration written to {}",
            output.display()
        ))
    );
    println!();
    println!("Next steps:");
    println!("  1. Point git.binary at a specific git if `git` is not on PATH");
    println!(
        "  2. Validate with: mergelens validate --config {}",
        output.display()
    );

    Ok(())
}

fn cmd_validate(explicit: Option<&Path>, config: &MergelensConfig) -> Result<()> {
    let source = match explicit {
        Some(path) => path.display().to_string(),
        None => match default_config_path() {
            Some(path) if path.exists() => path.display().to_string(),
            _ => "built-in defaults".to_string(),
        },
    };

    println!("Validating configuration: {}", source);
    println!();
    println!("  [OK] TOML structure is valid");
    println!("  [OK] All fields are valid");
    println!();
    println!("Configuration summary:");
    println!("  Git binary     : {}", config.git.binary);
    println!("  Cache capacity : {}", config.cache.capacity);
    println!("  Log level      : {}", config.logging.level);
    println!();
    println!("Configuration is valid.");

    Ok(())
}
