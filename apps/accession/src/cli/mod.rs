//! # Accession CLI Module
//!
//! This module implements the CLI interface for the accession registry.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `mint` - Mint a new accession number
//! - `record` - Record a pre-existing accession number
//! - `lookup` - Show the state of an accession number
//! - `circulate` / `revoke` - Toggle the circulating flag
//! - `status` - Show ledger row counts
//! - `reset` - Delete every row (requires `--force`)
//! - `seed` - Record accession numbers from a file, one per line

mod commands;

use crate::config::{self, BackendKind, Overrides, Settings};
use crate::error::AppError;
use accession_core::primitives::DEFAULT_TYPE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Accession number registry
///
/// Mints and records archival accession numbers whose year and
/// collection sequence numbers are never issued twice.
#[derive(Parser, Debug)]
#[command(name = "accession")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML config file (default: ./accession.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the ledger database
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<BackendKind>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Mint a new accession number
    Mint {
        /// Record type abbreviation
        #[arg(short = 't', long = "type", default_value = DEFAULT_TYPE)]
        record_type: String,

        /// Year
        #[arg(short, long)]
        year: String,

        /// Collection code
        #[arg(short, long)]
        collection: String,
    },

    /// Record a pre-existing accession number
    Record {
        /// The accession number as written
        accession_number: String,
    },

    /// Show the state of an accession number
    Lookup {
        accession_number: String,
    },

    /// Mark an accession number as circulating
    Circulate {
        accession_number: String,
    },

    /// Withdraw an accession number from circulation
    Revoke {
        accession_number: String,
    },

    /// Show ledger status
    Status,

    /// Delete every row of every relation
    Reset {
        /// Required; the reset cannot be undone
        #[arg(short, long)]
        force: bool,
    },

    /// Record accession numbers from a file, one per line
    Seed {
        /// Input file
        #[arg(short, long)]
        file: PathBuf,

        /// Keep existing ledger contents instead of resetting first
        #[arg(long)]
        append: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

impl Cli {
    /// Resolve settings from flags, environment and config file.
    pub fn settings(&self) -> Result<Settings, AppError> {
        let file = config::load_config(self.config.as_deref())?;
        let (host, port) = match &self.command {
            Some(Commands::Server { host, port }) => (host.clone(), *port),
            _ => (None, None),
        };
        let overrides = Overrides {
            database: self.database.clone(),
            backend: self.backend,
            host,
            port,
        };
        Ok(Settings::resolve(&overrides, &file, config::env_var))
    }
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let settings = cli.settings()?;
    if cli.verbose {
        tracing::info!(
            database = %settings.database.display(),
            backend = settings.backend.as_str(),
            "Resolved settings"
        );
    }
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { .. }) => cmd_server(&settings).await,
        Some(Commands::Mint {
            record_type,
            year,
            collection,
        }) => cmd_mint(&settings, json_mode, &record_type, &year, &collection),
        Some(Commands::Record { accession_number }) => {
            cmd_record(&settings, json_mode, &accession_number)
        }
        Some(Commands::Lookup { accession_number }) => {
            cmd_lookup(&settings, json_mode, &accession_number)
        }
        Some(Commands::Circulate { accession_number }) => {
            cmd_circulate(&settings, json_mode, &accession_number)
        }
        Some(Commands::Revoke { accession_number }) => {
            cmd_revoke(&settings, json_mode, &accession_number)
        }
        Some(Commands::Status) => cmd_status(&settings, json_mode),
        Some(Commands::Reset { force }) => cmd_reset(&settings, force),
        Some(Commands::Seed { file, append }) => cmd_seed(&settings, &file, append),
        None => {
            // No subcommand - show status by default
            cmd_status(&settings, json_mode)
        }
    }
}
