//! # Accession Registry
//!
//! The main binary for the accession number registry.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for minting, recording and seeding
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │              apps/accession (THE BINARY)          │
//! │                                                   │
//! │   ┌─────────────┐            ┌─────────────┐      │
//! │   │   CLI       │            │   HTTP API  │      │
//! │   │  (clap)     │            │   (axum)    │      │
//! │   └──────┬──────┘            └──────┬──────┘      │
//! │          └──────────────┬───────────┘             │
//! │                         ▼                         │
//! │                ┌────────────────┐                 │
//! │                │ accession-core │                 │
//! │                │  (THE LOGIC)   │                 │
//! │                └────────────────┘                 │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! accession server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! accession mint --type oh --year 1900 --collection a
//! accession record "1899 OH/ 151 AB 9 Sess 3"
//! accession seed -f legacy.txt
//! ```

use accession::cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // ACCESSION_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("ACCESSION_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "accession=info,tower_http=debug".into());

    // Logs go to stderr so --json-mode output on stdout stays parseable.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  accession  v{}
  year and collection sequences, never reissued
"#,
        env!("CARGO_PKG_VERSION")
    );
}
