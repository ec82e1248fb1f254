//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, AccessionResponse, StatusResponse};
use crate::config::Settings;
use crate::error::AppError;
use accession_core::{Accession, AccessionError, LedgerStore, Operation, Registry, StorageBackend};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum seed file size (100 MB).
const MAX_SEED_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate a seed file path: it must exist and be a regular file
/// within the size limit. Returns the canonical path.
fn validate_seed_file(path: &Path) -> Result<PathBuf, AppError> {
    let canonical = path.canonicalize().map_err(|e| {
        AppError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(AppError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| AppError::Io(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > MAX_SEED_FILE_SIZE {
        return Err(AppError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_SEED_FILE_SIZE
        )));
    }

    Ok(canonical)
}

// =============================================================================
// HELPERS
// =============================================================================

/// Open the configured backend and wrap it in a registry.
pub fn open_registry(settings: &Settings) -> Result<Registry<StorageBackend>, AppError> {
    Ok(Registry::new(settings.open_backend()?))
}

/// Print an accession number, log the outcome, and map failures.
fn report(
    op: Operation,
    json_mode: bool,
    result: Result<Accession, AccessionError>,
) -> Result<(), AppError> {
    if json_mode {
        let response = AccessionResponse::from_result(op, &result);
        println!("{}", to_json_pretty(&response)?);
    }

    match result {
        Ok(accession) => {
            tracing::info!(event = op.name(), canonical = %accession.canonical, "ok");
            if !json_mode {
                print_accession(&accession);
            }
            Ok(())
        }
        Err(e) => {
            if e.is_fault() {
                tracing::error!(event = op.name(), error = %e, "Storage fault");
            }
            Err(AppError::ledger(op)(e))
        }
    }
}

fn print_accession(accession: &Accession) {
    let c = &accession.components;
    println!("Accession number: {}", accession.canonical);
    if accession.as_submitted != accession.canonical {
        println!("  As submitted:   {}", accession.as_submitted);
    }
    println!("  Type:           {}", c.record_type);
    println!("  Year:           {} (#{})", c.year, c.year_count);
    println!("  Collection:     {} (#{})", c.collection, c.collection_count);
    println!(
        "  Circulating:    {}",
        if accession.circulating { "yes" } else { "no" }
    );
}

fn to_json_pretty<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::Io(format!("Encode JSON: {}", e)))
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(settings: &Settings) -> Result<(), AppError> {
    let backend = settings.open_backend()?;
    let addr = settings.addr();

    println!("Accession Registry Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:  {}", addr);
    println!("  Backend:  {}", settings.backend.as_str());
    println!("  Database: {}", settings.database.display());
    println!();
    println!("Endpoints:");
    println!("  POST /mint               - Mint a new accession number");
    println!("  POST /record             - Record a pre-existing number");
    println!("  GET  /accession/{{number}} - Look up a number");
    println!("  POST /circulate          - Mark as circulating");
    println!("  POST /revoke             - Withdraw from circulation");
    println!("  GET  /status             - Ledger status");
    println!("  GET  /health             - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(&addr, backend).await
}

// =============================================================================
// ACCESSION COMMANDS
// =============================================================================

/// Mint a new accession number.
pub fn cmd_mint(
    settings: &Settings,
    json_mode: bool,
    record_type: &str,
    year: &str,
    collection: &str,
) -> Result<(), AppError> {
    let registry = open_registry(settings)?;
    let result = registry.mint(record_type, year, collection);
    report(Operation::Mint, json_mode, result)
}

/// Record a pre-existing accession number.
pub fn cmd_record(settings: &Settings, json_mode: bool, raw: &str) -> Result<(), AppError> {
    let registry = open_registry(settings)?;
    let result = registry.record(raw);
    report(Operation::Record, json_mode, result)
}

/// Show the state of an accession number.
pub fn cmd_lookup(settings: &Settings, json_mode: bool, raw: &str) -> Result<(), AppError> {
    let registry = open_registry(settings)?;
    let result = registry.lookup(raw);
    report(Operation::Lookup, json_mode, result)
}

/// Mark an accession number as circulating.
pub fn cmd_circulate(settings: &Settings, json_mode: bool, raw: &str) -> Result<(), AppError> {
    let registry = open_registry(settings)?;
    let result = registry.circulate(raw);
    report(Operation::Circulate, json_mode, result)
}

/// Withdraw an accession number from circulation.
pub fn cmd_revoke(settings: &Settings, json_mode: bool, raw: &str) -> Result<(), AppError> {
    let registry = open_registry(settings)?;
    let result = registry.revoke(raw);
    report(Operation::Revoke, json_mode, result)
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show ledger status.
pub fn cmd_status(settings: &Settings, json_mode: bool) -> Result<(), AppError> {
    let registry = open_registry(settings)?;
    let stats = registry
        .stats()
        .map_err(AppError::ledger(Operation::Lookup))?;

    if json_mode {
        let mut output = serde_json::json!({
            "database": settings.database.to_string_lossy(),
        });
        let status = serde_json::to_value(StatusResponse::new(settings.backend.as_str(), &stats))
            .map_err(|e| AppError::Io(format!("Encode JSON: {}", e)))?;
        if let (Some(out), serde_json::Value::Object(fields)) = (output.as_object_mut(), status) {
            out.extend(fields);
        }
        println!("{}", to_json_pretty(&output)?);
        return Ok(());
    }

    println!("Accession Ledger Status");
    println!("=======================");
    println!("Database: {}", settings.database.display());
    println!("Backend:  {}", settings.backend.as_str());
    println!();
    println!("Types:               {}", stats.types);
    println!("Years:               {}", stats.years);
    println!("Collections:         {}", stats.collections);
    println!("Year counters:       {}", stats.year_counters);
    println!("Collection counters: {}", stats.collection_counters);
    println!(
        "Accession numbers:   {} ({} circulating)",
        stats.identifiers, stats.circulating
    );

    Ok(())
}

// =============================================================================
// RESET COMMAND
// =============================================================================

/// Delete every row of every relation.
pub fn cmd_reset(settings: &Settings, force: bool) -> Result<(), AppError> {
    if !force {
        return Err(AppError::Refused(
            "Reset deletes every accession number. Use --force to proceed.".to_string(),
        ));
    }

    let registry = open_registry(settings)?;
    registry
        .hard_reset()
        .map_err(AppError::ledger(Operation::Reset))?;
    tracing::warn!(event = "reset", database = %settings.database.display(), "Ledger reset");
    println!("Ledger reset: {}", settings.database.display());
    Ok(())
}

// =============================================================================
// SEED COMMAND
// =============================================================================

/// Outcome counts of a seed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub recorded: usize,
    pub failed: usize,
}

/// Record every non-empty trimmed line of `input`.
///
/// Writes one JSON object per line to `out`: the record response plus an
/// `original` field holding the trimmed line. A rejected line is reported
/// and seeding continues.
pub fn seed_lines<S: LedgerStore>(
    registry: &Registry<S>,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<SeedSummary, AppError> {
    let mut summary = SeedSummary::default();

    for line in input.lines() {
        let line = line.map_err(|e| AppError::Io(format!("Read seed file: {}", e)))?;
        let original = line.trim();
        if original.is_empty() {
            continue;
        }

        let result = registry.record(original);
        match &result {
            Ok(_) => summary.recorded += 1,
            Err(e) => {
                summary.failed += 1;
                tracing::warn!(event = "seed", original, error = %e, "Line not recorded");
            }
        }

        let mut value = serde_json::to_value(AccessionResponse::from_result(
            Operation::Record,
            &result,
        ))
        .map_err(|e| AppError::Io(format!("Encode JSON: {}", e)))?;
        if let Some(fields) = value.as_object_mut() {
            fields.insert("original".to_string(), original.into());
        }
        writeln!(out, "{}", value).map_err(|e| AppError::Io(format!("Write output: {}", e)))?;
    }

    Ok(summary)
}

/// Seed the ledger from a file of accession numbers.
pub fn cmd_seed(settings: &Settings, file: &Path, append: bool) -> Result<(), AppError> {
    let path = validate_seed_file(file)?;
    let registry = open_registry(settings)?;

    if !append {
        registry
            .hard_reset()
            .map_err(AppError::ledger(Operation::Reset))?;
        tracing::info!(event = "reset", "Ledger reset before seeding");
    }

    let handle = std::fs::File::open(&path)
        .map_err(|e| AppError::Io(format!("Open seed file: {}", e)))?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = seed_lines(&registry, BufReader::new(handle), &mut out)?;

    tracing::info!(
        event = "seed",
        recorded = summary.recorded,
        failed = summary.failed,
        "Seeding finished"
    );
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
