//! # Ledger Primitives
//!
//! Hardcoded constants for the accession ledger.
//!
//! These are compiled into the binary and are immutable at runtime.

/// Type abbreviation used when a mint request does not name one.
pub const DEFAULT_TYPE: &str = "oh";

/// Minimum rendered width of the year field. Longer years are never truncated.
pub const YEAR_WIDTH: usize = 4;

/// Minimum rendered width of the year and collection sequence fields.
pub const SEQUENCE_WIDTH: usize = 3;

/// Separator between the year block and the collection block.
pub const CANONICAL_SEPARATOR: char = '_';

/// First value issued for a fresh (type, year) or (type, collection) key.
pub const FIRST_COUNTER_VALUE: u64 = 1;
