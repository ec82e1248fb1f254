//! # accession-core
//!
//! The accession number engine: parse, canonicalize, mint and record.
//!
//! An accession number has the shape `YYYY<type>NNN_<collection>NNN`, for
//! example `1900oh001_a001`. The two sequence numbers come from two
//! independent counter spaces, one per (type, year) and one per
//! (type, collection), and a value in either space is never issued twice.
//!
//! ## Layers
//!
//! - `parser` / `canonical`: pure string handling
//! - `ledger` / `storage`: the six relations behind `LedgerStore`
//! - `dimensions` / `counters` / `identifiers`: lookup-or-create rules
//! - `registry`: serialized, transactional operations
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - Every mutating operation is one storage transaction
//! - All errors are `AccessionError`; no panics on caller input

// =============================================================================
// MODULES
// =============================================================================

pub mod canonical;
pub mod counters;
pub mod dimensions;
pub mod identifiers;
pub mod ledger;
pub mod parser;
pub mod primitives;
pub mod registry;
pub mod session;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Accession, AccessionError, Components, CounterId, CounterRow, CounterSpace, Dimension,
    DimensionId, LedgerStats, Operation,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use canonical::canonicalize;
pub use ledger::{LedgerStore, LedgerTxn, MemoryLedger};
pub use parser::{ParsedAccession, normalize, parse};
pub use registry::Registry;
pub use session::StorageBackend;
pub use storage::RedbLedger;
