//! # Core Type Definitions
//!
//! This module contains all core types for the accession ledger:
//! - Surrogate identifiers (`DimensionId`, `CounterId`)
//! - Relation selectors (`Dimension`, `CounterSpace`)
//! - Structured accession numbers (`Components`, `Accession`)
//! - Counter rows and ledger statistics
//! - Error types (`AccessionError`)
//!
//! ## Ordering Guarantees
//!
//! All identifier and selector types implement `Ord` so they can key
//! `BTreeMap`/`BTreeSet` relations deterministically.

use crate::canonical::canonicalize;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// SURROGATE IDENTIFIERS
// =============================================================================

/// Surrogate id of a Type, Year or Collection row.
///
/// Ids are allocated from 1 upward, per relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DimensionId(pub u64);

/// Surrogate id of a YearCounter or CollectionCounter row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CounterId(pub u64);

// =============================================================================
// RELATION SELECTORS
// =============================================================================

/// A lookup-or-create dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Type,
    Year,
    Collection,
}

impl Dimension {
    /// Every dimension, in relation order.
    pub const ALL: [Self; 3] = [Self::Type, Self::Year, Self::Collection];

    /// Relation name, also used as the redb table name.
    #[must_use]
    pub const fn relation(self) -> &'static str {
        match self {
            Self::Type => "types",
            Self::Year => "years",
            Self::Collection => "collections",
        }
    }
}

/// One of the two independent counter spaces. Both are keyed by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CounterSpace {
    /// Counters scoped to (type, year).
    Year,
    /// Counters scoped to (type, collection).
    Collection,
}

impl CounterSpace {
    pub const ALL: [Self; 2] = [Self::Year, Self::Collection];

    /// The dimension that keys this space alongside the type.
    #[must_use]
    pub const fn dimension(self) -> Dimension {
        match self {
            Self::Year => Dimension::Year,
            Self::Collection => Dimension::Collection,
        }
    }

    /// Relation name, also used as the redb table name.
    #[must_use]
    pub const fn relation(self) -> &'static str {
        match self {
            Self::Year => "year_counters",
            Self::Collection => "collection_counters",
        }
    }
}

// =============================================================================
// COUNTER ROW
// =============================================================================

/// A single issued counter value. Counter rows are append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRow {
    pub id: CounterId,
    pub space: CounterSpace,
    pub type_id: DimensionId,
    /// Year id or collection id, depending on `space`.
    pub key_id: DimensionId,
    pub value: u64,
}

// =============================================================================
// COMPONENTS
// =============================================================================

/// The five structured fields of an accession number.
///
/// `record_type` and `collection` are lowercase ASCII letters. Numeric
/// fields hold their numeric value; the canonical rendering pads them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Components {
    pub year: u64,
    pub record_type: String,
    pub year_count: u64,
    pub collection: String,
    pub collection_count: u64,
}

impl Components {
    /// Render the canonical string for these fields.
    #[must_use]
    pub fn canonical(&self) -> String {
        canonicalize(
            &self.record_type,
            self.year,
            self.year_count,
            &self.collection,
            self.collection_count,
        )
    }

    /// Decimal rendering of the year, as stored in the Year dimension.
    #[must_use]
    pub fn year_key(&self) -> String {
        self.year.to_string()
    }
}

// =============================================================================
// ACCESSION (IDENTIFIER ROW)
// =============================================================================

/// A stored accession number.
///
/// Everything except `circulating` is fixed when the row is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accession {
    /// Canonical rendering; the primary key.
    pub canonical: String,
    /// The rendering originally submitted (trimmed), or the canonical
    /// rendering for minted numbers.
    pub as_submitted: String,
    pub components: Components,
    pub type_id: DimensionId,
    pub year_id: DimensionId,
    pub collection_id: DimensionId,
    pub year_counter_id: CounterId,
    pub collection_counter_id: CounterId,
    pub circulating: bool,
}

// =============================================================================
// LEDGER STATISTICS
// =============================================================================

/// Row counts per relation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub types: usize,
    pub years: usize,
    pub collections: usize,
    pub year_counters: usize,
    pub collection_counters: usize,
    pub identifiers: usize,
    pub circulating: usize,
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// The public workflow operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Mint,
    Record,
    Lookup,
    Circulate,
    Revoke,
    Reset,
}

impl Operation {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mint => "mint",
            Self::Record => "record",
            Self::Lookup => "lookup",
            Self::Circulate => "circulate",
            Self::Revoke => "revoke",
            Self::Reset => "reset",
        }
    }

    /// Generic message surfaced to callers when storage fails mid-operation.
    #[must_use]
    pub const fn fault_message(self) -> &'static str {
        match self {
            Self::Mint => "An accession number cannot be minted.",
            _ => "The accession number cannot be processed.",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors returned by the accession ledger.
///
/// The first four variants are caller errors and display the exact
/// messages existing consumers match on. `Storage` and `Serialization`
/// are storage faults: the operation is aborted and nothing is committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessionError {
    /// The input does not match the accession number structure.
    #[error("The accession number submitted cannot be parsed.")]
    Unparsable,

    /// A record request targets a canonical number that is already stored.
    #[error("That accession number already exists.")]
    Duplicate,

    /// A record request names a year or collection counter already issued.
    #[error("The year and collection counters cannot be reused.")]
    CounterReuse,

    /// The requested accession number is not stored.
    #[error("No such accession number exists.")]
    NotFound,

    /// The storage layer failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AccessionError {
    /// True for storage faults, false for caller errors.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Serialization(_))
    }

    /// The message a caller of `op` should see.
    ///
    /// Caller errors keep their own message; storage faults collapse to the
    /// operation's generic message so internals never leak.
    #[must_use]
    pub fn public_message(&self, op: Operation) -> String {
        if self.is_fault() {
            op.fault_message().to_string()
        } else {
            self.to_string()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
