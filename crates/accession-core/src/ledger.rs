//! # Ledger Storage Interface
//!
//! The six relations of the accession ledger, expressed as a transactional
//! storage interface, plus the in-memory implementation.
//!
//! A `LedgerTxn` is the unit of atomicity: every write made through it is
//! either committed together or discarded when the transaction is dropped.
//! Higher-level rules (lookup-or-create, counter increment, reuse checks)
//! live in `dimensions`, `counters` and `identifiers`; this module only
//! provides the relations.

use crate::{
    Accession, AccessionError, CounterId, CounterRow, CounterSpace, Dimension, DimensionId,
    LedgerStats,
};
use std::collections::BTreeMap;

// =============================================================================
// LEDGER TRAITS
// =============================================================================

/// A storage backend that can open ledger transactions.
pub trait LedgerStore {
    /// The transaction type. It may borrow the store mutably.
    type Txn<'a>: LedgerTxn
    where
        Self: 'a;

    /// Begin a transaction covering all six relations.
    fn begin(&mut self) -> Result<Self::Txn<'_>, AccessionError>;
}

/// Relation-level operations inside one transaction.
///
/// All fallible operations return `Result<T, AccessionError>` so the
/// in-memory and persistent backends behave uniformly.
pub trait LedgerTxn {
    /// Look up the id of a dimension row by value.
    fn find_dimension(
        &self,
        dimension: Dimension,
        value: &str,
    ) -> Result<Option<DimensionId>, AccessionError>;

    /// Insert a new dimension row and return its id.
    ///
    /// Callers must check `find_dimension` first; inserting an existing
    /// value returns the existing id.
    fn insert_dimension(
        &mut self,
        dimension: Dimension,
        value: &str,
    ) -> Result<DimensionId, AccessionError>;

    /// Look up the counter row for an exact (type, key, value) triple.
    fn find_counter(
        &self,
        space: CounterSpace,
        type_id: DimensionId,
        key_id: DimensionId,
        value: u64,
    ) -> Result<Option<CounterRow>, AccessionError>;

    /// Highest value issued for (type, key), or 0 if none.
    fn max_counter(
        &self,
        space: CounterSpace,
        type_id: DimensionId,
        key_id: DimensionId,
    ) -> Result<u64, AccessionError>;

    /// Insert a counter row if the triple is not already present.
    ///
    /// Returns `AccessionError::CounterReuse` if it is.
    fn insert_counter(
        &mut self,
        space: CounterSpace,
        type_id: DimensionId,
        key_id: DimensionId,
        value: u64,
    ) -> Result<CounterRow, AccessionError>;

    /// Look up an identifier row by canonical string.
    fn find_identifier(&self, canonical: &str) -> Result<Option<Accession>, AccessionError>;

    /// Insert an identifier row.
    ///
    /// Returns `AccessionError::Duplicate` if the canonical string exists.
    fn insert_identifier(&mut self, accession: &Accession) -> Result<(), AccessionError>;

    /// Overwrite the `circulating` flag of an existing identifier row.
    ///
    /// Returns `AccessionError::NotFound` if the row does not exist.
    fn update_circulating(
        &mut self,
        canonical: &str,
        circulating: bool,
    ) -> Result<(), AccessionError>;

    /// Row counts per relation.
    fn stats(&self) -> Result<LedgerStats, AccessionError>;

    /// Delete every row of every relation and reset id sequences.
    fn clear(&mut self) -> Result<(), AccessionError>;

    /// Make every write of this transaction durable.
    fn commit(self) -> Result<(), AccessionError>
    where
        Self: Sized;
}

// =============================================================================
// IN-MEMORY LEDGER
// =============================================================================

/// Counter key: (type id, year/collection id, value).
type CounterKey = (u64, u64, u64);

/// The in-memory ledger.
///
/// Uses `BTreeMap` exclusively for deterministic ordering.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    /// Dimension -> value -> id
    dimensions: BTreeMap<Dimension, BTreeMap<String, DimensionId>>,

    /// Counter space -> (type, key, value) -> id
    counters: BTreeMap<CounterSpace, BTreeMap<CounterKey, CounterId>>,

    /// Canonical -> identifier row
    identifiers: BTreeMap<String, Accession>,

    /// Relation name -> last id handed out
    sequences: BTreeMap<&'static str, u64>,
}

impl MemoryLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All identifier rows in canonical order.
    pub fn identifiers(&self) -> impl Iterator<Item = &Accession> {
        self.identifiers.values()
    }

    fn next_id(&mut self, relation: &'static str) -> u64 {
        let next = self.sequences.get(relation).copied().unwrap_or(0).saturating_add(1);
        self.sequences.insert(relation, next);
        next
    }

    fn find_dimension(&self, dimension: Dimension, value: &str) -> Option<DimensionId> {
        self.dimensions
            .get(&dimension)
            .and_then(|rows| rows.get(value))
            .copied()
    }

    fn insert_dimension(&mut self, dimension: Dimension, value: &str) -> DimensionId {
        if let Some(id) = self.find_dimension(dimension, value) {
            return id;
        }
        let id = DimensionId(self.next_id(dimension.relation()));
        self.dimensions
            .entry(dimension)
            .or_default()
            .insert(value.to_string(), id);
        id
    }

    fn find_counter(
        &self,
        space: CounterSpace,
        type_id: DimensionId,
        key_id: DimensionId,
        value: u64,
    ) -> Option<CounterRow> {
        self.counters
            .get(&space)
            .and_then(|rows| rows.get(&(type_id.0, key_id.0, value)))
            .map(|&id| CounterRow {
                id,
                space,
                type_id,
                key_id,
                value,
            })
    }

    fn max_counter(&self, space: CounterSpace, type_id: DimensionId, key_id: DimensionId) -> u64 {
        self.counters
            .get(&space)
            .and_then(|rows| {
                rows.range((type_id.0, key_id.0, 0)..=(type_id.0, key_id.0, u64::MAX))
                    .next_back()
            })
            .map(|((_, _, value), _)| *value)
            .unwrap_or(0)
    }

    fn insert_counter(
        &mut self,
        space: CounterSpace,
        type_id: DimensionId,
        key_id: DimensionId,
        value: u64,
    ) -> Result<CounterRow, AccessionError> {
        if self.find_counter(space, type_id, key_id, value).is_some() {
            return Err(AccessionError::CounterReuse);
        }
        let id = CounterId(self.next_id(space.relation()));
        self.counters
            .entry(space)
            .or_default()
            .insert((type_id.0, key_id.0, value), id);
        Ok(CounterRow {
            id,
            space,
            type_id,
            key_id,
            value,
        })
    }

    fn stats(&self) -> LedgerStats {
        let dimension_len = |d: Dimension| self.dimensions.get(&d).map_or(0, BTreeMap::len);
        let counter_len = |s: CounterSpace| self.counters.get(&s).map_or(0, BTreeMap::len);
        LedgerStats {
            types: dimension_len(Dimension::Type),
            years: dimension_len(Dimension::Year),
            collections: dimension_len(Dimension::Collection),
            year_counters: counter_len(CounterSpace::Year),
            collection_counters: counter_len(CounterSpace::Collection),
            identifiers: self.identifiers.len(),
            circulating: self.identifiers.values().filter(|a| a.circulating).count(),
        }
    }
}

impl LedgerStore for MemoryLedger {
    type Txn<'a> = MemoryTxn<'a>;

    fn begin(&mut self) -> Result<MemoryTxn<'_>, AccessionError> {
        let working = self.clone();
        Ok(MemoryTxn {
            target: self,
            working,
        })
    }
}

/// A transaction over a `MemoryLedger`.
///
/// Writes go to a private copy that replaces the ledger on `commit`.
/// Dropping the transaction discards the copy.
///
/// `begin` copies the whole ledger, so every operation (reads included)
/// costs O(rows). Fine for tests and volatile runs, not for large ledgers.
#[derive(Debug)]
pub struct MemoryTxn<'a> {
    target: &'a mut MemoryLedger,
    working: MemoryLedger,
}

impl LedgerTxn for MemoryTxn<'_> {
    fn find_dimension(
        &self,
        dimension: Dimension,
        value: &str,
    ) -> Result<Option<DimensionId>, AccessionError> {
        Ok(self.working.find_dimension(dimension, value))
    }

    fn insert_dimension(
        &mut self,
        dimension: Dimension,
        value: &str,
    ) -> Result<DimensionId, AccessionError> {
        Ok(self.working.insert_dimension(dimension, value))
    }

    fn find_counter(
        &self,
        space: CounterSpace,
        type_id: DimensionId,
        key_id: DimensionId,
        value: u64,
    ) -> Result<Option<CounterRow>, AccessionError> {
        Ok(self.working.find_counter(space, type_id, key_id, value))
    }

    fn max_counter(
        &self,
        space: CounterSpace,
        type_id: DimensionId,
        key_id: DimensionId,
    ) -> Result<u64, AccessionError> {
        Ok(self.working.max_counter(space, type_id, key_id))
    }

    fn insert_counter(
        &mut self,
        space: CounterSpace,
        type_id: DimensionId,
        key_id: DimensionId,
        value: u64,
    ) -> Result<CounterRow, AccessionError> {
        self.working.insert_counter(space, type_id, key_id, value)
    }

    fn find_identifier(&self, canonical: &str) -> Result<Option<Accession>, AccessionError> {
        Ok(self.working.identifiers.get(canonical).cloned())
    }

    fn insert_identifier(&mut self, accession: &Accession) -> Result<(), AccessionError> {
        if self.working.identifiers.contains_key(&accession.canonical) {
            return Err(AccessionError::Duplicate);
        }
        self.working
            .identifiers
            .insert(accession.canonical.clone(), accession.clone());
        Ok(())
    }

    fn update_circulating(
        &mut self,
        canonical: &str,
        circulating: bool,
    ) -> Result<(), AccessionError> {
        let row = self
            .working
            .identifiers
            .get_mut(canonical)
            .ok_or(AccessionError::NotFound)?;
        row.circulating = circulating;
        Ok(())
    }

    fn stats(&self) -> Result<LedgerStats, AccessionError> {
        Ok(self.working.stats())
    }

    fn clear(&mut self) -> Result<(), AccessionError> {
        self.working = MemoryLedger::new();
        Ok(())
    }

    fn commit(self) -> Result<(), AccessionError> {
        *self.target = self.working;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
