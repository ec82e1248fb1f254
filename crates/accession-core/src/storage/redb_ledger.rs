//! # redb-backed Ledger Storage
//!
//! A disk-backed ledger using the redb embedded database.
//!
//! redb provides:
//! - ACID transactions (one write transaction per workflow operation)
//! - Crash safety (copy-on-write B-trees)
//! - A single writer at a time, matching the ledger's serialized model
//!
//! ## Layout
//!
//! - `types`, `years`, `collections`: value -> id
//! - `year_counters`, `collection_counters`: (type id, key id, value) -> id
//! - `identifiers`: canonical -> postcard-encoded `Accession`
//! - `metadata`: relation name -> last id handed out
//!
//! Counter keys are tuples so the highest value for a (type, key) pair is
//! the last entry of a bounded range scan.

use crate::ledger::{LedgerStore, LedgerTxn};
use crate::{
    Accession, AccessionError, CounterId, CounterRow, CounterSpace, Dimension, DimensionId,
    LedgerStats,
};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use std::path::Path;

/// Table for type abbreviations: value -> id
const TYPES: TableDefinition<&str, u64> = TableDefinition::new("types");

/// Table for years (decimal value): value -> id
const YEARS: TableDefinition<&str, u64> = TableDefinition::new("years");

/// Table for collection codes: value -> id
const COLLECTIONS: TableDefinition<&str, u64> = TableDefinition::new("collections");

/// Table for year counters: (type_id, year_id, value) -> counter id
const YEAR_COUNTERS: TableDefinition<(u64, u64, u64), u64> =
    TableDefinition::new("year_counters");

/// Table for collection counters: (type_id, collection_id, value) -> counter id
const COLLECTION_COUNTERS: TableDefinition<(u64, u64, u64), u64> =
    TableDefinition::new("collection_counters");

/// Table for identifiers: canonical -> serialized Accession bytes
const IDENTIFIERS: TableDefinition<&str, &[u8]> = TableDefinition::new("identifiers");

/// Table for id sequences: relation name -> last id
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const fn dimension_table(dimension: Dimension) -> TableDefinition<'static, &'static str, u64> {
    match dimension {
        Dimension::Type => TYPES,
        Dimension::Year => YEARS,
        Dimension::Collection => COLLECTIONS,
    }
}

const fn counter_table(
    space: CounterSpace,
) -> TableDefinition<'static, (u64, u64, u64), u64> {
    match space {
        CounterSpace::Year => YEAR_COUNTERS,
        CounterSpace::Collection => COLLECTION_COUNTERS,
    }
}

fn storage(e: impl std::fmt::Display) -> AccessionError {
    AccessionError::Storage(e.to_string())
}

/// A disk-backed ledger using redb.
pub struct RedbLedger {
    /// The redb database handle.
    db: Database,
}

impl std::fmt::Debug for RedbLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbLedger").finish_non_exhaustive()
    }
}

impl RedbLedger {
    /// Open or create a ledger database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AccessionError> {
        let db = Database::create(path.as_ref()).map_err(storage)?;

        // Initialize tables if they don't exist
        let write_txn = db.begin_write().map_err(storage)?;
        create_tables(&write_txn)?;
        write_txn.commit().map_err(storage)?;

        Ok(Self { db })
    }

    /// Read-only statistics without opening a write transaction.
    pub fn stats(&self) -> Result<LedgerStats, AccessionError> {
        let read_txn = self.db.begin_read().map_err(storage)?;

        let dimension_len = |d: Dimension| -> Result<usize, AccessionError> {
            let table = read_txn.open_table(dimension_table(d)).map_err(storage)?;
            Ok(table.len().map_err(storage)? as usize)
        };
        let counter_len = |s: CounterSpace| -> Result<usize, AccessionError> {
            let table = read_txn.open_table(counter_table(s)).map_err(storage)?;
            Ok(table.len().map_err(storage)? as usize)
        };

        let identifiers = read_txn.open_table(IDENTIFIERS).map_err(storage)?;
        let mut circulating = 0;
        for entry in identifiers.iter().map_err(storage)? {
            let (_, value) = entry.map_err(storage)?;
            if decode(value.value())?.circulating {
                circulating += 1;
            }
        }

        Ok(LedgerStats {
            types: dimension_len(Dimension::Type)?,
            years: dimension_len(Dimension::Year)?,
            collections: dimension_len(Dimension::Collection)?,
            year_counters: counter_len(CounterSpace::Year)?,
            collection_counters: counter_len(CounterSpace::Collection)?,
            identifiers: identifiers.len().map_err(storage)? as usize,
            circulating,
        })
    }
}

fn create_tables(write_txn: &WriteTransaction) -> Result<(), AccessionError> {
    for dimension in Dimension::ALL {
        write_txn
            .open_table(dimension_table(dimension))
            .map_err(storage)?;
    }
    for space in CounterSpace::ALL {
        write_txn.open_table(counter_table(space)).map_err(storage)?;
    }
    write_txn.open_table(IDENTIFIERS).map_err(storage)?;
    write_txn.open_table(METADATA).map_err(storage)?;
    Ok(())
}

fn decode(bytes: &[u8]) -> Result<Accession, AccessionError> {
    postcard::from_bytes(bytes).map_err(|e| AccessionError::Serialization(e.to_string()))
}

fn encode(accession: &Accession) -> Result<Vec<u8>, AccessionError> {
    postcard::to_allocvec(accession).map_err(|e| AccessionError::Serialization(e.to_string()))
}

impl LedgerStore for RedbLedger {
    type Txn<'a> = RedbTxn;

    fn begin(&mut self) -> Result<RedbTxn, AccessionError> {
        let txn = self.db.begin_write().map_err(storage)?;
        Ok(RedbTxn { txn })
    }
}

// =============================================================================
// TRANSACTION
// =============================================================================

/// A redb write transaction over all ledger tables.
///
/// Dropping it without `commit` aborts every write.
pub struct RedbTxn {
    txn: WriteTransaction,
}

impl std::fmt::Debug for RedbTxn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbTxn").finish_non_exhaustive()
    }
}

impl RedbTxn {
    fn next_id(&mut self, relation: &'static str) -> Result<u64, AccessionError> {
        let mut meta = self.txn.open_table(METADATA).map_err(storage)?;
        let next = meta
            .get(relation)
            .map_err(storage)?
            .map(|v| v.value())
            .unwrap_or(0)
            .saturating_add(1);
        meta.insert(relation, next).map_err(storage)?;
        Ok(next)
    }
}

impl LedgerTxn for RedbTxn {
    fn find_dimension(
        &self,
        dimension: Dimension,
        value: &str,
    ) -> Result<Option<DimensionId>, AccessionError> {
        let table = self
            .txn
            .open_table(dimension_table(dimension))
            .map_err(storage)?;
        let id = table.get(value).map_err(storage)?.map(|v| DimensionId(v.value()));
        Ok(id)
    }

    fn insert_dimension(
        &mut self,
        dimension: Dimension,
        value: &str,
    ) -> Result<DimensionId, AccessionError> {
        if let Some(id) = self.find_dimension(dimension, value)? {
            return Ok(id);
        }
        let id = self.next_id(dimension.relation())?;
        let mut table = self
            .txn
            .open_table(dimension_table(dimension))
            .map_err(storage)?;
        table.insert(value, id).map_err(storage)?;
        Ok(DimensionId(id))
    }

    fn find_counter(
        &self,
        space: CounterSpace,
        type_id: DimensionId,
        key_id: DimensionId,
        value: u64,
    ) -> Result<Option<CounterRow>, AccessionError> {
        let table = self.txn.open_table(counter_table(space)).map_err(storage)?;
        let row = table
            .get((type_id.0, key_id.0, value))
            .map_err(storage)?
            .map(|id| CounterRow {
                id: CounterId(id.value()),
                space,
                type_id,
                key_id,
                value,
            });
        Ok(row)
    }

    fn max_counter(
        &self,
        space: CounterSpace,
        type_id: DimensionId,
        key_id: DimensionId,
    ) -> Result<u64, AccessionError> {
        let table = self.txn.open_table(counter_table(space)).map_err(storage)?;
        let last = table
            .range((type_id.0, key_id.0, 0u64)..=(type_id.0, key_id.0, u64::MAX))
            .map_err(storage)?
            .next_back();
        match last {
            Some(entry) => {
                let (key, _) = entry.map_err(storage)?;
                let (_, _, value) = key.value();
                Ok(value)
            }
            None => Ok(0),
        }
    }

    fn insert_counter(
        &mut self,
        space: CounterSpace,
        type_id: DimensionId,
        key_id: DimensionId,
        value: u64,
    ) -> Result<CounterRow, AccessionError> {
        if self.find_counter(space, type_id, key_id, value)?.is_some() {
            return Err(AccessionError::CounterReuse);
        }
        let id = self.next_id(space.relation())?;
        let mut table = self.txn.open_table(counter_table(space)).map_err(storage)?;
        table
            .insert((type_id.0, key_id.0, value), id)
            .map_err(storage)?;
        Ok(CounterRow {
            id: CounterId(id),
            space,
            type_id,
            key_id,
            value,
        })
    }

    fn find_identifier(&self, canonical: &str) -> Result<Option<Accession>, AccessionError> {
        let table = self.txn.open_table(IDENTIFIERS).map_err(storage)?;
        match table.get(canonical).map_err(storage)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn insert_identifier(&mut self, accession: &Accession) -> Result<(), AccessionError> {
        let bytes = encode(accession)?;
        let mut table = self.txn.open_table(IDENTIFIERS).map_err(storage)?;
        if table
            .get(accession.canonical.as_str())
            .map_err(storage)?
            .is_some()
        {
            return Err(AccessionError::Duplicate);
        }
        table
            .insert(accession.canonical.as_str(), bytes.as_slice())
            .map_err(storage)?;
        Ok(())
    }

    fn update_circulating(
        &mut self,
        canonical: &str,
        circulating: bool,
    ) -> Result<(), AccessionError> {
        let mut accession = self
            .find_identifier(canonical)?
            .ok_or(AccessionError::NotFound)?;
        accession.circulating = circulating;
        let bytes = encode(&accession)?;
        let mut table = self.txn.open_table(IDENTIFIERS).map_err(storage)?;
        table
            .insert(canonical, bytes.as_slice())
            .map_err(storage)?;
        Ok(())
    }

    fn stats(&self) -> Result<LedgerStats, AccessionError> {
        let mut stats = LedgerStats::default();
        for dimension in Dimension::ALL {
            let table = self
                .txn
                .open_table(dimension_table(dimension))
                .map_err(storage)?;
            let len = table.len().map_err(storage)? as usize;
            match dimension {
                Dimension::Type => stats.types = len,
                Dimension::Year => stats.years = len,
                Dimension::Collection => stats.collections = len,
            }
        }
        for space in CounterSpace::ALL {
            let table = self.txn.open_table(counter_table(space)).map_err(storage)?;
            let len = table.len().map_err(storage)? as usize;
            match space {
                CounterSpace::Year => stats.year_counters = len,
                CounterSpace::Collection => stats.collection_counters = len,
            }
        }
        let table = self.txn.open_table(IDENTIFIERS).map_err(storage)?;
        stats.identifiers = table.len().map_err(storage)? as usize;
        for entry in table.iter().map_err(storage)? {
            let (_, value) = entry.map_err(storage)?;
            if decode(value.value())?.circulating {
                stats.circulating += 1;
            }
        }
        Ok(stats)
    }

    fn clear(&mut self) -> Result<(), AccessionError> {
        for dimension in Dimension::ALL {
            self.txn
                .delete_table(dimension_table(dimension))
                .map_err(storage)?;
        }
        for space in CounterSpace::ALL {
            self.txn.delete_table(counter_table(space)).map_err(storage)?;
        }
        self.txn.delete_table(IDENTIFIERS).map_err(storage)?;
        self.txn.delete_table(METADATA).map_err(storage)?;
        create_tables(&self.txn)
    }

    fn commit(self) -> Result<(), AccessionError> {
        self.txn.commit().map_err(storage)
    }
}

// =============================================================================
// TESTS
// =============================================================================
