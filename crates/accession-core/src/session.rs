//! # Storage Backends
//!
//! Runtime selection between the in-memory and the redb ledger.
//!
//! - `InMemory`: uses `MemoryLedger` (fast, volatile)
//! - `Persistent`: uses `RedbLedger` for disk-backed ACID storage

use crate::ledger::{LedgerStore, LedgerTxn, MemoryLedger, MemoryTxn};
use crate::storage::{RedbLedger, RedbTxn};
use crate::{
    Accession, AccessionError, CounterRow, CounterSpace, Dimension, DimensionId, LedgerStats,
};
use std::path::Path;

/// Storage backend for a `Registry`.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory ledger (fast, volatile).
    InMemory(MemoryLedger),
    /// Disk-backed ledger using redb (ACID, persistent).
    Persistent(RedbLedger),
}

// NOTE: StorageBackend does NOT implement Clone.
// RedbLedger (database handle) cannot be safely cloned.

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryLedger::new())
    }
}

impl StorageBackend {
    /// Create an empty in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open or create a redb ledger at the given path.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, AccessionError> {
        Ok(Self::Persistent(RedbLedger::open(path)?))
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Persistent(_))
    }

    /// Short backend name for logs and status output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::InMemory(_) => "memory",
            Self::Persistent(_) => "redb",
        }
    }
}

impl LedgerStore for StorageBackend {
    type Txn<'a> = BackendTxn<'a>;

    fn begin(&mut self) -> Result<BackendTxn<'_>, AccessionError> {
        match self {
            Self::InMemory(ledger) => Ok(BackendTxn::InMemory(ledger.begin()?)),
            Self::Persistent(ledger) => Ok(BackendTxn::Persistent(ledger.begin()?)),
        }
    }
}

/// A transaction on either backend.
#[derive(Debug)]
pub enum BackendTxn<'a> {
    InMemory(MemoryTxn<'a>),
    Persistent(RedbTxn),
}

/// Forward a call to whichever transaction is active.
macro_rules! delegate {
    ($self:ident, $txn:ident => $call:expr) => {
        match $self {
            BackendTxn::InMemory($txn) => $call,
            BackendTxn::Persistent($txn) => $call,
        }
    };
}

impl LedgerTxn for BackendTxn<'_> {
    fn find_dimension(
        &self,
        dimension: Dimension,
        value: &str,
    ) -> Result<Option<DimensionId>, AccessionError> {
        delegate!(self, txn => txn.find_dimension(dimension, value))
    }

    fn insert_dimension(
        &mut self,
        dimension: Dimension,
        value: &str,
    ) -> Result<DimensionId, AccessionError> {
        delegate!(self, txn => txn.insert_dimension(dimension, value))
    }

    fn find_counter(
        &self,
        space: CounterSpace,
        type_id: DimensionId,
        key_id: DimensionId,
        value: u64,
    ) -> Result<Option<CounterRow>, AccessionError> {
        delegate!(self, txn => txn.find_counter(space, type_id, key_id, value))
    }

    fn max_counter(
        &self,
        space: CounterSpace,
        type_id: DimensionId,
        key_id: DimensionId,
    ) -> Result<u64, AccessionError> {
        delegate!(self, txn => txn.max_counter(space, type_id, key_id))
    }

    fn insert_counter(
        &mut self,
        space: CounterSpace,
        type_id: DimensionId,
        key_id: DimensionId,
        value: u64,
    ) -> Result<CounterRow, AccessionError> {
        delegate!(self, txn => txn.insert_counter(space, type_id, key_id, value))
    }

    fn find_identifier(&self, canonical: &str) -> Result<Option<Accession>, AccessionError> {
        delegate!(self, txn => txn.find_identifier(canonical))
    }

    fn insert_identifier(&mut self, accession: &Accession) -> Result<(), AccessionError> {
        delegate!(self, txn => txn.insert_identifier(accession))
    }

    fn update_circulating(
        &mut self,
        canonical: &str,
        circulating: bool,
    ) -> Result<(), AccessionError> {
        delegate!(self, txn => txn.update_circulating(canonical, circulating))
    }

    fn stats(&self) -> Result<LedgerStats, AccessionError> {
        delegate!(self, txn => txn.stats())
    }

    fn clear(&mut self) -> Result<(), AccessionError> {
        delegate!(self, txn => txn.clear())
    }

    fn commit(self) -> Result<(), AccessionError> {
        delegate!(self, txn => txn.commit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_backend_is_in_memory() {
        let backend = StorageBackend::default();
        assert!(!backend.is_persistent());
        assert_eq!(backend.name(), "memory");
    }

    #[test]
    fn redb_backend_is_persistent() {
        let temp = tempdir().expect("temp dir");
        let backend = StorageBackend::with_redb(temp.path().join("ledger.redb")).expect("open");
        assert!(backend.is_persistent());
        assert_eq!(backend.name(), "redb");
    }

    #[test]
    fn both_backends_commit_through_the_enum() {
        let temp = tempdir().expect("temp dir");
        let backends = [
            StorageBackend::in_memory(),
            StorageBackend::with_redb(temp.path().join("ledger.redb")).expect("open"),
        ];

        for mut backend in backends {
            let mut txn = backend.begin().expect("begin");
            txn.insert_dimension(Dimension::Type, "oh").expect("insert");
            txn.commit().expect("commit");

            let txn = backend.begin().expect("begin");
            assert_eq!(txn.stats().expect("stats").types, 1, "{}", backend_name(&txn));
        }
    }

    fn backend_name(txn: &BackendTxn<'_>) -> &'static str {
        match txn {
            BackendTxn::InMemory(_) => "memory",
            BackendTxn::Persistent(_) => "redb",
        }
    }
}
