//! # Minting Workflow
//!
//! The public face of the ledger: mint, record, lookup, circulate, revoke.
//!
//! Every operation is one serialized unit. It takes the registry lock,
//! opens one storage transaction, performs all of its reads and writes,
//! and commits. The lock guard and the transaction are both scoped, so
//! every exit path (success, caller error, storage fault) releases the
//! lock, and an operation that fails before `commit` leaves no trace.

use crate::counters::{get_counter, increment_counter, insert_counter};
use crate::dimensions::ensure_id;
use crate::identifiers::{self, NewAccession};
use crate::ledger::{LedgerStore, LedgerTxn};
use crate::parser::{self, ParsedAccession};
use crate::{Accession, AccessionError, Components, CounterSpace, Dimension, LedgerStats};
use std::sync::{Mutex, MutexGuard};

/// The accession number registry.
///
/// Owns its storage; open it at startup and release it with
/// `into_inner` (or drop) at shutdown.
#[derive(Debug)]
pub struct Registry<S: LedgerStore> {
    store: Mutex<S>,
}

impl<S: LedgerStore + Default> Default for Registry<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: LedgerStore> Registry<S> {
    /// Create a registry over an opened store.
    pub fn new(store: S) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Close the registry and hand back the store.
    pub fn into_inner(self) -> S {
        self.store
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Acquire the exclusive ledger lock.
    ///
    /// A poisoned lock is recovered: the panicking operation never
    /// committed, so the store is still consistent.
    fn lock(&self) -> MutexGuard<'_, S> {
        self.store
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    /// Mint a new accession number with freshly allocated counters.
    ///
    /// `record_type` and `collection` must be letters and `year` digits;
    /// anything else fails with `Unparsable` before any write. The new
    /// number is circulating and its `as_submitted` is its canonical form.
    pub fn mint(
        &self,
        record_type: &str,
        year: &str,
        collection: &str,
    ) -> Result<Accession, AccessionError> {
        let record_type = parser::parse_code(record_type)?;
        let year = parser::parse_year(year)?;
        let collection = parser::parse_code(collection)?;

        let mut store = self.lock();
        let mut txn = store.begin()?;
        let accession = mint_in(&mut txn, &record_type, year, &collection)?;
        txn.commit()?;
        Ok(accession)
    }

    /// Record a pre-existing accession number from a legacy system.
    ///
    /// The submitted sequence values are issued verbatim. If either is
    /// already taken the whole operation fails with `CounterReuse` and
    /// neither counter is created.
    pub fn record(&self, raw: &str) -> Result<Accession, AccessionError> {
        let parsed = parser::parse(raw)?;
        // Counter values start at 1; a zero sequence could never be minted.
        if parsed.components.year_count == 0 || parsed.components.collection_count == 0 {
            return Err(AccessionError::Unparsable);
        }

        let mut store = self.lock();
        let mut txn = store.begin()?;
        let accession = record_in(&mut txn, &parsed)?;
        txn.commit()?;
        Ok(accession)
    }

    /// Look up an accession number. Never mutates state.
    pub fn lookup(&self, raw: &str) -> Result<Accession, AccessionError> {
        let canonical = parser::parse(raw)?.canonical();
        let mut store = self.lock();
        let txn = store.begin()?;
        // Dropping the transaction without commit is the read-only path.
        identifiers::get(&txn, &canonical)?.ok_or(AccessionError::NotFound)
    }

    /// Mark an accession number as circulating. Idempotent.
    pub fn circulate(&self, raw: &str) -> Result<Accession, AccessionError> {
        self.set_circulating(raw, true)
    }

    /// Mark an accession number as withdrawn. Idempotent.
    pub fn revoke(&self, raw: &str) -> Result<Accession, AccessionError> {
        self.set_circulating(raw, false)
    }

    fn set_circulating(&self, raw: &str, circulating: bool) -> Result<Accession, AccessionError> {
        let canonical = parser::parse(raw)?.canonical();
        let mut store = self.lock();
        let mut txn = store.begin()?;
        let accession = identifiers::set_circulating(&mut txn, &canonical, circulating)?;
        txn.commit()?;
        Ok(accession)
    }

    /// Delete every row of every relation. For test and seed tooling only.
    pub fn hard_reset(&self) -> Result<(), AccessionError> {
        let mut store = self.lock();
        let mut txn = store.begin()?;
        txn.clear()?;
        txn.commit()
    }

    /// Row counts per relation.
    pub fn stats(&self) -> Result<LedgerStats, AccessionError> {
        let mut store = self.lock();
        let txn = store.begin()?;
        txn.stats()
    }
}

// =============================================================================
// TRANSACTION BODIES
// =============================================================================

fn mint_in<T: LedgerTxn>(
    txn: &mut T,
    record_type: &str,
    year: u64,
    collection: &str,
) -> Result<Accession, AccessionError> {
    let year_key = year.to_string();
    let type_id = ensure_id(txn, Dimension::Type, record_type)?;
    let year_counter = increment_counter(txn, CounterSpace::Year, record_type, &year_key)?;
    let collection_counter =
        increment_counter(txn, CounterSpace::Collection, record_type, collection)?;

    let components = Components {
        year,
        record_type: record_type.to_string(),
        year_count: year_counter.value,
        collection: collection.to_string(),
        collection_count: collection_counter.value,
    };
    let canonical = components.canonical();
    identifiers::insert(
        txn,
        NewAccession {
            as_submitted: &canonical,
            canonical: canonical.clone(),
            components,
            type_id,
            year_counter,
            collection_counter,
            circulating: true,
        },
    )
}

fn record_in<T: LedgerTxn>(
    txn: &mut T,
    parsed: &ParsedAccession,
) -> Result<Accession, AccessionError> {
    let components = &parsed.components;
    let canonical = components.canonical();
    if identifiers::get(txn, &canonical)?.is_some() {
        return Err(AccessionError::Duplicate);
    }

    let record_type = components.record_type.as_str();
    let year_key = components.year_key();
    let year_taken = get_counter(
        txn,
        CounterSpace::Year,
        record_type,
        &year_key,
        components.year_count,
    )?;
    let collection_taken = get_counter(
        txn,
        CounterSpace::Collection,
        record_type,
        &components.collection,
        components.collection_count,
    )?;
    if year_taken.is_some() || collection_taken.is_some() {
        return Err(AccessionError::CounterReuse);
    }

    let type_id = ensure_id(txn, Dimension::Type, record_type)?;
    let year_counter = insert_counter(
        txn,
        CounterSpace::Year,
        record_type,
        &year_key,
        components.year_count,
    )?;
    let collection_counter = insert_counter(
        txn,
        CounterSpace::Collection,
        record_type,
        &components.collection,
        components.collection_count,
    )?;

    identifiers::insert(
        txn,
        NewAccession {
            canonical,
            as_submitted: parsed.as_submitted.trim(),
            components: components.clone(),
            type_id,
            year_counter,
            collection_counter,
            circulating: true,
        },
    )
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{MemoryLedger, MemoryTxn};
    use crate::{CounterId, CounterRow, DimensionId};
    use std::sync::Arc;

    fn registry() -> Registry<MemoryLedger> {
        Registry::default()
    }

    #[test]
    fn mint_first_and_second() {
        let registry = registry();
        let first = registry.mint("test", "1900", "a").expect("mint");
        let second = registry.mint("test", "1900", "a").expect("mint");
        assert_eq!(first.canonical, "1900test001_a001");
        assert_eq!(second.canonical, "1900test002_a002");
        assert!(first.circulating);
        assert_eq!(first.as_submitted, first.canonical);
    }

    #[test]
    fn mint_normalizes_arguments() {
        let registry = registry();
        let minted = registry.mint(" OH ", " 1950 ", "Mss").expect("mint");
        assert_eq!(minted.canonical, "1950oh001_mss001");
    }

    #[test]
    fn mint_rejects_malformed_arguments_without_writing() {
        let registry = registry();
        for (t, y, c) in [("", "1900", "a"), ("oh", "19x0", "a"), ("oh", "1900", "a1")] {
            assert!(matches!(
                registry.mint(t, y, c),
                Err(AccessionError::Unparsable)
            ));
        }
        assert_eq!(registry.stats().expect("stats"), LedgerStats::default());
    }

    #[test]
    fn mint_reports_internal_ids() {
        let registry = registry();
        let minted = registry.mint("oh", "1900", "a").expect("mint");
        assert_eq!(minted.type_id, DimensionId(1));
        assert_eq!(minted.year_id, DimensionId(1));
        assert_eq!(minted.collection_id, DimensionId(1));
        assert_eq!(minted.year_counter_id, CounterId(1));
        assert_eq!(minted.collection_counter_id, CounterId(1));
    }

    #[test]
    fn record_trims_as_submitted() {
        let registry = registry();
        let recorded = registry.record("  1899 OH/ 151 AB 9 Sess 3 \n").expect("record");
        assert_eq!(recorded.canonical, "1899oh151_ab009");
        assert_eq!(recorded.as_submitted, "1899 OH/ 151 AB 9 Sess 3");
    }

    #[test]
    fn record_ignores_heavy_padding() {
        let registry = registry();
        let padded = format!("1900oh1a1{}", " ".repeat(1100));
        let recorded = registry.record(&padded).expect("record");
        assert_eq!(recorded.canonical, "1900oh001_a001");
        assert_eq!(recorded.as_submitted, "1900oh1a1");
    }

    #[test]
    fn long_collection_codes_are_accepted() {
        let registry = registry();
        let collection = "a".repeat(65);

        let minted = registry.mint("oh", "1900", &collection).expect("mint");
        assert_eq!(minted.canonical, format!("1900oh001_{collection}001"));

        let recorded = registry
            .record(&format!("1900oh7{collection}9"))
            .expect("record");
        assert_eq!(recorded.components.collection, collection);
        assert_eq!(recorded.canonical, format!("1900oh007_{collection}009"));
    }

    #[test]
    fn record_duplicate_canonical() {
        let registry = registry();
        registry.record("1900oh5a5").expect("record");
        assert!(matches!(
            registry.record("1900 OH 005 A 005"),
            Err(AccessionError::Duplicate)
        ));
    }

    #[test]
    fn record_counter_reuse_is_all_or_nothing() {
        let registry = registry();
        registry.mint("test", "1900", "a").expect("mint");
        let before = registry.stats().expect("stats");

        // Year counter 001 is taken; collection counter 003 is not.
        let result = registry.record("1900test001_a003");
        assert!(matches!(result, Err(AccessionError::CounterReuse)));
        assert_eq!(registry.stats().expect("stats"), before);

        // Collection counter 003 was not consumed by the failed attempt.
        registry.record("1900test007_a003").expect("record");
    }

    #[test]
    fn record_collection_counter_reuse() {
        let registry = registry();
        registry.mint("test", "1900", "a").expect("mint");
        let result = registry.record("1900test009_a001");
        assert!(matches!(result, Err(AccessionError::CounterReuse)));
    }

    #[test]
    fn record_rejects_zero_sequences() {
        let registry = registry();
        assert!(matches!(
            registry.record("1900oh000_a001"),
            Err(AccessionError::Unparsable)
        ));
        assert!(matches!(
            registry.record("1900oh001_a000"),
            Err(AccessionError::Unparsable)
        ));
    }

    #[test]
    fn lookup_never_mutates() {
        let registry = registry();
        assert!(matches!(
            registry.lookup("1900oh001_a001"),
            Err(AccessionError::NotFound)
        ));
        assert_eq!(registry.stats().expect("stats"), LedgerStats::default());

        let minted = registry.mint("oh", "1900", "a").expect("mint");
        assert_eq!(registry.lookup("1900 oh 1 a 1").expect("lookup"), minted);
    }

    #[test]
    fn lookup_unparsable() {
        let registry = registry();
        assert!(matches!(
            registry.lookup("not a number"),
            Err(AccessionError::Unparsable)
        ));
    }

    #[test]
    fn revoke_and_circulate_are_idempotent() {
        let registry = registry();
        registry.mint("oh", "1900", "a").expect("mint");

        assert!(!registry.revoke("1900oh001_a001").expect("revoke").circulating);
        assert!(!registry.revoke("1900oh001_a001").expect("revoke").circulating);
        assert!(registry.circulate("1900oh001_a001").expect("circulate").circulating);
        assert!(registry.circulate("1900oh001_a001").expect("circulate").circulating);
    }

    #[test]
    fn revoke_missing_has_no_side_effects() {
        let registry = registry();
        registry.mint("oh", "1900", "a").expect("mint");
        let before = registry.stats().expect("stats");

        assert!(matches!(
            registry.revoke("1900test001_a003"),
            Err(AccessionError::NotFound)
        ));
        assert!(matches!(
            registry.circulate("1900test001_a003"),
            Err(AccessionError::NotFound)
        ));
        assert_eq!(registry.stats().expect("stats"), before);
    }

    #[test]
    fn lock_is_released_after_errors() {
        let registry = registry();
        assert!(registry.lookup("garbage").is_err());
        assert!(registry.revoke("1900oh001_a001").is_err());
        // Would deadlock if an error path kept the lock.
        registry.mint("oh", "1900", "a").expect("mint");
    }

    #[test]
    fn hard_reset_clears_everything() {
        let registry = registry();
        registry.mint("oh", "1900", "a").expect("mint");
        registry.hard_reset().expect("reset");
        assert_eq!(registry.stats().expect("stats"), LedgerStats::default());
        let again = registry.mint("oh", "1900", "a").expect("mint");
        assert_eq!(again.canonical, "1900oh001_a001");
    }

    #[test]
    fn concurrent_mints_never_repeat() {
        let registry = Arc::new(registry());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    (0..25)
                        .map(|_| registry.mint("oh", "1900", "a").expect("mint").canonical)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<String> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("join"))
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
        assert_eq!(registry.stats().expect("stats").identifiers, 200);
    }

    // =========================================================================
    // STORAGE FAULTS
    // =========================================================================

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Fault {
        SecondCounterInsert,
        Commit,
    }

    /// Memory ledger that fails the next transaction once a fault is armed.
    #[derive(Debug, Default)]
    struct FaultyLedger {
        inner: MemoryLedger,
        armed: Option<Fault>,
    }

    #[derive(Debug)]
    struct FaultyTxn<'a> {
        inner: MemoryTxn<'a>,
        armed: &'a mut Option<Fault>,
        counter_inserts: usize,
    }

    impl FaultyTxn<'_> {
        fn trip(&mut self, fault: Fault) -> Result<(), AccessionError> {
            if *self.armed == Some(fault) {
                *self.armed = None;
                return Err(AccessionError::Storage("disk unavailable".to_string()));
            }
            Ok(())
        }
    }

    impl LedgerStore for FaultyLedger {
        type Txn<'a> = FaultyTxn<'a>;

        fn begin(&mut self) -> Result<FaultyTxn<'_>, AccessionError> {
            Ok(FaultyTxn {
                inner: self.inner.begin()?,
                armed: &mut self.armed,
                counter_inserts: 0,
            })
        }
    }

    impl LedgerTxn for FaultyTxn<'_> {
        fn find_dimension(
            &self,
            dimension: Dimension,
            value: &str,
        ) -> Result<Option<DimensionId>, AccessionError> {
            self.inner.find_dimension(dimension, value)
        }

        fn insert_dimension(
            &mut self,
            dimension: Dimension,
            value: &str,
        ) -> Result<DimensionId, AccessionError> {
            self.inner.insert_dimension(dimension, value)
        }

        fn find_counter(
            &self,
            space: CounterSpace,
            type_id: DimensionId,
            key_id: DimensionId,
            value: u64,
        ) -> Result<Option<CounterRow>, AccessionError> {
            self.inner.find_counter(space, type_id, key_id, value)
        }

        fn max_counter(
            &self,
            space: CounterSpace,
            type_id: DimensionId,
            key_id: DimensionId,
        ) -> Result<u64, AccessionError> {
            self.inner.max_counter(space, type_id, key_id)
        }

        fn insert_counter(
            &mut self,
            space: CounterSpace,
            type_id: DimensionId,
            key_id: DimensionId,
            value: u64,
        ) -> Result<CounterRow, AccessionError> {
            self.counter_inserts += 1;
            if self.counter_inserts == 2 {
                self.trip(Fault::SecondCounterInsert)?;
            }
            self.inner.insert_counter(space, type_id, key_id, value)
        }

        fn find_identifier(&self, canonical: &str) -> Result<Option<Accession>, AccessionError> {
            self.inner.find_identifier(canonical)
        }

        fn insert_identifier(&mut self, accession: &Accession) -> Result<(), AccessionError> {
            self.inner.insert_identifier(accession)
        }

        fn update_circulating(
            &mut self,
            canonical: &str,
            circulating: bool,
        ) -> Result<(), AccessionError> {
            self.inner.update_circulating(canonical, circulating)
        }

        fn stats(&self) -> Result<LedgerStats, AccessionError> {
            self.inner.stats()
        }

        fn clear(&mut self) -> Result<(), AccessionError> {
            self.inner.clear()
        }

        fn commit(mut self) -> Result<(), AccessionError> {
            self.trip(Fault::Commit)?;
            self.inner.commit()
        }
    }

    #[test]
    fn storage_fault_leaves_no_trace_and_releases_lock() {
        for fault in [Fault::SecondCounterInsert, Fault::Commit] {
            let registry = Registry::new(FaultyLedger::default());
            registry.mint("test", "1900", "a").expect("mint");
            let before = registry.stats().expect("stats");

            registry.lock().armed = Some(fault);
            let minted = registry.mint("test", "1900", "a");
            assert!(matches!(minted, Err(AccessionError::Storage(_))), "{fault:?}");
            assert_eq!(registry.stats().expect("stats"), before, "{fault:?}");

            registry.lock().armed = Some(fault);
            let recorded = registry.record("1900test005_b005");
            assert!(matches!(recorded, Err(AccessionError::Storage(_))), "{fault:?}");
            assert_eq!(registry.stats().expect("stats"), before, "{fault:?}");

            // Nothing was consumed and the lock is free again.
            let next = registry.mint("test", "1900", "a").expect("mint");
            assert_eq!(next.canonical, "1900test002_a002");
            registry.record("1900test005_b005").expect("record");
        }
    }

    #[test]
    fn storage_fault_during_status_change_keeps_flag() {
        let registry = Registry::new(FaultyLedger::default());
        registry.mint("oh", "1900", "a").expect("mint");

        registry.lock().armed = Some(Fault::Commit);
        assert!(matches!(
            registry.revoke("1900oh001_a001"),
            Err(AccessionError::Storage(_))
        ));
        assert!(registry.lookup("1900oh001_a001").expect("lookup").circulating);
    }

    #[test]
    fn into_inner_returns_store() {
        let registry = registry();
        registry.mint("oh", "1900", "a").expect("mint");
        let ledger = registry.into_inner();
        assert_eq!(ledger.identifiers().count(), 1);
    }
}
