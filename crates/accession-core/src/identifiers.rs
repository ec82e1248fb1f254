//! # Identifier Store
//!
//! Durable record of every canonical accession number, the counters it
//! was issued from, and its `circulating` flag.
//!
//! Rows are created once (by minting or recording). Only `circulating`
//! ever changes afterwards.

use crate::ledger::LedgerTxn;
use crate::{Accession, AccessionError, Components, CounterRow, DimensionId};

/// Everything needed to create an identifier row.
#[derive(Debug, Clone)]
pub struct NewAccession<'a> {
    pub canonical: String,
    pub as_submitted: &'a str,
    pub components: Components,
    pub type_id: DimensionId,
    pub year_counter: CounterRow,
    pub collection_counter: CounterRow,
    pub circulating: bool,
}

/// Look up an identifier row by canonical string.
pub fn get<T: LedgerTxn>(txn: &T, canonical: &str) -> Result<Option<Accession>, AccessionError> {
    txn.find_identifier(canonical)
}

/// Create an identifier row and return it.
///
/// Returns `AccessionError::Duplicate` if the canonical string exists.
pub fn insert<T: LedgerTxn>(
    txn: &mut T,
    new: NewAccession<'_>,
) -> Result<Accession, AccessionError> {
    let accession = Accession {
        canonical: new.canonical,
        as_submitted: new.as_submitted.to_string(),
        components: new.components,
        type_id: new.type_id,
        year_id: new.year_counter.key_id,
        collection_id: new.collection_counter.key_id,
        year_counter_id: new.year_counter.id,
        collection_counter_id: new.collection_counter.id,
        circulating: new.circulating,
    };
    txn.insert_identifier(&accession)?;
    Ok(accession)
}

/// Set the `circulating` flag of an existing row.
///
/// No write happens if the flag already has the requested value.
/// Returns `AccessionError::NotFound` if the row does not exist.
pub fn set_circulating<T: LedgerTxn>(
    txn: &mut T,
    canonical: &str,
    circulating: bool,
) -> Result<Accession, AccessionError> {
    let mut accession = get(txn, canonical)?.ok_or(AccessionError::NotFound)?;
    if accession.circulating != circulating {
        txn.update_circulating(canonical, circulating)?;
        accession.circulating = circulating;
    }
    Ok(accession)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::increment_counter;
    use crate::dimensions::ensure_id;
    use crate::ledger::{LedgerStore, MemoryLedger};
    use crate::{CounterSpace, Dimension};

    fn mint_row<T: LedgerTxn>(txn: &mut T) -> Accession {
        let components = Components {
            year: 1900,
            record_type: "oh".to_string(),
            year_count: 1,
            collection: "a".to_string(),
            collection_count: 1,
        };
        let type_id = ensure_id(txn, Dimension::Type, "oh").expect("type");
        let year_counter = increment_counter(txn, CounterSpace::Year, "oh", "1900").expect("y");
        let collection_counter =
            increment_counter(txn, CounterSpace::Collection, "oh", "a").expect("c");
        let canonical = components.canonical();
        insert(
            txn,
            NewAccession {
                canonical: canonical.clone(),
                as_submitted: &canonical,
                components,
                type_id,
                year_counter,
                collection_counter,
                circulating: true,
            },
        )
        .expect("insert")
    }

    #[test]
    fn insert_links_counters_and_dimensions() {
        let mut ledger = MemoryLedger::new();
        let mut txn = ledger.begin().expect("begin");

        let row = mint_row(&mut txn);
        assert_eq!(row.canonical, "1900oh001_a001");
        assert_eq!(row.type_id, DimensionId(1));
        assert_eq!(row.year_id, DimensionId(1));
        assert_eq!(row.collection_id, DimensionId(1));
        assert_eq!(get(&txn, "1900oh001_a001").expect("get"), Some(row));
    }

    #[test]
    fn set_circulating_is_idempotent() {
        let mut ledger = MemoryLedger::new();
        let mut txn = ledger.begin().expect("begin");
        mint_row(&mut txn);

        let once = set_circulating(&mut txn, "1900oh001_a001", false).expect("revoke");
        let twice = set_circulating(&mut txn, "1900oh001_a001", false).expect("revoke");
        assert!(!once.circulating);
        assert_eq!(once, twice);

        let back = set_circulating(&mut txn, "1900oh001_a001", true).expect("circulate");
        assert!(back.circulating);
    }

    #[test]
    fn set_circulating_missing_row() {
        let mut ledger = MemoryLedger::new();
        let mut txn = ledger.begin().expect("begin");
        let result = set_circulating(&mut txn, "1900oh001_a001", true);
        assert!(matches!(result, Err(AccessionError::NotFound)));
    }
}
