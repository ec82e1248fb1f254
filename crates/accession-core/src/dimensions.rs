//! # Dimension Registry
//!
//! Lookup-or-create mapping from raw values (type abbreviation, year,
//! collection code) to durable surrogate ids.
//!
//! Rows are created lazily on first reference and only removed by a full
//! reset. Idempotence relies on the caller holding the ledger lock.

use crate::ledger::LedgerTxn;
use crate::{AccessionError, Dimension, DimensionId};

/// Return the id for `value`, inserting a row if none exists.
pub fn ensure_id<T: LedgerTxn>(
    txn: &mut T,
    dimension: Dimension,
    value: &str,
) -> Result<DimensionId, AccessionError> {
    match txn.find_dimension(dimension, value)? {
        Some(id) => Ok(id),
        None => txn.insert_dimension(dimension, value),
    }
}

/// Return the id for `value` without creating anything.
pub fn find_id<T: LedgerTxn>(
    txn: &T,
    dimension: Dimension,
    value: &str,
) -> Result<Option<DimensionId>, AccessionError> {
    txn.find_dimension(dimension, value)
}
