//! # Counter Store
//!
//! Two independent counter spaces, both keyed by type:
//! - year counters: (type, year)
//! - collection counters: (type, collection)
//!
//! A counter value is usable at most once per key. Counter rows are never
//! updated or deleted, so "the current value" of a key is simply the
//! highest value issued for it.
//!
//! Minting goes through `increment_counter`, which always allocates one
//! more than every existing value and therefore cannot collide. Reuse
//! failures only come from `insert_counter` with an explicit value.

use crate::dimensions::{ensure_id, find_id};
use crate::ledger::LedgerTxn;
use crate::primitives::FIRST_COUNTER_VALUE;
use crate::{AccessionError, CounterRow, CounterSpace, Dimension};

/// Look up the counter row for an exact (type, key, value) triple.
///
/// Never creates dimension rows.
pub fn get_counter<T: LedgerTxn>(
    txn: &T,
    space: CounterSpace,
    record_type: &str,
    key: &str,
    value: u64,
) -> Result<Option<CounterRow>, AccessionError> {
    let Some(type_id) = find_id(txn, Dimension::Type, record_type)? else {
        return Ok(None);
    };
    let Some(key_id) = find_id(txn, space.dimension(), key)? else {
        return Ok(None);
    };
    txn.find_counter(space, type_id, key_id, value)
}

/// Issue an explicit counter value for (type, key).
///
/// Creates the backing dimension rows if needed. Returns
/// `AccessionError::CounterReuse` if the value was already issued.
pub fn insert_counter<T: LedgerTxn>(
    txn: &mut T,
    space: CounterSpace,
    record_type: &str,
    key: &str,
    value: u64,
) -> Result<CounterRow, AccessionError> {
    let type_id = ensure_id(txn, Dimension::Type, record_type)?;
    let key_id = ensure_id(txn, space.dimension(), key)?;
    if txn.find_counter(space, type_id, key_id, value)?.is_some() {
        return Err(AccessionError::CounterReuse);
    }
    txn.insert_counter(space, type_id, key_id, value)
}

/// Issue the next counter value for (type, key): highest issued value + 1.
pub fn increment_counter<T: LedgerTxn>(
    txn: &mut T,
    space: CounterSpace,
    record_type: &str,
    key: &str,
) -> Result<CounterRow, AccessionError> {
    let type_id = ensure_id(txn, Dimension::Type, record_type)?;
    let key_id = ensure_id(txn, space.dimension(), key)?;
    let current = txn.max_counter(space, type_id, key_id)?;
    let next = if current == 0 {
        FIRST_COUNTER_VALUE
    } else {
        current
            .checked_add(1)
            .ok_or_else(|| AccessionError::Storage(format!("{} exhausted", space.relation())))?
    };
    insert_counter(txn, space, record_type, key, next)
}
