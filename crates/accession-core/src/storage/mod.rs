//! # Persistent Storage
//!
//! Disk-backed ledger implementations.

mod redb_ledger;

pub use redb_ledger::{RedbLedger, RedbTxn};
