//! # Canonicalizer
//!
//! Deterministic rendering of accession number fields.
//!
//! Format: `<year:4+><type><year_count:3+>_<collection><collection_count:3+>`
//! where numeric fields are zero-padded to their minimum width and never
//! truncated.

use crate::primitives::{CANONICAL_SEPARATOR, SEQUENCE_WIDTH, YEAR_WIDTH};

/// Render the canonical form of an accession number.
///
/// `record_type` and `collection` are written verbatim.
#[must_use]
pub fn canonicalize(
    record_type: &str,
    year: u64,
    year_count: u64,
    collection: &str,
    collection_count: u64,
) -> String {
    format!(
        "{year:0yw$}{record_type}{year_count:0sw$}{CANONICAL_SEPARATOR}{collection}{collection_count:0sw$}",
        yw = YEAR_WIDTH,
        sw = SEQUENCE_WIDTH,
    )
}
