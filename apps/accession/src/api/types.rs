//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use accession_core::{Accession, AccessionError, LedgerStats, Operation};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Ledger status response: row counts per relation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub backend: String,
    pub types: usize,
    pub years: usize,
    pub collections: usize,
    pub year_counters: usize,
    pub collection_counters: usize,
    pub identifiers: usize,
    pub circulating: usize,
}

impl StatusResponse {
    pub fn new(backend: &str, stats: &LedgerStats) -> Self {
        Self {
            backend: backend.to_string(),
            types: stats.types,
            years: stats.years,
            collections: stats.collections,
            year_counters: stats.year_counters,
            collection_counters: stats.collection_counters,
            identifiers: stats.identifiers,
            circulating: stats.circulating,
        }
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Mint request. `type` defaults to the standard record type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintRequest {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    pub year: String,
    pub collection: String,
}

/// Request naming an existing (or legacy) accession number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessionRequest {
    pub accession_number: String,
}

// =============================================================================
// ACCESSION RESPONSE
// =============================================================================

/// JSON rendering of a stored accession number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessionJson {
    pub canonical: String,
    pub as_submitted: String,
    pub circulating: bool,
    #[serde(rename = "type")]
    pub record_type: String,
    pub year: u64,
    pub year_count: u64,
    pub collection: String,
    pub collection_count: u64,
    pub type_id: u64,
    pub year_id: u64,
    pub collection_id: u64,
    pub year_counter_id: u64,
    pub collection_counter_id: u64,
}

impl From<&Accession> for AccessionJson {
    fn from(accession: &Accession) -> Self {
        let c = &accession.components;
        Self {
            canonical: accession.canonical.clone(),
            as_submitted: accession.as_submitted.clone(),
            circulating: accession.circulating,
            record_type: c.record_type.clone(),
            year: c.year,
            year_count: c.year_count,
            collection: c.collection.clone(),
            collection_count: c.collection_count,
            type_id: accession.type_id.0,
            year_id: accession.year_id.0,
            collection_id: accession.collection_id.0,
            year_counter_id: accession.year_counter_id.0,
            collection_counter_id: accession.collection_counter_id.0,
        }
    }
}

/// Response of every accession operation.
///
/// Success flattens the accession fields into the object. Caller errors
/// carry their message in `error`; storage faults report
/// `"error": "Invalid request"` with the generic `message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessionResponse {
    pub success: bool,
    #[serde(flatten)]
    pub accession: Option<AccessionJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AccessionResponse {
    pub fn success(accession: &Accession) -> Self {
        Self {
            success: true,
            accession: Some(accession.into()),
            error: None,
            message: None,
        }
    }

    pub fn failure(op: Operation, error: &AccessionError) -> Self {
        if error.is_fault() {
            Self {
                success: false,
                accession: None,
                error: Some("Invalid request".to_string()),
                message: Some(op.fault_message().to_string()),
            }
        } else {
            Self {
                success: false,
                accession: None,
                error: Some(error.to_string()),
                message: None,
            }
        }
    }

    pub fn from_result(op: Operation, result: &Result<Accession, AccessionError>) -> Self {
        match result {
            Ok(accession) => Self::success(accession),
            Err(e) => Self::failure(op, e),
        }
    }
}
