//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use accession::api::{
    AccessionJson, AccessionRequest, AccessionResponse, HealthResponse, MintRequest,
    StatusResponse, error_status,
};
use accession_core::{AccessionError, LedgerStats, MemoryLedger, Operation, Registry};
use axum::http::StatusCode;

fn sample() -> accession_core::Accession {
    let registry = Registry::new(MemoryLedger::new());
    registry.record("1899 OH/ 151 AB 9 Sess 3").unwrap()
}

// =============================================================================
// HEALTH / STATUS RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_deserialization() {
    let json = r#"{"status":"healthy","version":"1.0.0"}"#;
    let health: HealthResponse = serde_json::from_str(json).unwrap();

    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "1.0.0");
}

#[test]
fn test_status_response_from_stats() {
    let stats = LedgerStats {
        types: 2,
        years: 3,
        collections: 4,
        year_counters: 5,
        collection_counters: 6,
        identifiers: 7,
        circulating: 6,
    };
    let status = StatusResponse::new("redb", &stats);

    let json = serde_json::to_string(&status).unwrap();
    assert!(json.contains("\"backend\":\"redb\""));
    assert!(json.contains("\"identifiers\":7"));
    assert!(json.contains("\"circulating\":6"));
}

// =============================================================================
// REQUEST TESTS
// =============================================================================

#[test]
fn test_mint_request_type_is_optional() {
    let request: MintRequest =
        serde_json::from_str(r#"{"year":"1900","collection":"a"}"#).unwrap();
    assert!(request.record_type.is_none());
    assert_eq!(request.year, "1900");

    let request: MintRequest =
        serde_json::from_str(r#"{"type":"test","year":"1900","collection":"a"}"#).unwrap();
    assert_eq!(request.record_type.as_deref(), Some("test"));
}

#[test]
fn test_mint_request_serialization_omits_missing_type() {
    let request = MintRequest {
        record_type: None,
        year: "1900".to_string(),
        collection: "a".to_string(),
    };
    let json = serde_json::to_string(&request).unwrap();
    assert!(!json.contains("type"));
}

#[test]
fn test_accession_request_requires_number() {
    assert!(serde_json::from_str::<AccessionRequest>("{}").is_err());
    let request: AccessionRequest =
        serde_json::from_str(r#"{"accession_number":"1900oh001_a001"}"#).unwrap();
    assert_eq!(request.accession_number, "1900oh001_a001");
}

// =============================================================================
// ACCESSION RESPONSE TESTS
// =============================================================================

#[test]
fn test_success_flattens_fields() {
    let response = AccessionResponse::success(&sample());
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["success"], true);
    assert_eq!(value["canonical"], "1899oh151_ab009");
    assert_eq!(value["as_submitted"], "1899 OH/ 151 AB 9 Sess 3");
    assert_eq!(value["type"], "oh");
    assert_eq!(value["year"], 1899);
    assert_eq!(value["year_count"], 151);
    assert_eq!(value["collection"], "ab");
    assert_eq!(value["collection_count"], 9);
    assert!(value.get("error").is_none());
    assert!(value.get("message").is_none());
}

#[test]
fn test_success_deserializes_back() {
    let accession = sample();
    let json = serde_json::to_string(&AccessionResponse::success(&accession)).unwrap();
    let back: AccessionResponse = serde_json::from_str(&json).unwrap();

    assert!(back.success);
    assert_eq!(back.accession, Some(AccessionJson::from(&accession)));
}

#[test]
fn test_caller_error_shape() {
    let response = AccessionResponse::failure(Operation::Record, &AccessionError::CounterReuse);
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["success"], false);
    assert_eq!(
        value["error"],
        "The year and collection counters cannot be reused."
    );
    assert!(value.get("message").is_none());
    assert!(value.get("canonical").is_none());
}

#[test]
fn test_storage_fault_shape() {
    let fault = AccessionError::Storage("disk on fire".to_string());

    let mint = serde_json::to_value(AccessionResponse::failure(Operation::Mint, &fault)).unwrap();
    assert_eq!(mint["error"], "Invalid request");
    assert_eq!(mint["message"], "An accession number cannot be minted.");

    let revoke =
        serde_json::to_value(AccessionResponse::failure(Operation::Revoke, &fault)).unwrap();
    assert_eq!(revoke["message"], "The accession number cannot be processed.");
    assert!(!revoke.to_string().contains("disk on fire"));
}

#[test]
fn test_error_deserializes_without_accession() {
    let json = r#"{"success":false,"error":"No such accession number exists."}"#;
    let response: AccessionResponse = serde_json::from_str(json).unwrap();
    assert!(!response.success);
    assert!(response.accession.is_none());
    assert_eq!(
        response.error.as_deref(),
        Some("No such accession number exists.")
    );
}

// =============================================================================
// STATUS CODE MAPPING
// =============================================================================

#[test]
fn test_error_status_mapping() {
    assert_eq!(
        error_status(&AccessionError::Unparsable),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(error_status(&AccessionError::NotFound), StatusCode::NOT_FOUND);
    assert_eq!(error_status(&AccessionError::Duplicate), StatusCode::CONFLICT);
    assert_eq!(
        error_status(&AccessionError::CounterReuse),
        StatusCode::CONFLICT
    );
    assert_eq!(
        error_status(&AccessionError::Serialization("bad".into())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
