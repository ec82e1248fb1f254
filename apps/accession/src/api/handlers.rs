//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Ledger calls are synchronous (they hold the registry lock and may
//! fsync), so each one runs on the blocking pool.

use super::{
    AppState,
    types::{AccessionRequest, AccessionResponse, HealthResponse, MintRequest, StatusResponse},
};
use accession_core::{
    Accession, AccessionError, Operation, Registry, StorageBackend, primitives::DEFAULT_TYPE,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

/// HTTP status for a ledger error.
pub fn error_status(error: &AccessionError) -> StatusCode {
    match error {
        AccessionError::Unparsable => StatusCode::BAD_REQUEST,
        AccessionError::NotFound => StatusCode::NOT_FOUND,
        AccessionError::Duplicate | AccessionError::CounterReuse => StatusCode::CONFLICT,
        AccessionError::Storage(_) | AccessionError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Run a registry call on the blocking pool.
async fn with_registry<T, F>(state: &AppState, call: F) -> Result<T, AccessionError>
where
    F: FnOnce(&Registry<StorageBackend>) -> Result<T, AccessionError> + Send + 'static,
    T: Send + 'static,
{
    let registry = Arc::clone(&state.registry);
    tokio::task::spawn_blocking(move || call(&registry))
        .await
        .map_err(|e| AccessionError::Storage(format!("ledger task failed: {}", e)))?
}

/// Log the outcome and frame the response.
fn respond(
    op: Operation,
    result: Result<Accession, AccessionError>,
) -> (StatusCode, Json<AccessionResponse>) {
    match &result {
        Ok(accession) => {
            tracing::info!(event = op.name(), canonical = %accession.canonical, "ok");
        }
        Err(e) if e.is_fault() => {
            tracing::error!(event = op.name(), error = %e, "Storage fault");
        }
        Err(e) => {
            tracing::warn!(event = op.name(), error = %e, "Rejected");
        }
    }

    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(e) => error_status(e),
    };
    (status, Json(AccessionResponse::from_result(op, &result)))
}

// =============================================================================
// HEALTH / STATUS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Ledger row counts.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    match with_registry(&state, |registry| registry.stats()).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(StatusResponse::new(state.backend, &stats)),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(event = "status", error = %e, "Storage fault");
            (
                error_status(&e),
                Json(AccessionResponse::failure(Operation::Lookup, &e)),
            )
                .into_response()
        }
    }
}

// =============================================================================
// MINT / RECORD
// =============================================================================

/// Mint a new accession number.
pub async fn mint_handler(
    State(state): State<AppState>,
    Json(request): Json<MintRequest>,
) -> impl IntoResponse {
    let result = with_registry(&state, move |registry| {
        let record_type = request.record_type.as_deref().unwrap_or(DEFAULT_TYPE);
        registry.mint(record_type, &request.year, &request.collection)
    })
    .await;
    respond(Operation::Mint, result)
}

/// Record a pre-existing accession number.
pub async fn record_handler(
    State(state): State<AppState>,
    Json(request): Json<AccessionRequest>,
) -> impl IntoResponse {
    let result = with_registry(&state, move |registry| {
        registry.record(&request.accession_number)
    })
    .await;
    respond(Operation::Record, result)
}

// =============================================================================
// LOOKUP / CIRCULATE / REVOKE
// =============================================================================

/// Look up an accession number given in the path.
pub async fn lookup_handler(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> impl IntoResponse {
    let result = with_registry(&state, move |registry| registry.lookup(&number)).await;
    respond(Operation::Lookup, result)
}

/// Mark an accession number as circulating.
pub async fn circulate_handler(
    State(state): State<AppState>,
    Json(request): Json<AccessionRequest>,
) -> impl IntoResponse {
    let result = with_registry(&state, move |registry| {
        registry.circulate(&request.accession_number)
    })
    .await;
    respond(Operation::Circulate, result)
}

/// Withdraw an accession number from circulation.
pub async fn revoke_handler(
    State(state): State<AppState>,
    Json(request): Json<AccessionRequest>,
) -> impl IntoResponse {
    let result = with_registry(&state, move |registry| {
        registry.revoke(&request.accession_number)
    })
    .await;
    respond(Operation::Revoke, result)
}
