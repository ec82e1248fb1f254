//! # accession
//!
//! The accession number service: HTTP API, CLI and configuration around
//! the `accession-core` registry.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;

pub use error::AppError;
