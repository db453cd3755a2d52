//! Error type definitions.
//!
//! This module defines the error types used throughout the application and
//! the per-source failure taxonomy aggregated into the run summary.

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}

/// Error types for database operations.
///
/// Failure to create or open the store is the one fatal condition in the
/// pipeline: no partial result is meaningful without a store.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

/// Categories of recoverable per-source failures.
///
/// A failed source contributes zero candidates and a warning; it never
/// aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum SourceErrorKind {
    /// Input file missing or unreadable.
    FileUnreadable,
    /// Remote list unreachable or returned a non-success status.
    RemoteFetchError,
    /// Feed unreachable or its payload failed to decode.
    FeedError,
    /// Source read exceeded its timeout budget.
    SourceTimeout,
}

impl std::fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SourceErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceErrorKind::FileUnreadable => "Input file unreadable",
            SourceErrorKind::RemoteFetchError => "Remote list fetch error",
            SourceErrorKind::FeedError => "Feed fetch/parse error",
            SourceErrorKind::SourceTimeout => "Source read timeout",
        }
    }
}
