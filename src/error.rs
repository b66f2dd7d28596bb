//! Error type shared across the harness.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BenchError>;

/// Errors surfaced by the benchmark harness.
///
/// Backend failures abort the run; there is no retry layer. The one
/// recoverable condition (a duplicate index) is not an error at all, it is
/// reported as [`crate::index::IndexOutcome::AlreadyExists`].
#[derive(Debug, Error)]
pub enum BenchError {
    /// Any error reported by the Postgres session, surfaced verbatim.
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Configuration rejected before any statement was issued.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// `cluster_table` was asked to cluster a table whose index is gone.
    #[error("no index named {index} on table {table}; ensure_index must run first")]
    MissingIndex {
        /// Table that was about to be clustered.
        table: String,
        /// Index the cluster operation expected to find.
        index: String,
    },

    /// EXPLAIN output that the typed plan parser could not interpret.
    #[error("unreadable explain output: {0}")]
    Plan(String),
}
