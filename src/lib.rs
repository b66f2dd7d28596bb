//! Heap-vs-clustered layout benchmark for Postgres range queries.
//!
//! Loads two tables with identical synthetic data, leaves one in insertion
//! order and physically reorders the other with `CLUSTER` on a rating index,
//! then times the same inclusive range queries against both, in both table
//! orderings so first-access cache warming cancels out, and reads
//! `EXPLAIN (ANALYZE, BUFFERS)` output to tie the latency difference to
//! durable-storage page reads.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod harness;
pub mod index;
pub mod loader;
pub mod plan;
pub mod query;
pub mod report;
pub mod schema;
pub mod stats;

pub use config::{BenchConfig, Ident, RatingRange};
pub use error::{BenchError, Result};
pub use harness::{run, RunSummary};
