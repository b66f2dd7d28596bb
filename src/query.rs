//! Timed range queries over the table pair, in both table orderings.

use std::time::{Duration, Instant};

use tokio_postgres::types::Type;
use tokio_postgres::Client;
use tracing::debug;

use crate::config::{BenchConfig, Ident, RatingRange};
use crate::error::Result;

/// Which table of the pair is queried first for a given range.
///
/// Whichever table goes first pays the cold-cache penalty for that range, so
/// a fair comparison runs the full partition in both orders and reports both.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TableOrder {
    /// Heap table first, clustered table second.
    HeapFirst,
    /// Clustered table first, heap table second.
    ClusteredFirst,
}

impl TableOrder {
    /// Both orderings, in the order they are executed.
    pub const BOTH: [TableOrder; 2] = [TableOrder::HeapFirst, TableOrder::ClusteredFirst];

    fn tables<'a>(self, cfg: &'a BenchConfig) -> [&'a Ident; 2] {
        match self {
            TableOrder::HeapFirst => [&cfg.heap_table, &cfg.clustered_table],
            TableOrder::ClusteredFirst => [&cfg.clustered_table, &cfg.heap_table],
        }
    }
}

/// Latency and row count for one (table, range) query.
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    /// Table the query ran against.
    pub table: String,
    /// Inclusive rating range queried.
    pub range: RatingRange,
    /// Wall time of the query, from a monotonic clock.
    pub elapsed: Duration,
    /// Rows returned.
    pub rows: u64,
}

/// The shared range predicate.
///
/// Bounds are bound as FLOAT8 parameters and cast to NUMERIC inside the
/// statement, keeping the comparison in the column's own type so the rating
/// index stays usable.
pub(crate) fn select_sql(table: &Ident, column: &Ident) -> String {
    format!(
        "SELECT id, name, rating, payload FROM {table} \
         WHERE {column} BETWEEN CAST($1 AS numeric) AND CAST($2 AS numeric)"
    )
}

/// Runs one inclusive range query and records its latency and row count.
pub async fn run_range(
    client: &Client,
    table: &Ident,
    column: &Ident,
    range: RatingRange,
) -> Result<BenchmarkResult> {
    let stmt = client
        .prepare_typed(&select_sql(table, column), &[Type::FLOAT8, Type::FLOAT8])
        .await?;
    let start = Instant::now();
    let rows = client.query(&stmt, &[&range.lower, &range.upper]).await?;
    let elapsed = start.elapsed();
    debug!(table = %table, %range, rows = rows.len(), "range query timed");
    Ok(BenchmarkResult {
        table: table.to_string(),
        range,
        elapsed,
        rows: rows.len() as u64,
    })
}

/// Times the full range partition against both tables, in both orderings.
///
/// Strictly sequential: each query is awaited to completion before the next
/// is issued, since overlapping queries would contend for the buffer cache
/// and corrupt the measurement. Any query failure aborts the run; a
/// comparison with missing data points is not meaningful.
pub async fn run_comparison(client: &Client, cfg: &BenchConfig) -> Result<Vec<BenchmarkResult>> {
    let mut results = Vec::with_capacity(cfg.partition.len() * 4);
    for order in TableOrder::BOTH {
        for &range in &cfg.partition {
            for table in order.tables(cfg) {
                results.push(run_range(client, table, &cfg.rating_column, range).await?);
            }
        }
    }
    Ok(results)
}
