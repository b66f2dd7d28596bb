//! Execution-plan analysis: where did the pages come from?
//!
//! Re-runs a range query under `EXPLAIN (ANALYZE, BUFFERS, FORMAT JSON)` and
//! folds the typed plan tree into buffer totals. Shared *read* blocks are
//! pages fetched from durable storage; shared *hit* blocks were already
//! resident in the buffer cache. A plan that reports no read figures at all
//! simply ran fully cached, which parses to zero reads rather than an error.

use serde::Deserialize;
use tokio_postgres::types::Type;
use tokio_postgres::Client;

use crate::config::{Ident, RatingRange};
use crate::error::{BenchError, Result};
use crate::query::select_sql;

/// Buffer usage extracted from one executed plan.
#[derive(Debug, Clone)]
pub struct PlanFragment {
    /// Table the plan scanned.
    pub table: String,
    /// Range the plan was produced for.
    pub range: RatingRange,
    /// Pages read from durable storage, summed over the whole plan tree.
    pub shared_reads: u64,
    /// Pages served from the buffer cache, summed over the whole plan tree.
    pub shared_hits: u64,
    /// Rows the plan root actually produced.
    pub actual_rows: u64,
}

/// One entry of the top-level EXPLAIN JSON array.
#[derive(Debug, Deserialize)]
struct ExplainEntry {
    #[serde(rename = "Plan")]
    plan: PlanNode,
}

/// The subset of plan-node fields the analyzer cares about.
///
/// Buffer counters default to zero when absent; Postgres omits them for
/// nodes that touched no shared buffers.
#[derive(Debug, Deserialize)]
struct PlanNode {
    #[serde(rename = "Shared Read Blocks", default)]
    shared_read_blocks: u64,
    #[serde(rename = "Shared Hit Blocks", default)]
    shared_hit_blocks: u64,
    // Emitted as a float in newer server versions (rows averaged over loops).
    #[serde(rename = "Actual Rows", default)]
    actual_rows: f64,
    #[serde(rename = "Plans", default)]
    children: Vec<PlanNode>,
}

impl PlanNode {
    fn fold(&self, reads: &mut u64, hits: &mut u64) {
        *reads += self.shared_read_blocks;
        *hits += self.shared_hit_blocks;
        for child in &self.children {
            child.fold(reads, hits);
        }
    }
}

/// Parses raw EXPLAIN JSON into a [`PlanFragment`].
fn fragment_from_json(
    table: &Ident,
    range: RatingRange,
    raw: serde_json::Value,
) -> Result<PlanFragment> {
    let entries: Vec<ExplainEntry> =
        serde_json::from_value(raw).map_err(|err| BenchError::Plan(err.to_string()))?;
    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| BenchError::Plan("empty explain output".into()))?;

    let mut shared_reads = 0;
    let mut shared_hits = 0;
    entry.plan.fold(&mut shared_reads, &mut shared_hits);
    Ok(PlanFragment {
        table: table.to_string(),
        range,
        shared_reads,
        shared_hits,
        actual_rows: entry.plan.actual_rows.round() as u64,
    })
}

/// Executes the range query under plan instrumentation and extracts buffer
/// usage.
///
/// ANALYZE makes the backend run the query for real, so the numbers reflect
/// actual page fetches for this execution, not estimates.
pub async fn explain_range(
    client: &Client,
    table: &Ident,
    column: &Ident,
    range: RatingRange,
) -> Result<PlanFragment> {
    let sql = format!(
        "EXPLAIN (ANALYZE, BUFFERS, FORMAT JSON) {}",
        select_sql(table, column)
    );
    let stmt = client
        .prepare_typed(&sql, &[Type::FLOAT8, Type::FLOAT8])
        .await?;
    let row = client
        .query_one(&stmt, &[&range.lower, &range.upper])
        .await?;
    let raw: serde_json::Value = row.try_get(0)?;
    fragment_from_json(table, range, raw)
}
