//! Bulk loader: synthetic record generation and batched inserts.
//!
//! Both tables receive the *same* generated batches, so their datasets are
//! statistically identical and any later timing difference comes from
//! physical layout, not data skew.

use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::{json, Value};
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::Client;
use tracing::{debug, info};

use crate::config::{BenchConfig, Ident, RATING_MAX, RATING_MIN};
use crate::error::Result;

/// One synthetic row, immutable once generated.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Generated label, derived from the row index.
    pub name: String,
    /// Uniform random rating in `[RATING_MIN, RATING_MAX)`.
    pub rating: f64,
}

/// Deterministic record stream: a fixed seed reproduces the exact dataset.
pub struct RecordGenerator {
    rng: ChaCha8Rng,
    next_index: usize,
}

impl RecordGenerator {
    /// Starts the stream at row index 0.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_index: 0,
        }
    }

    /// Produces the next record in the stream.
    pub fn next_record(&mut self) -> Record {
        let record = Record {
            name: format!("product {}", self.next_index),
            rating: self.rng.gen_range(RATING_MIN..RATING_MAX),
        };
        self.next_index += 1;
        record
    }
}

/// Builds the fixed filler document used to inflate row width.
pub fn payload_doc(bytes: usize) -> Value {
    json!({ "filler": "x".repeat(bytes) })
}

/// Splits `rows` into batch lengths of at most `batch_size`.
///
/// The final entry carries the remainder: every generated row is flushed,
/// a partial tail batch included.
fn plan_batches(rows: usize, batch_size: usize) -> Vec<usize> {
    let full = rows / batch_size;
    let rest = rows % batch_size;
    let mut lens = vec![batch_size; full];
    if rest > 0 {
        lens.push(rest);
    }
    lens
}

/// Multi-row parameterized INSERT text for `len` records.
fn insert_sql(table: &Ident, len: usize) -> String {
    let mut sql = format!("INSERT INTO {table} (name, rating, payload) VALUES ");
    for row in 0..len {
        if row > 0 {
            sql.push_str(", ");
        }
        let base = row * 3;
        sql.push_str(&format!("(${}, ${}, ${})", base + 1, base + 2, base + 3));
    }
    sql
}

/// Parameter types for a `len`-record insert statement.
///
/// Ratings travel as FLOAT8 and rely on the assignment cast to the table's
/// NUMERIC column; without the declared type the backend would infer NUMERIC
/// for the placeholder, which `f64` cannot bind to.
fn insert_types(len: usize) -> Vec<Type> {
    let mut types = Vec::with_capacity(len * 3);
    for _ in 0..len {
        types.extend([Type::TEXT, Type::FLOAT8, Type::JSONB]);
    }
    types
}

async fn flush_batch(
    client: &Client,
    tables: [&Ident; 2],
    batch: &[Record],
    payload: &Option<Value>,
) -> Result<()> {
    let types = insert_types(batch.len());
    let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(batch.len() * 3);
    for record in batch {
        params.push(&record.name);
        params.push(&record.rating);
        params.push(payload);
    }
    for table in tables {
        let stmt = client.prepare_typed(&insert_sql(table, batch.len()), &types).await?;
        client.execute(&stmt, &params).await?;
    }
    debug!(len = batch.len(), "batch flushed to both tables");
    Ok(())
}

/// Loads `cfg.rows` identical synthetic rows into both benchmark tables.
///
/// Progress is reported as a side effect only; correctness is the row count.
/// Insert failures propagate and abort the run.
pub async fn load_data(client: &Client, cfg: &BenchConfig) -> Result<()> {
    let tables = [&cfg.heap_table, &cfg.clustered_table];
    let payload = cfg.payload_bytes.map(payload_doc);
    let mut generator = RecordGenerator::new(cfg.seed);

    let progress = ProgressBar::new(cfg.rows as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} rows ({percent}%)").unwrap(),
    );

    let mut batch = Vec::with_capacity(cfg.batch_size);
    for len in plan_batches(cfg.rows, cfg.batch_size) {
        batch.clear();
        batch.extend(std::iter::repeat_with(|| generator.next_record()).take(len));
        flush_batch(client, tables, &batch, &payload).await?;
        progress.inc(len as u64);
    }
    progress.finish_and_clear();

    info!(
        rows = cfg.rows,
        batch_size = cfg.batch_size,
        payload_bytes = cfg.payload_bytes,
        "bulk load complete"
    );
    Ok(())
}
