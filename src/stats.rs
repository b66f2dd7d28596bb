//! Planner-statistics refresh and cache-size introspection.

use tokio_postgres::Client;
use tracing::info;

use crate::error::Result;

/// Recomputes planner statistics for every table in the database.
///
/// Must run after the bulk load and again after clustering, before any timed
/// query: stale statistics would bias the planner and invalidate the
/// comparison.
pub async fn refresh_statistics(client: &Client) -> Result<()> {
    client.batch_execute("ANALYZE").await?;
    info!("planner statistics refreshed");
    Ok(())
}

/// Reads the configured shared-buffer pool size, e.g. `"128MB"`.
///
/// Purely diagnostic: it tells the reader how much table data can possibly
/// stay cached, which frames the buffer-read numbers in the report.
pub async fn shared_buffers(client: &Client) -> Result<String> {
    let row = client.query_one("SHOW shared_buffers", &[]).await?;
    let size: String = row.try_get(0)?;
    Ok(size)
}
