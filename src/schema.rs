//! Schema management for the benchmark table pair.

use tokio_postgres::Client;
use tracing::info;

use crate::config::Ident;
use crate::error::Result;

/// Drops any existing table named `table`, then recreates it with the fixed
/// benchmark column set.
///
/// Both benchmark tables go through this same definition, so any query-cost
/// difference between them is attributable to physical layout alone. The
/// drop is unconditional and destructive; a failure here is fatal to the run.
pub async fn define_table(client: &Client, table: &Ident) -> Result<()> {
    client
        .batch_execute(&format!("DROP TABLE IF EXISTS {table}"))
        .await?;
    client
        .batch_execute(&format!(
            "CREATE TABLE {table} (\
                id SERIAL PRIMARY KEY, \
                name TEXT, \
                rating NUMERIC(2, 1), \
                payload JSONB\
            )"
        ))
        .await?;
    info!(table = %table, "table recreated");
    Ok(())
}
