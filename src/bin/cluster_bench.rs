//! CLI wrapper: opens one Postgres session, drives the six-stage harness,
//! prints the comparison report.

use std::process;

use clap::Parser;
use cluster_bench::{harness, report, BenchConfig, Ident, RatingRange, Result};
use tokio_postgres::NoTls;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cluster-bench", about = "Heap vs clustered range-query benchmark")]
struct Args {
    /// Postgres host.
    #[arg(long, env = "PGHOST", default_value = "localhost")]
    host: String,

    /// Postgres port.
    #[arg(long, env = "PGPORT", default_value_t = 5432)]
    port: u16,

    /// Role to connect as.
    #[arg(long, env = "PGUSER", default_value = "postgres")]
    user: String,

    /// Password for the role.
    #[arg(long, env = "PGPASSWORD", default_value = "")]
    password: String,

    /// Database holding the benchmark tables.
    #[arg(long, env = "PGDATABASE", default_value = "postgres")]
    dbname: String,

    /// Synthetic rows loaded into each table.
    #[arg(long, default_value_t = 200_000)]
    rows: usize,

    /// Rows per multi-row INSERT statement.
    #[arg(long, default_value_t = 1_000)]
    batch_size: usize,

    /// Number of equal-width rating buckets to query.
    #[arg(long, default_value_t = 5)]
    buckets: usize,

    /// Attach a JSONB filler document of this many bytes to every row.
    #[arg(long)]
    payload_bytes: Option<usize>,

    /// Seed for the synthetic data stream.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Reuse tables loaded by a previous run instead of recreating them.
    #[arg(long, default_value_t = false)]
    skip_load: bool,

    /// Name of the insertion-order table.
    #[arg(long, default_value = "normal_product")]
    heap_table: String,

    /// Name of the physically reordered table.
    #[arg(long, default_value = "clustered_product")]
    clustered_table: String,
}

impl Args {
    fn into_config(self) -> Result<BenchConfig> {
        let cfg = BenchConfig {
            rows: self.rows,
            batch_size: self.batch_size,
            heap_table: Ident::new(&self.heap_table)?,
            clustered_table: Ident::new(&self.clustered_table)?,
            rating_column: Ident::new("rating")?,
            partition: RatingRange::partition(self.buckets),
            payload_bytes: self.payload_bytes,
            seed: self.seed,
            skip_load: self.skip_load,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    if let Err(err) = try_main().await {
        eprintln!("cluster-bench failed: {err}");
        process::exit(1);
    }
}

async fn try_main() -> Result<()> {
    let args = Args::parse();
    let mut pg = tokio_postgres::Config::new();
    pg.host(&args.host)
        .port(args.port)
        .user(&args.user)
        .password(&args.password)
        .dbname(&args.dbname);
    let cfg = args.into_config()?;

    // The session is held exclusively for the whole run and released on any
    // exit path once the harness returns.
    let (client, connection) = pg.connect(NoTls).await?;
    let connection_task = tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "connection task ended with error");
        }
    });

    let outcome = harness::run(&client, &cfg).await;
    drop(client);
    let _ = connection_task.await;

    let summary = outcome?;
    println!(
        "indexes: {}={}, {}={}",
        cfg.heap_table,
        summary.index_outcomes[0].as_str(),
        cfg.clustered_table,
        summary.index_outcomes[1].as_str()
    );
    report::print_summary(&summary);
    Ok(())
}
