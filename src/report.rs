//! Fixed-width result formatting. Projection only, no decision logic.

use crate::harness::RunSummary;
use crate::plan::PlanFragment;
use crate::query::BenchmarkResult;

const TABLE_WIDTH: usize = 20;

/// Column header for the latency section.
pub fn header() -> String {
    format!(
        "{:>TABLE_WIDTH$} {:>10} {:>12} {:>10}",
        "TABLE", "RANGE", "TIME", "ROWS"
    )
}

/// One latency line: padded table name, range bounds, seconds, row count.
pub fn render_result(result: &BenchmarkResult) -> String {
    format!(
        "{:>TABLE_WIDTH$} {:>10} {:>10.4} s {:>10}",
        result.table,
        result.range.to_string(),
        result.elapsed.as_secs_f64(),
        result.rows
    )
}

/// One buffer-usage line for the plan section.
pub fn render_plan(fragment: &PlanFragment) -> String {
    format!(
        "{:>TABLE_WIDTH$} {:>10} storage_reads={:<8} cache_hits={:<8} rows={}",
        fragment.table,
        fragment.range.to_string(),
        fragment.shared_reads,
        fragment.shared_hits,
        fragment.actual_rows
    )
}

/// Prints the whole run: diagnostics, timings per ordering pass, plan buffer
/// usage.
pub fn print_summary(summary: &RunSummary) {
    println!("shared_buffers = {}", summary.shared_buffers);
    if let Some(elapsed) = summary.cluster_time {
        println!("cluster time   = {:.2} s", elapsed.as_secs_f64());
    }

    println!("\nRANGE QUERY LATENCY (both orderings)");
    println!("{}", header());
    println!("{}", "-".repeat(55));
    for result in &summary.results {
        println!("{}", render_result(result));
    }

    println!("\nBUFFER USAGE (EXPLAIN ANALYZE, BUFFERS)");
    for fragment in &summary.plans {
        println!("{}", render_plan(fragment));
    }
}
