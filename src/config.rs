//! Harness configuration: table pair, load sizing, and the range partition.
//!
//! Everything the six stages need is validated up front so that no statement
//! is issued against a half-checked configuration. Identifiers that end up
//! interpolated into DDL (table and column names, which cannot be bound as
//! parameters) pass through the [`Ident`] newtype, so only names from this
//! configuration ever reach an SQL identifier position.

use std::fmt;

use crate::error::{BenchError, Result};

/// Lower edge of the rating domain.
pub const RATING_MIN: f64 = 0.0;
/// Upper edge of the rating domain.
pub const RATING_MAX: f64 = 5.0;

/// Tolerance for boundary comparisons when validating hand-built partitions.
const BOUNDARY_EPS: f64 = 1e-9;

/// A validated SQL identifier.
///
/// Construction is the allow-list: an `Ident` only exists for names that are
/// ASCII, start with a letter or underscore, and stay within the Postgres
/// 63-byte identifier limit. Components take `&Ident`, never `&str`, for
/// anything interpolated into statement text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(String);

impl Ident {
    /// Validates `raw` and wraps it.
    pub fn new(raw: &str) -> Result<Self> {
        let mut chars = raw.chars();
        let head_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !head_ok || !tail_ok || raw.len() > 63 {
            return Err(BenchError::InvalidConfig(format!(
                "{raw:?} is not a safe SQL identifier"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    /// The wrapped name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One inclusive range over the rating column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingRange {
    /// Inclusive lower bound.
    pub lower: f64,
    /// Inclusive upper bound.
    pub upper: f64,
}

impl RatingRange {
    /// Splits `[RATING_MIN, RATING_MAX]` into `buckets` equal-width ranges.
    ///
    /// Adjacent ranges share exactly one boundary point, so the set covers
    /// the whole domain with no gap and no interior overlap.
    pub fn partition(buckets: usize) -> Vec<RatingRange> {
        let width = (RATING_MAX - RATING_MIN) / buckets as f64;
        (0..buckets)
            .map(|i| RatingRange {
                lower: RATING_MIN + width * i as f64,
                // Last bucket closes on the domain edge exactly.
                upper: if i + 1 == buckets {
                    RATING_MAX
                } else {
                    RATING_MIN + width * (i + 1) as f64
                },
            })
            .collect()
    }
}

impl fmt::Display for RatingRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}..{:.1}", self.lower, self.upper)
    }
}

/// Full harness configuration.
///
/// The binary builds one of these from CLI arguments; tests build them
/// directly. [`BenchConfig::validate`] must pass before the harness runs.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Synthetic rows loaded into each table.
    pub rows: usize,
    /// Rows per multi-row INSERT statement.
    pub batch_size: usize,
    /// Table left in insertion order.
    pub heap_table: Ident,
    /// Table physically reorganized by the rating index.
    pub clustered_table: Ident,
    /// Indexed and queried column.
    pub rating_column: Ident,
    /// Inclusive ranges timed against both tables.
    pub partition: Vec<RatingRange>,
    /// Size of the JSONB filler document, `None` for slim rows.
    pub payload_bytes: Option<usize>,
    /// Seed for the synthetic data stream.
    pub seed: u64,
    /// Reuse already-loaded tables: skip the schema and load stages.
    pub skip_load: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        // Row count, batch size and table pair mirror the workload this
        // harness was built to reproduce.
        Self {
            rows: 200_000,
            batch_size: 1_000,
            heap_table: Ident("normal_product".into()),
            clustered_table: Ident("clustered_product".into()),
            rating_column: Ident("rating".into()),
            partition: RatingRange::partition(5),
            payload_bytes: None,
            seed: 42,
            skip_load: false,
        }
    }
}

impl BenchConfig {
    /// Checks every invariant the stages rely on.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 {
            return Err(BenchError::InvalidConfig("rows must be at least 1".into()));
        }
        if self.batch_size == 0 || self.batch_size > self.rows {
            return Err(BenchError::InvalidConfig(format!(
                "batch size {} must be in 1..={} (rows)",
                self.batch_size, self.rows
            )));
        }
        if self.heap_table == self.clustered_table {
            return Err(BenchError::InvalidConfig(format!(
                "table pair must be two distinct tables, got {} twice",
                self.heap_table
            )));
        }
        validate_partition(&self.partition)
    }
}

/// Checks that `ranges` cover `[RATING_MIN, RATING_MAX]` contiguously:
/// no gaps, no overlap beyond shared boundary points.
fn validate_partition(ranges: &[RatingRange]) -> Result<()> {
    let bad = |msg: String| Err(BenchError::InvalidConfig(msg));
    let Some(first) = ranges.first() else {
        return bad("range partition is empty".into());
    };
    if (first.lower - RATING_MIN).abs() > BOUNDARY_EPS {
        return bad(format!("partition starts at {}, not {RATING_MIN}", first.lower));
    }
    let mut prev_upper = first.lower;
    for range in ranges {
        if range.upper <= range.lower {
            return bad(format!("range {range} is empty or inverted"));
        }
        if (range.lower - prev_upper).abs() > BOUNDARY_EPS {
            return bad(format!(
                "range {range} does not start where the previous range ended ({prev_upper})"
            ));
        }
        prev_upper = range.upper;
    }
    if (prev_upper - RATING_MAX).abs() > BOUNDARY_EPS {
        return bad(format!("partition ends at {prev_upper}, not {RATING_MAX}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ident_accepts_plain_names() {
        assert!(Ident::new("normal_product").is_ok());
        assert!(Ident::new("_t2").is_ok());
    }

    #[test]
    fn ident_rejects_injection_shaped_input() {
        for raw in ["", "2cols", "t; DROP TABLE x", "a-b", "t\"", "名前"] {
            assert!(Ident::new(raw).is_err(), "{raw:?} should be rejected");
        }
        assert!(Ident::new(&"x".repeat(64)).is_err());
    }

    #[test]
    fn five_unit_buckets_cover_the_domain() {
        let ranges = RatingRange::partition(5);
        assert_eq!(ranges.len(), 5);
        assert_eq!(ranges[0], RatingRange { lower: 0.0, upper: 1.0 });
        assert_eq!(ranges[4], RatingRange { lower: 4.0, upper: 5.0 });
        assert!(validate_partition(&ranges).is_ok());
    }

    #[test]
    fn gap_and_overlap_are_rejected() {
        let gap = vec![
            RatingRange { lower: 0.0, upper: 2.0 },
            RatingRange { lower: 2.5, upper: 5.0 },
        ];
        assert!(validate_partition(&gap).is_err());

        let overlap = vec![
            RatingRange { lower: 0.0, upper: 3.0 },
            RatingRange { lower: 2.0, upper: 5.0 },
        ];
        assert!(validate_partition(&overlap).is_err());

        let short = vec![RatingRange { lower: 0.0, upper: 4.0 }];
        assert!(validate_partition(&short).is_err());

        assert!(validate_partition(&[]).is_err());
    }

    #[test]
    fn default_config_validates() {
        assert!(BenchConfig::default().validate().is_ok());
    }

    #[test]
    fn batch_size_must_fit_row_count() {
        let cfg = BenchConfig {
            rows: 10,
            batch_size: 11,
            ..BenchConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = BenchConfig {
            batch_size: 0,
            ..BenchConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    proptest! {
        #[test]
        fn any_bucket_count_partitions_the_domain(buckets in 1usize..200) {
            let ranges = RatingRange::partition(buckets);
            prop_assert_eq!(ranges.len(), buckets);
            prop_assert!(validate_partition(&ranges).is_ok());
        }
    }
}
