//! Batch orchestrator
//!
//! Runs the pipeline stages in order over one batch of raw rows:
//! normalize, merge tax lines, classify, split, aggregate, validate rates,
//! report. Each stage is a pure function from one record collection to the
//! next; no state crosses batch boundaries.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{aggregate_lines, validate_rates, RateCheckReport};
use crate::config::Jurisdiction;
use crate::lookup::Lookups;
use crate::merge::{merge_tax_lines, UnmatchedTax};
use crate::normalize::{normalize_rows, RawRow};
use crate::report::{build_posting_view, build_reconciliation, PostingRow, ReconciliationRow};
use crate::tax::{classify_lines, split_mixed_lines};
use crate::traits::{ReportSink, RowSource};
use crate::types::{AggregatedLine, BatchResult};

/// Identity and audit counters for one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMeta {
    pub batch_id: Uuid,
    pub jurisdiction: String,
    pub input_rows: usize,
    pub dropped_rows: usize,
    pub expense_lines: usize,
    pub tax_lines: usize,
    pub processed_at: NaiveDateTime,
}

/// Everything one batch run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutput {
    pub meta: BatchMeta,
    /// The aggregated ledger rows
    pub aggregated: Vec<AggregatedLine>,
    /// Per-report totals plus unmatched-tax diagnostics
    pub reconciliation: Vec<ReconciliationRow>,
    /// Flattened rows for downstream bulk entry
    pub posting: Vec<PostingRow>,
    /// Effective-rate findings (diagnostic only)
    pub rate_check: RateCheckReport,
    /// Tax entries that matched no expense line
    pub unmatched_tax: Vec<UnmatchedTax>,
}

/// The expense tax reconciliation engine
///
/// Holds the per-batch jurisdiction configuration and lookup tables; both
/// are read-only while a batch runs.
pub struct ReconEngine {
    jurisdiction: Jurisdiction,
    lookups: Lookups,
}

impl ReconEngine {
    /// Create an engine, validating the jurisdiction configuration.
    ///
    /// This is the only gate that can abort a batch up front; everything
    /// downstream degrades to flags and diagnostic rows.
    pub fn new(jurisdiction: Jurisdiction, lookups: Lookups) -> BatchResult<Self> {
        jurisdiction.validate()?;
        Ok(Self {
            jurisdiction,
            lookups,
        })
    }

    pub fn jurisdiction(&self) -> &Jurisdiction {
        &self.jurisdiction
    }

    /// Process one batch of already-materialized rows.
    pub fn process_batch(&self, rows: &[RawRow]) -> BatchOutput {
        let normalized = normalize_rows(rows, &self.lookups, &self.jurisdiction);
        let dropped_rows = normalized.dropped_rows;
        let tax_line_count = normalized.tax_lines.len();

        let merged = merge_tax_lines(normalized.expense_lines, &normalized.tax_lines);
        let classified = classify_lines(merged.lines, &self.jurisdiction);
        let split = split_mixed_lines(classified, &self.jurisdiction);

        let aggregated = aggregate_lines(&split, &self.jurisdiction);
        let rate_check = validate_rates(&aggregated, &self.jurisdiction);
        let reconciliation = build_reconciliation(&aggregated, &merged.unmatched);
        let posting = build_posting_view(&aggregated);

        BatchOutput {
            meta: BatchMeta {
                batch_id: Uuid::new_v4(),
                jurisdiction: self.jurisdiction.code.clone(),
                input_rows: rows.len(),
                dropped_rows,
                expense_lines: split.len(),
                tax_lines: tax_line_count,
                processed_at: chrono::Utc::now().naive_utc(),
            },
            aggregated,
            reconciliation,
            posting,
            rate_check,
            unmatched_tax: merged.unmatched,
        }
    }

    /// Fetch a batch from a source adapter, process it, and hand the output
    /// to a sink adapter.
    pub async fn run_batch(
        &self,
        source: &mut dyn RowSource,
        sink: &mut dyn ReportSink,
    ) -> BatchResult<BatchOutput> {
        let rows = source.fetch_batch().await?;
        let output = self.process_batch(&rows);
        sink.deliver(&output).await?;
        Ok(output)
    }
}
