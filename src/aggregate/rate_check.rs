//! Effective-rate validation
//!
//! Recomputes the implied tax rate of each aggregated line and reports the
//! ones outside the jurisdiction's band. Diagnostic only: nothing is mutated
//! and the batch never aborts here.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::config::Jurisdiction;
use crate::types::{AggregatedLine, MixedFlag};

/// Number of offending rows retained in the report.
const SAMPLE_LIMIT: usize = 5;

/// One aggregated row whose implied rate is out of band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateFinding {
    pub employee_id: String,
    pub report_id: String,
    pub display_account: String,
    pub gross: BigDecimal,
    pub tax: BigDecimal,
    pub net: BigDecimal,
    /// |tax| / |net|, zero when the net is too small to rate
    pub implied_rate: BigDecimal,
}

/// Outcome of the rate validation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateCheckReport {
    /// Rows inspected (mixed and review-flagged rows are skipped)
    pub checked: usize,
    /// Rows whose implied rate was neither ~0 nor within tolerance
    pub flagged: usize,
    /// Bounded sample of offending rows for operator review
    pub sample: Vec<RateFinding>,
}

impl RateCheckReport {
    pub fn is_conforming(&self) -> bool {
        self.flagged == 0
    }
}

/// Check every unmixed aggregated line against the expected rate.
pub fn validate_rates(lines: &[AggregatedLine], jurisdiction: &Jurisdiction) -> RateCheckReport {
    let zero = BigDecimal::from(0);
    let mut report = RateCheckReport::default();

    for line in lines {
        if line.mixed != MixedFlag::No {
            continue;
        }
        report.checked += 1;

        let tax = line.tax.abs();
        if tax <= jurisdiction.zero_threshold {
            continue;
        }

        let net = line.net.abs();
        let implied_rate = if net > jurisdiction.zero_threshold {
            &tax / &net
        } else {
            zero.clone()
        };

        let deviation = (&implied_rate - &jurisdiction.expected_rate).abs();
        if deviation <= jurisdiction.rate_tolerance {
            continue;
        }

        report.flagged += 1;
        if report.sample.len() < SAMPLE_LIMIT {
            report.sample.push(RateFinding {
                employee_id: line.employee_id.clone(),
                report_id: line.report_id.clone(),
                display_account: line.display_account.clone(),
                gross: line.gross.clone(),
                tax: line.tax.clone(),
                net: line.net.clone(),
                implied_rate,
            });
        }
    }

    report
}
