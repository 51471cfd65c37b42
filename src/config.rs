//! Per-batch jurisdiction configuration
//!
//! Every rate, threshold and rewrite rule the pipeline needs is carried on an
//! injected [`Jurisdiction`] value; there is no module-level or process-wide
//! tax state.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::{BatchError, BatchResult, TaxCode};

/// Cost-center rewrite rule applied during normalization
///
/// Expressed as data rather than a function so configurations stay
/// serializable and comparable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostCenterRule {
    /// Leave cost-center codes untouched
    Keep,
    /// Rewrite codes starting with `from` so they start with `to` instead
    PrefixRewrite { from: String, to: String },
}

impl CostCenterRule {
    /// Apply the rule to a cost-center code.
    pub fn apply(&self, code: &str) -> String {
        match self {
            CostCenterRule::Keep => code.to_string(),
            CostCenterRule::PrefixRewrite { from, to } => {
                if let Some(rest) = code.strip_prefix(from.as_str()) {
                    format!("{}{}", to, rest)
                } else {
                    code.to_string()
                }
            }
        }
    }
}

/// Tax rules for one jurisdiction, injected per batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jurisdiction {
    /// Short region code ("AU", "NZ")
    pub code: String,
    /// Expected tax rate on the net amount (0.10 means 10%)
    pub expected_rate: BigDecimal,
    /// Amounts at or below this are treated as exactly zero tax
    pub zero_threshold: BigDecimal,
    /// Accepted deviation around the expected rate / gross ratio
    pub rate_tolerance: BigDecimal,
    /// Sanity slack for derived mixed-split amounts (currency units)
    pub split_slack: BigDecimal,
    /// Cost-center rewrite applied during normalization
    pub cost_center_rule: CostCenterRule,
    /// Display rendering for standard-taxed lines
    pub display_taxed: String,
    /// Display rendering for zero-rated lines
    pub display_zero: String,
}

impl Jurisdiction {
    /// Australian GST: 10% on net, no cost-center rewrite, L-codes displayed
    /// as-is.
    pub fn australia() -> Self {
        Self {
            code: "AU".to_string(),
            expected_rate: BigDecimal::from(10) / BigDecimal::from(100),
            zero_threshold: BigDecimal::from(9) / BigDecimal::from(1000),
            rate_tolerance: BigDecimal::from(5) / BigDecimal::from(1000),
            split_slack: BigDecimal::from(5) / BigDecimal::from(100),
            cost_center_rule: CostCenterRule::Keep,
            display_taxed: "L1".to_string(),
            display_zero: "L0".to_string(),
        }
    }

    /// New Zealand GST: 15% on net, "80" cost centers rewritten to "81",
    /// Q-codes for display.
    pub fn new_zealand() -> Self {
        Self {
            code: "NZ".to_string(),
            expected_rate: BigDecimal::from(15) / BigDecimal::from(100),
            zero_threshold: BigDecimal::from(9) / BigDecimal::from(1000),
            rate_tolerance: BigDecimal::from(5) / BigDecimal::from(1000),
            split_slack: BigDecimal::from(5) / BigDecimal::from(100),
            cost_center_rule: CostCenterRule::PrefixRewrite {
                from: "80".to_string(),
                to: "81".to_string(),
            },
            display_taxed: "Q2".to_string(),
            display_zero: "Q0".to_string(),
        }
    }

    /// Expected tax share of the gross amount: `rate / (1 + rate)`.
    ///
    /// At 10% this is 1/11 of gross, at 15% it is 3/23.
    pub fn gross_ratio(&self) -> BigDecimal {
        &self.expected_rate / (BigDecimal::from(1) + &self.expected_rate)
    }

    /// Render a tax code for operator-facing output.
    ///
    /// Unresolved lines (no code) render as an empty string.
    pub fn display_code(&self, code: Option<TaxCode>) -> String {
        match code {
            Some(TaxCode::L1) => self.display_taxed.clone(),
            Some(TaxCode::L0) => self.display_zero.clone(),
            None => String::new(),
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// A failure here is the only condition that aborts a batch before any
    /// row is processed.
    pub fn validate(&self) -> BatchResult<()> {
        let zero = BigDecimal::from(0);
        let one = BigDecimal::from(1);

        if self.code.trim().is_empty() {
            return Err(BatchError::InvalidConfig(
                "jurisdiction code cannot be empty".to_string(),
            ));
        }

        if self.expected_rate <= zero || self.expected_rate >= one {
            return Err(BatchError::InvalidConfig(format!(
                "expected rate must be between 0 and 1, got {}",
                self.expected_rate
            )));
        }

        if self.zero_threshold < zero || self.rate_tolerance < zero || self.split_slack < zero {
            return Err(BatchError::InvalidConfig(
                "thresholds and tolerances must be non-negative".to_string(),
            ));
        }

        if self.rate_tolerance >= self.expected_rate {
            return Err(BatchError::InvalidConfig(format!(
                "rate tolerance {} swallows the expected rate {}",
                self.rate_tolerance, self.expected_rate
            )));
        }

        Ok(())
    }
}
