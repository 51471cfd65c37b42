//! Core record types for the expense tax reconciliation engine

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Tax treatment classification codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaxCode {
    /// Zero-rated - no tax applies to this line
    L0,
    /// Standard-taxed - the jurisdiction's full rate applies
    L1,
}

impl std::fmt::Display for TaxCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaxCode::L0 => write!(f, "L0"),
            TaxCode::L1 => write!(f, "L1"),
        }
    }
}

/// Mixed-supply flag assigned during classification
///
/// `Yes` marks a line whose posted tax implies a blend of taxed and untaxed
/// spend; such lines are split into two portions downstream. `Check` marks a
/// line whose derived split failed a sanity test and needs manual review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MixedFlag {
    No,
    Yes,
    Check,
}

impl std::fmt::Display for MixedFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MixedFlag::No => write!(f, "N"),
            MixedFlag::Yes => write!(f, "Y"),
            MixedFlag::Check => write!(f, "CHECK"),
        }
    }
}

/// One posted expense line item (credit side)
///
/// Created by the normalizer from a raw extract row and carried through the
/// pipeline. Amounts keep full precision; rounding to currency precision
/// happens only at aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseLine {
    /// Employee who submitted the expense report
    pub employee_id: String,
    /// Expense report identifier
    pub report_id: String,
    /// Date the report was submitted
    pub submit_date: Option<NaiveDate>,
    /// Date of the underlying transaction
    pub transaction_date: Option<NaiveDate>,
    /// Department / cost-center code, after any jurisdiction rewrite
    pub department: String,
    /// Normalized account code from the extract
    pub account: String,
    /// Account code as shown to operators (compound for FB cards)
    pub display_account: String,
    /// Account code used for downstream posting
    pub posting_account: String,
    /// Resolved supplier identifier, empty when no lookup matched
    pub vendor_id: String,
    /// Vendor name as it appeared in the extract
    pub vendor_name: String,
    /// Expense type description from the extract
    pub expense_type: String,
    /// Raw tax-code hint from the extract, kept for audit only
    pub tax_hint: String,
    /// Posted amount including tax (signed)
    pub gross: BigDecimal,
    /// Posted or merged tax amount (signed)
    pub tax: BigDecimal,
    /// Derived: gross - tax
    pub net: BigDecimal,
    /// Classification result; `None` until classified or when unresolved
    pub tax_code: Option<TaxCode>,
    /// Mixed-supply flag
    pub mixed: MixedFlag,
    /// Derived taxed portion of gross for mixed candidates
    pub mixed_taxable: Option<BigDecimal>,
    /// Derived untaxed portion of gross for mixed candidates
    pub mixed_nontaxable: Option<BigDecimal>,
    /// Split segment label ("L1 portion" / "L0 portion" / "UNRESOLVED")
    pub segment: String,
    /// Free-text note attached by classification/splitting
    pub note: String,
    /// Fields whose values were best-effort coerced during normalization
    pub coerced_fields: Vec<String>,
}

impl ExpenseLine {
    /// Re-derive the net amount from gross and tax.
    pub fn recompute_net(&mut self) {
        self.net = &self.gross - &self.tax;
    }
}

/// A standalone tax-only ledger entry (debit side)
///
/// Carries the same identity fields as an expense line plus the tax value it
/// must contribute; it has no gross or net of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxLine {
    pub employee_id: String,
    pub report_id: String,
    pub submit_date: Option<NaiveDate>,
    pub transaction_date: Option<NaiveDate>,
    pub department: String,
    pub account: String,
    pub vendor_name: String,
    pub expense_type: String,
    /// Tax value to fold into matching expense lines
    pub tax: BigDecimal,
}

/// One output row of the aggregator
///
/// All currency fields are rounded to 2 decimal places; this is the only
/// place in the pipeline where rounding is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedLine {
    pub employee_id: String,
    pub report_id: String,
    pub submit_date: Option<NaiveDate>,
    pub department: String,
    pub vendor_id: String,
    pub display_account: String,
    pub posting_account: String,
    pub tax_code: Option<TaxCode>,
    /// Jurisdiction-specific rendering of the tax code
    pub display_tax_code: String,
    pub mixed: MixedFlag,
    pub gross: BigDecimal,
    pub tax: BigDecimal,
    pub net: BigDecimal,
    /// Absolute amount used for downstream posting
    pub posting_amount: BigDecimal,
    /// First non-empty segment label within the group
    pub segment: String,
    /// First non-empty note within the group
    pub note: String,
    pub mixed_taxable: Option<BigDecimal>,
    pub mixed_nontaxable: Option<BigDecimal>,
}

/// Errors that abort a whole batch
///
/// Everything else in the pipeline is recoverable and is represented as data
/// (a flag, a status column, a diagnostic row) rather than an error.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Invalid jurisdiction configuration: {0}")]
    InvalidConfig(String),
    #[error("Lookup table invalid: {0}")]
    InvalidLookup(String),
    #[error("Row source error: {0}")]
    Source(String),
    #[error("Report sink error: {0}")]
    Sink(String),
}

/// Result type for batch operations
pub type BatchResult<T> = Result<T, BatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_code_display() {
        assert_eq!(TaxCode::L0.to_string(), "L0");
        assert_eq!(TaxCode::L1.to_string(), "L1");
    }

    #[test]
    fn test_mixed_flag_display() {
        assert_eq!(MixedFlag::No.to_string(), "N");
        assert_eq!(MixedFlag::Yes.to_string(), "Y");
        assert_eq!(MixedFlag::Check.to_string(), "CHECK");
    }

    #[test]
    fn test_recompute_net() {
        let mut line = ExpenseLine {
            employee_id: "E100".to_string(),
            report_id: "R1".to_string(),
            submit_date: None,
            transaction_date: None,
            department: String::new(),
            account: "620100".to_string(),
            display_account: "620100".to_string(),
            posting_account: "620100".to_string(),
            vendor_id: String::new(),
            vendor_name: String::new(),
            expense_type: String::new(),
            tax_hint: String::new(),
            gross: BigDecimal::from(110),
            tax: BigDecimal::from(10),
            net: BigDecimal::from(0),
            tax_code: None,
            mixed: MixedFlag::No,
            mixed_taxable: None,
            mixed_nontaxable: None,
            segment: String::new(),
            note: String::new(),
            coerced_fields: Vec::new(),
        };

        line.recompute_net();
        assert_eq!(line.net, BigDecimal::from(100));
    }
}
