//! Merge-key construction
//!
//! A key is built from the most specific identity fields available on a
//! line, falling back through three tiers. Keys from different tiers are
//! never equal, even when their shared fields match - tier is part of the
//! identity.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{ExpenseLine, TaxLine};

/// Composite identifier associating tax entries with expense lines
///
/// Variants are ordered from most to least specific. `Full` requires a
/// transaction date plus expense type and vendor name; `Dated` drops the two
/// descriptive fields; `Basic` is used when the transaction date is missing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MergeKey {
    Full {
        employee: String,
        report: String,
        transaction_date: NaiveDate,
        expense_type: String,
        vendor: String,
        account: String,
    },
    Dated {
        employee: String,
        report: String,
        transaction_date: NaiveDate,
        account: String,
    },
    Basic {
        employee: String,
        report: String,
        account: String,
    },
}

impl MergeKey {
    /// Build the most specific key the line's fields allow.
    pub fn build(
        employee: &str,
        report: &str,
        transaction_date: Option<NaiveDate>,
        expense_type: &str,
        vendor: &str,
        account: &str,
    ) -> MergeKey {
        let employee = normalize_key_field(employee);
        let report = normalize_key_field(report);
        let expense_type = normalize_key_field(expense_type);
        let vendor = normalize_key_field(vendor);
        let account = normalize_key_field(account);

        match transaction_date {
            Some(date) if !expense_type.is_empty() && !vendor.is_empty() => MergeKey::Full {
                employee,
                report,
                transaction_date: date,
                expense_type,
                vendor,
                account,
            },
            Some(date) => MergeKey::Dated {
                employee,
                report,
                transaction_date: date,
                account,
            },
            None => MergeKey::Basic {
                employee,
                report,
                account,
            },
        }
    }

    pub fn for_expense_line(line: &ExpenseLine) -> MergeKey {
        MergeKey::build(
            &line.employee_id,
            &line.report_id,
            line.transaction_date,
            &line.expense_type,
            &line.vendor_name,
            &line.account,
        )
    }

    pub fn for_tax_line(line: &TaxLine) -> MergeKey {
        MergeKey::build(
            &line.employee_id,
            &line.report_id,
            line.transaction_date,
            &line.expense_type,
            &line.vendor_name,
            &line.account,
        )
    }

    /// Specificity tier: 1 is the most specific.
    pub fn tier(&self) -> u8 {
        match self {
            MergeKey::Full { .. } => 1,
            MergeKey::Dated { .. } => 2,
            MergeKey::Basic { .. } => 3,
        }
    }

    pub fn employee(&self) -> &str {
        match self {
            MergeKey::Full { employee, .. }
            | MergeKey::Dated { employee, .. }
            | MergeKey::Basic { employee, .. } => employee,
        }
    }

    pub fn report(&self) -> &str {
        match self {
            MergeKey::Full { report, .. }
            | MergeKey::Dated { report, .. }
            | MergeKey::Basic { report, .. } => report,
        }
    }

    pub fn account(&self) -> &str {
        match self {
            MergeKey::Full { account, .. }
            | MergeKey::Dated { account, .. }
            | MergeKey::Basic { account, .. } => account,
        }
    }
}

impl std::fmt::Display for MergeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeKey::Full {
                employee,
                report,
                transaction_date,
                expense_type,
                vendor,
                account,
            } => write!(
                f,
                "employee={} report={} date={} type={} vendor={} account={} [tier 1]",
                employee, report, transaction_date, expense_type, vendor, account
            ),
            MergeKey::Dated {
                employee,
                report,
                transaction_date,
                account,
            } => write!(
                f,
                "employee={} report={} date={} account={} [tier 2]",
                employee, report, transaction_date, account
            ),
            MergeKey::Basic {
                employee,
                report,
                account,
            } => write!(
                f,
                "employee={} report={} account={} [tier 3]",
                employee, report, account
            ),
        }
    }
}

/// Uppercase and collapse internal whitespace so cosmetic differences do not
/// break matching.
fn normalize_key_field(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_full_key_when_all_fields_present() {
        let key = MergeKey::build("E100", "R1", Some(date(3)), "Meals", "Cafe Uno", "620100");
        assert_eq!(key.tier(), 1);
    }

    #[test]
    fn test_falls_back_when_descriptors_missing() {
        let key = MergeKey::build("E100", "R1", Some(date(3)), "", "Cafe Uno", "620100");
        assert_eq!(key.tier(), 2);

        let key = MergeKey::build("E100", "R1", Some(date(3)), "Meals", "  ", "620100");
        assert_eq!(key.tier(), 2);
    }

    #[test]
    fn test_falls_back_when_date_missing() {
        let key = MergeKey::build("E100", "R1", None, "Meals", "Cafe Uno", "620100");
        assert_eq!(key.tier(), 3);
    }

    #[test]
    fn test_keys_from_different_tiers_never_equal() {
        let full = MergeKey::build("E100", "R1", Some(date(3)), "Meals", "Cafe Uno", "620100");
        let basic = MergeKey::build("E100", "R1", None, "Meals", "", "620100");
        assert_ne!(full, basic);
    }

    #[test]
    fn test_field_normalization() {
        let a = MergeKey::build("e100", "r1", Some(date(3)), "meals", "cafe  uno", "620100");
        let b = MergeKey::build("E100 ", " R1", Some(date(3)), "MEALS", "Cafe Uno", "620100");
        assert_eq!(a, b);
    }

    #[test]
    fn test_display_rendering() {
        let key = MergeKey::build("E100", "R1", None, "", "", "620100");
        assert_eq!(
            key.to_string(),
            "employee=E100 report=R1 account=620100 [tier 3]"
        );
    }
}
