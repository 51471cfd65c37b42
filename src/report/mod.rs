//! Reconciliation reporting
//!
//! Recomputes per-report totals from the aggregated rows, derives the
//! gross/net/tax difference, and merges in the unmatched-tax diagnostics so
//! every operator review item lands in one table. Also builds the flattened
//! posting view used for downstream bulk entry.

use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::merge::UnmatchedTax;
use crate::types::{AggregatedLine, MixedFlag};
use crate::utils::money::{one_cent, round_cents};

/// Review status of a reconciliation row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReconStatus {
    Ok,
    Check,
}

impl std::fmt::Display for ReconStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconStatus::Ok => write!(f, "OK"),
            ReconStatus::Check => write!(f, "CHECK"),
        }
    }
}

/// One row of the reconciliation table
///
/// Either a per-report total check or, when `diagnostic` is non-empty, an
/// unmatched-tax entry carried in for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationRow {
    pub employee_id: String,
    pub vendor_id: String,
    pub report_id: String,
    pub submit_date: Option<NaiveDate>,
    /// Absolute gross total of the group
    pub gross: BigDecimal,
    /// Absolute net total of the group
    pub net: BigDecimal,
    /// Absolute tax total of the group
    pub tax: BigDecimal,
    /// |gross| - |net|
    pub calculated_tax: BigDecimal,
    /// |tax| - calculated tax
    pub difference: BigDecimal,
    pub status: ReconStatus,
    /// Whether any aggregated line in the group was a mixed split
    pub any_mixed: bool,
    /// First non-empty note among the group's mixed lines
    pub mixed_note: String,
    /// Derived taxed-portion total across the group's mixed lines
    pub mixed_taxable_total: Option<BigDecimal>,
    /// Derived untaxed-portion total across the group's mixed lines
    pub mixed_nontaxable_total: Option<BigDecimal>,
    /// Unmatched-tax key rendering and action, empty for total rows
    pub diagnostic: String,
}

/// Build the reconciliation table from aggregated rows and merge diagnostics.
pub fn build_reconciliation(
    aggregated: &[AggregatedLine],
    unmatched: &[UnmatchedTax],
) -> Vec<ReconciliationRow> {
    type ReportKey = (String, String, String, Option<NaiveDate>);
    let mut groups: BTreeMap<ReportKey, Vec<&AggregatedLine>> = BTreeMap::new();

    for line in aggregated {
        let key = (
            line.employee_id.clone(),
            line.vendor_id.clone(),
            line.report_id.clone(),
            line.submit_date,
        );
        groups.entry(key).or_default().push(line);
    }

    let mut rows = Vec::with_capacity(groups.len() + unmatched.len());

    for ((employee_id, vendor_id, report_id, submit_date), lines) in groups {
        let gross_total: BigDecimal = lines.iter().map(|l| &l.gross).sum();
        let net_total: BigDecimal = lines.iter().map(|l| &l.net).sum();
        let tax_total: BigDecimal = lines.iter().map(|l| &l.tax).sum();

        let gross = round_cents(&gross_total.abs());
        let net = round_cents(&net_total.abs());
        let tax = round_cents(&tax_total.abs());
        let calculated_tax = &gross - &net;
        let difference = round_cents(&(&tax - &calculated_tax));

        let status = if difference.abs() < one_cent() {
            ReconStatus::Ok
        } else {
            ReconStatus::Check
        };

        let mixed_lines: Vec<&&AggregatedLine> = lines
            .iter()
            .filter(|l| l.mixed == MixedFlag::Yes)
            .collect();
        let any_mixed = !mixed_lines.is_empty();
        let mixed_note = mixed_lines
            .iter()
            .map(|l| l.note.as_str())
            .find(|note| !note.is_empty())
            .unwrap_or("")
            .to_string();
        let mixed_taxable_total = sum_present(mixed_lines.iter().map(|l| l.mixed_taxable.as_ref()));
        let mixed_nontaxable_total =
            sum_present(mixed_lines.iter().map(|l| l.mixed_nontaxable.as_ref()));

        rows.push(ReconciliationRow {
            employee_id,
            vendor_id,
            report_id,
            submit_date,
            gross,
            net,
            tax,
            calculated_tax,
            difference,
            status,
            any_mixed,
            mixed_note,
            mixed_taxable_total,
            mixed_nontaxable_total,
            diagnostic: String::new(),
        });
    }

    // Every unmatched tax entry appears once, always flagged for review.
    for item in unmatched {
        rows.push(ReconciliationRow {
            employee_id: item.key.employee().to_string(),
            vendor_id: String::new(),
            report_id: item.key.report().to_string(),
            submit_date: None,
            gross: BigDecimal::from(0),
            net: BigDecimal::from(0),
            tax: round_cents(&item.tax_found),
            calculated_tax: BigDecimal::from(0),
            difference: round_cents(&item.tax_found),
            status: ReconStatus::Check,
            any_mixed: false,
            mixed_note: String::new(),
            mixed_taxable_total: None,
            mixed_nontaxable_total: None,
            diagnostic: format!("{}: {}", item.key_display, item.action),
        });
    }

    rows
}

/// Sum the values that are present; `None` when none are.
fn sum_present<'a, I>(values: I) -> Option<BigDecimal>
where
    I: Iterator<Item = Option<&'a BigDecimal>>,
{
    let mut total: Option<BigDecimal> = None;
    for value in values.flatten() {
        total = Some(total.unwrap_or_else(|| BigDecimal::from(0)) + value);
    }
    total
}

/// One row of the flattened posting view
///
/// Group identity fields are populated only on the first row of each group,
/// matching the downstream bulk-entry sheet. The closing row of each group
/// carries the report total for validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingRow {
    pub employee_id: String,
    pub vendor_id: String,
    pub report_id: String,
    pub submit_date: Option<NaiveDate>,
    /// Posting account, or "REPORT TOTAL" on the closing row
    pub account: String,
    pub assignment: String,
    pub amount: BigDecimal,
    pub tax_code: String,
    pub text: String,
    pub cost_center: String,
}

/// Label on each group's closing row.
pub const REPORT_TOTAL_ACCOUNT: &str = "REPORT TOTAL";

/// Flatten aggregated rows into the posting view.
///
/// Rows are taken in aggregated (already sorted) order; a group ends when
/// the (employee, vendor, report, date) identity changes.
pub fn build_posting_view(aggregated: &[AggregatedLine]) -> Vec<PostingRow> {
    let mut rows = Vec::new();
    let mut current: Option<(String, String, String, Option<NaiveDate>)> = None;
    let mut group_total = BigDecimal::from(0);

    for line in aggregated {
        let key = (
            line.employee_id.clone(),
            line.vendor_id.clone(),
            line.report_id.clone(),
            line.submit_date,
        );
        let first_of_group = current.as_ref() != Some(&key);
        if first_of_group {
            if current.is_some() {
                rows.push(total_row(&group_total));
            }
            current = Some(key);
            group_total = BigDecimal::from(0);
        }

        group_total += &line.posting_amount;
        rows.push(PostingRow {
            employee_id: if first_of_group {
                line.employee_id.clone()
            } else {
                String::new()
            },
            vendor_id: if first_of_group {
                line.vendor_id.clone()
            } else {
                String::new()
            },
            report_id: if first_of_group {
                line.report_id.clone()
            } else {
                String::new()
            },
            submit_date: if first_of_group { line.submit_date } else { None },
            account: line.posting_account.clone(),
            assignment: String::new(),
            amount: line.posting_amount.clone(),
            tax_code: line.display_tax_code.clone(),
            text: String::new(),
            cost_center: line.department.clone(),
        });
    }

    if current.is_some() {
        rows.push(total_row(&group_total));
    }

    rows
}

fn total_row(total: &BigDecimal) -> PostingRow {
    PostingRow {
        employee_id: String::new(),
        vendor_id: String::new(),
        report_id: String::new(),
        submit_date: None,
        account: REPORT_TOTAL_ACCOUNT.to_string(),
        assignment: String::new(),
        amount: round_cents(total),
        tax_code: String::new(),
        text: "Report total (validation only)".to_string(),
        cost_center: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::MergeKey;
    use crate::types::TaxCode;

    fn agg(
        employee: &str,
        report: &str,
        gross: &str,
        tax: &str,
        mixed: MixedFlag,
    ) -> AggregatedLine {
        let gross: BigDecimal = gross.parse().unwrap();
        let tax: BigDecimal = tax.parse().unwrap();
        let net = &gross - &tax;
        AggregatedLine {
            employee_id: employee.to_string(),
            report_id: report.to_string(),
            submit_date: NaiveDate::from_ymd_opt(2024, 1, 5),
            department: "801000".to_string(),
            vendor_id: "30001".to_string(),
            display_account: "620100".to_string(),
            posting_account: "620100".to_string(),
            tax_code: Some(TaxCode::L1),
            display_tax_code: "L1".to_string(),
            mixed,
            posting_amount: gross.abs(),
            gross,
            tax,
            net,
            segment: String::new(),
            note: String::new(),
            mixed_taxable: None,
            mixed_nontaxable: None,
        }
    }

    fn unmatched(tax: &str) -> UnmatchedTax {
        let key = MergeKey::build("E900", "R9", None, "", "", "620100");
        UnmatchedTax {
            key_display: key.to_string(),
            key,
            tax_found: tax.parse().unwrap(),
            action: "Locate the expense line and post the tax manually".to_string(),
        }
    }

    #[test]
    fn test_balanced_group_is_ok() {
        let rows = build_reconciliation(
            &[
                agg("E100", "R1", "110.00", "10.00", MixedFlag::No),
                agg("E100", "R1", "55.00", "5.00", MixedFlag::No),
            ],
            &[],
        );

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.gross, "165.00".parse::<BigDecimal>().unwrap());
        assert_eq!(row.net, "150.00".parse::<BigDecimal>().unwrap());
        assert_eq!(row.tax, "15.00".parse::<BigDecimal>().unwrap());
        assert_eq!(row.calculated_tax, "15.00".parse::<BigDecimal>().unwrap());
        assert_eq!(row.difference, BigDecimal::from(0));
        assert_eq!(row.status, ReconStatus::Ok);
        assert!(!row.any_mixed);
    }

    #[test]
    fn test_tax_drift_flags_check() {
        // Tax total disagrees with gross - net by more than a cent.
        let mut line = agg("E100", "R1", "110.00", "10.00", MixedFlag::No);
        line.net = "98.00".parse::<BigDecimal>().unwrap();
        let rows = build_reconciliation(&[line], &[]);

        assert_eq!(rows[0].status, ReconStatus::Check);
        assert_eq!(rows[0].difference, "-2.00".parse::<BigDecimal>().unwrap());
    }

    #[test]
    fn test_mixed_details_carried() {
        let mut mixed = agg("E100", "R1", "88.00", "8.00", MixedFlag::Yes);
        mixed.note = "Mixed supply".to_string();
        mixed.mixed_taxable = Some("88.00".parse::<BigDecimal>().unwrap());
        mixed.mixed_nontaxable = Some("20.00".parse::<BigDecimal>().unwrap());
        let plain = agg("E100", "R1", "20.00", "0.00", MixedFlag::Yes);

        let rows = build_reconciliation(&[mixed, plain], &[]);

        assert_eq!(rows.len(), 1);
        assert!(rows[0].any_mixed);
        assert_eq!(rows[0].mixed_note, "Mixed supply");
        assert_eq!(rows[0].mixed_taxable_total, Some("88.00".parse::<BigDecimal>().unwrap()));
        assert_eq!(
            rows[0].mixed_nontaxable_total,
            Some("20.00".parse::<BigDecimal>().unwrap())
        );
    }

    #[test]
    fn test_unmatched_tax_appends_check_row() {
        let rows = build_reconciliation(
            &[agg("E100", "R1", "110.00", "10.00", MixedFlag::No)],
            &[unmatched("12.34")],
        );

        assert_eq!(rows.len(), 2);
        let diag = &rows[1];
        assert_eq!(diag.status, ReconStatus::Check);
        assert_eq!(diag.tax, "12.34".parse::<BigDecimal>().unwrap());
        assert_eq!(diag.employee_id, "E900");
        assert!(diag.diagnostic.contains("tier 3"));
    }

    #[test]
    fn test_posting_view_layout() {
        let aggregated = vec![
            agg("E100", "R1", "110.00", "10.00", MixedFlag::No),
            agg("E100", "R1", "-40.00", "0.00", MixedFlag::No),
            agg("E200", "R2", "55.00", "5.00", MixedFlag::No),
        ];
        let rows = build_posting_view(&aggregated);

        // Two groups, each with its rows plus a total row.
        assert_eq!(rows.len(), 5);

        assert_eq!(rows[0].employee_id, "E100");
        assert_eq!(rows[1].employee_id, "");
        assert_eq!(rows[1].amount, "40.00".parse::<BigDecimal>().unwrap());

        let first_total = &rows[2];
        assert_eq!(first_total.account, REPORT_TOTAL_ACCOUNT);
        assert_eq!(first_total.amount, "150.00".parse::<BigDecimal>().unwrap());
        assert_eq!(first_total.text, "Report total (validation only)");

        assert_eq!(rows[3].employee_id, "E200");
        assert_eq!(rows[4].account, REPORT_TOTAL_ACCOUNT);
        assert_eq!(rows[4].amount, "55.00".parse::<BigDecimal>().unwrap());
    }

    #[test]
    fn test_posting_view_empty_input() {
        assert!(build_posting_view(&[]).is_empty());
    }
}
