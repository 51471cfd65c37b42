//! Aggregation
//!
//! Groups classified lines by their full identity key, sums amounts at full
//! precision, and rounds to currency precision - the only rounding point in
//! the pipeline. Grouping runs over a `BTreeMap` keyed by the ordered
//! identity tuple and carried text fields keep input encounter order, so
//! output is reproducible for any input ordering.

pub mod rate_check;

pub use rate_check::*;

use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::config::Jurisdiction;
use crate::types::{AggregatedLine, ExpenseLine, MixedFlag, TaxCode};
use crate::utils::money::round_cents;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct GroupKey {
    employee_id: String,
    report_id: String,
    submit_date: Option<NaiveDate>,
    department: String,
    vendor_id: String,
    display_account: String,
    tax_code: Option<TaxCode>,
    mixed: MixedFlag,
}

#[derive(Debug, Default)]
struct GroupSums {
    gross: BigDecimal,
    tax: BigDecimal,
    posting_account: String,
    segment: String,
    note: String,
    mixed_taxable: Option<BigDecimal>,
    mixed_nontaxable: Option<BigDecimal>,
}

/// Group, sum and round a batch of classified lines.
///
/// Output is sorted by (vendor, report, employee, submit date, department,
/// display account, tax code) for stable, diffable results.
pub fn aggregate_lines(lines: &[ExpenseLine], jurisdiction: &Jurisdiction) -> Vec<AggregatedLine> {
    let mut groups: BTreeMap<GroupKey, GroupSums> = BTreeMap::new();

    for line in lines {
        let key = GroupKey {
            employee_id: line.employee_id.clone(),
            report_id: line.report_id.clone(),
            submit_date: line.submit_date,
            department: line.department.clone(),
            vendor_id: line.vendor_id.clone(),
            display_account: line.display_account.clone(),
            tax_code: line.tax_code,
            mixed: line.mixed,
        };

        let sums = groups.entry(key).or_default();
        sums.gross += &line.gross;
        sums.tax += &line.tax;
        if sums.posting_account.is_empty() {
            sums.posting_account = line.posting_account.clone();
        }
        if sums.segment.is_empty() {
            sums.segment = line.segment.clone();
        }
        if sums.note.is_empty() {
            sums.note = line.note.clone();
        }
        if sums.mixed_taxable.is_none() {
            sums.mixed_taxable = line.mixed_taxable.clone();
        }
        if sums.mixed_nontaxable.is_none() {
            sums.mixed_nontaxable = line.mixed_nontaxable.clone();
        }
    }

    let mut out: Vec<AggregatedLine> = groups
        .into_iter()
        .map(|(key, sums)| {
            let gross = round_cents(&sums.gross);
            let tax = round_cents(&sums.tax);
            // Deriving net from the rounded figures keeps the net invariant
            // exact on every output row.
            let net = &gross - &tax;
            let posting_amount = gross.abs();
            AggregatedLine {
                employee_id: key.employee_id,
                report_id: key.report_id,
                submit_date: key.submit_date,
                department: key.department,
                vendor_id: key.vendor_id,
                display_account: key.display_account,
                posting_account: sums.posting_account,
                display_tax_code: jurisdiction.display_code(key.tax_code),
                tax_code: key.tax_code,
                mixed: key.mixed,
                gross,
                tax,
                net,
                posting_amount,
                segment: sums.segment,
                note: sums.note,
                mixed_taxable: sums.mixed_taxable,
                mixed_nontaxable: sums.mixed_nontaxable,
            }
        })
        .collect();

    out.sort_by(|a, b| {
        (
            &a.vendor_id,
            &a.report_id,
            &a.employee_id,
            &a.submit_date,
            &a.department,
            &a.display_account,
            &a.tax_code,
        )
            .cmp(&(
                &b.vendor_id,
                &b.report_id,
                &b.employee_id,
                &b.submit_date,
                &b.department,
                &b.display_account,
                &b.tax_code,
            ))
    });

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(
        employee: &str,
        report: &str,
        account: &str,
        gross: &str,
        tax: &str,
        code: TaxCode,
    ) -> ExpenseLine {
        let gross: BigDecimal = gross.parse().unwrap();
        let tax: BigDecimal = tax.parse().unwrap();
        let net = &gross - &tax;
        ExpenseLine {
            employee_id: employee.to_string(),
            report_id: report.to_string(),
            submit_date: NaiveDate::from_ymd_opt(2024, 1, 5),
            transaction_date: None,
            department: "801000".to_string(),
            account: account.to_string(),
            display_account: account.to_string(),
            posting_account: account.to_string(),
            vendor_id: "30001".to_string(),
            vendor_name: String::new(),
            expense_type: String::new(),
            tax_hint: String::new(),
            gross,
            tax,
            net,
            tax_code: Some(code),
            mixed: MixedFlag::No,
            mixed_taxable: None,
            mixed_nontaxable: None,
            segment: String::new(),
            note: String::new(),
            coerced_fields: Vec::new(),
        }
    }

    #[test]
    fn test_same_key_lines_sum() {
        let lines = vec![
            line("E100", "R1", "620100", "110.00", "10.00", TaxCode::L1),
            line("E100", "R1", "620100", "55.00", "5.00", TaxCode::L1),
        ];
        let out = aggregate_lines(&lines, &Jurisdiction::australia());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].gross, "165.00".parse::<BigDecimal>().unwrap());
        assert_eq!(out[0].tax, "15.00".parse::<BigDecimal>().unwrap());
        assert_eq!(out[0].net, "150.00".parse::<BigDecimal>().unwrap());
        assert_eq!(out[0].posting_amount, "165.00".parse::<BigDecimal>().unwrap());
    }

    #[test]
    fn test_tax_code_separates_groups() {
        let lines = vec![
            line("E100", "R1", "620100", "110.00", "10.00", TaxCode::L1),
            line("E100", "R1", "620100", "40.00", "0.00", TaxCode::L0),
        ];
        let out = aggregate_lines(&lines, &Jurisdiction::australia());

        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_rounding_happens_after_summation() {
        // Three thirds of a cent survive at full precision and only the
        // summed total is rounded.
        let third = BigDecimal::from(1) / BigDecimal::from(300); // 0.00333...
        let mut lines = Vec::new();
        for _ in 0..3 {
            let mut l = line("E100", "R1", "620100", "10.00", "0.00", TaxCode::L0);
            l.gross = &l.gross + &third;
            lines.push(l);
        }

        let out = aggregate_lines(&lines, &Jurisdiction::australia());
        assert_eq!(out[0].gross, "30.01".parse::<BigDecimal>().unwrap());
    }

    #[test]
    fn test_net_invariant_on_output() {
        let lines = vec![
            line("E100", "R1", "620100", "110.37", "10.03", TaxCode::L1),
            line("E100", "R1", "620100", "21.18", "1.93", TaxCode::L1),
        ];
        let out = aggregate_lines(&lines, &Jurisdiction::australia());

        for row in &out {
            assert_eq!(row.net, &row.gross - &row.tax);
        }
    }

    #[test]
    fn test_output_sorted_by_vendor_then_report() {
        let mut a = line("E200", "R2", "620100", "10.00", "0.00", TaxCode::L0);
        a.vendor_id = "40000".to_string();
        let b = line("E100", "R1", "620100", "10.00", "0.00", TaxCode::L0);

        let out = aggregate_lines(&[a, b], &Jurisdiction::australia());

        assert_eq!(out[0].vendor_id, "30001");
        assert_eq!(out[1].vendor_id, "40000");
    }

    #[test]
    fn test_negative_group_posting_amount_is_absolute() {
        let lines = vec![line("E100", "R1", "620100", "-110.00", "-10.00", TaxCode::L1)];
        let out = aggregate_lines(&lines, &Jurisdiction::australia());

        assert_eq!(out[0].gross, "-110.00".parse::<BigDecimal>().unwrap());
        assert_eq!(out[0].posting_amount, "110.00".parse::<BigDecimal>().unwrap());
    }

    #[test]
    fn test_display_code_mapping() {
        let lines = vec![
            line("E100", "R1", "620100", "115.00", "15.00", TaxCode::L1),
            line("E100", "R1", "620100", "40.00", "0.00", TaxCode::L0),
        ];
        let out = aggregate_lines(&lines, &Jurisdiction::new_zealand());

        let codes: Vec<&str> = out.iter().map(|l| l.display_tax_code.as_str()).collect();
        assert!(codes.contains(&"Q2"));
        assert!(codes.contains(&"Q0"));
    }

    #[test]
    fn test_first_non_empty_note_carried() {
        let mut first = line("E100", "R1", "620100", "10.00", "0.00", TaxCode::L0);
        let mut second = line("E100", "R1", "620100", "10.00", "0.00", TaxCode::L0);
        second.note = "second note".to_string();
        first.note = String::new();

        let out = aggregate_lines(&[first, second], &Jurisdiction::australia());
        assert_eq!(out[0].note, "second note");
    }
}
