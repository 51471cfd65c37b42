//! Tax classification
//!
//! Assigns a tax code per line from the ratio of posted tax to gross,
//! using the jurisdiction's tolerance bands. Classification is a pure
//! function of (gross, tax, jurisdiction): re-running it on an already
//! classified line yields the same code and flag.

use bigdecimal::BigDecimal;

use crate::config::Jurisdiction;
use crate::types::{ExpenseLine, MixedFlag, TaxCode};
use crate::utils::money::round_cents;

/// Outcome of classifying one line
#[derive(Debug, Clone, PartialEq)]
enum Classification {
    /// No tax: zero-rated
    Zero,
    /// Tax matches the jurisdiction rate: standard-taxed
    Taxed,
    /// Tax is materially below the rate: a blend of taxed and untaxed spend
    Mixed {
        taxable: BigDecimal,
        nontaxable: BigDecimal,
    },
    /// Derived split failed its sanity check: manual review
    Review,
}

fn decide(gross: &BigDecimal, tax: &BigDecimal, jurisdiction: &Jurisdiction) -> Classification {
    if *tax <= jurisdiction.zero_threshold {
        return Classification::Zero;
    }
    // Nonzero tax on a (near-)zero gross cannot be rated; default to
    // zero-rated and let the rate validator surface it.
    if *gross <= jurisdiction.zero_threshold {
        return Classification::Zero;
    }

    let ratio = tax / gross;
    let expected = jurisdiction.gross_ratio();
    let deviation = (&ratio - &expected).abs();

    if deviation <= jurisdiction.rate_tolerance {
        return Classification::Taxed;
    }

    if ratio < expected {
        // The portion of gross that would carry full tax at the expected
        // ratio, and the untaxed remainder.
        let taxable = round_cents(&(tax / &expected));
        let nontaxable = round_cents(&(gross - &taxable));

        let upper_bound = gross + &jurisdiction.split_slack;
        let lower_bound = -jurisdiction.split_slack.clone();
        if taxable <= upper_bound && nontaxable >= lower_bound {
            return Classification::Mixed { taxable, nontaxable };
        }
        return Classification::Review;
    }

    Classification::Zero
}

/// Classify a single line in place.
pub fn classify_line(line: &mut ExpenseLine, jurisdiction: &Jurisdiction) {
    let gross = line.gross.abs();
    let tax = line.tax.abs();

    match decide(&gross, &tax, jurisdiction) {
        Classification::Zero => {
            line.tax_code = Some(TaxCode::L0);
            line.mixed = MixedFlag::No;
            line.mixed_taxable = None;
            line.mixed_nontaxable = None;
        }
        Classification::Taxed => {
            line.tax_code = Some(TaxCode::L1);
            line.mixed = MixedFlag::No;
            line.mixed_taxable = None;
            line.mixed_nontaxable = None;
        }
        Classification::Mixed { taxable, nontaxable } => {
            line.tax_code = Some(TaxCode::L1);
            line.mixed = MixedFlag::Yes;
            line.note = format!(
                "Mixed supply: posted tax {} implies taxed portion {} and untaxed portion {}",
                tax, taxable, nontaxable
            );
            line.mixed_taxable = Some(taxable);
            line.mixed_nontaxable = Some(nontaxable);
        }
        Classification::Review => {
            line.tax_code = None;
            line.mixed = MixedFlag::Check;
            line.mixed_taxable = None;
            line.mixed_nontaxable = None;
            line.note = format!(
                "Posted tax {} does not yield a usable taxed/untaxed split of gross {}; review manually",
                tax, gross
            );
        }
    }
}

/// Classify every line in a batch.
pub fn classify_lines(mut lines: Vec<ExpenseLine>, jurisdiction: &Jurisdiction) -> Vec<ExpenseLine> {
    for line in &mut lines {
        classify_line(line, jurisdiction);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(gross: &str, tax: &str) -> ExpenseLine {
        let gross: BigDecimal = gross.parse().unwrap();
        let tax: BigDecimal = tax.parse().unwrap();
        let net = &gross - &tax;
        ExpenseLine {
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
            gross,
            tax,
            net,
            tax_code: None,
            mixed: MixedFlag::No,
            mixed_taxable: None,
            mixed_nontaxable: None,
            segment: String::new(),
            note: String::new(),
            coerced_fields: Vec::new(),
        }
    }

    #[test]
    fn test_full_rate_line_is_taxed() {
        let mut l = line("110.00", "10.00");
        classify_line(&mut l, &Jurisdiction::australia());

        assert_eq!(l.tax_code, Some(TaxCode::L1));
        assert_eq!(l.mixed, MixedFlag::No);
    }

    #[test]
    fn test_zero_tax_line_is_zero_rated() {
        let mut l = line("100.00", "0.00");
        classify_line(&mut l, &Jurisdiction::australia());

        assert_eq!(l.tax_code, Some(TaxCode::L0));
        assert_eq!(l.mixed, MixedFlag::No);
    }

    #[test]
    fn test_below_rate_line_becomes_mixed_candidate() {
        let mut l = line("108.00", "8.00");
        classify_line(&mut l, &Jurisdiction::australia());

        assert_eq!(l.mixed, MixedFlag::Yes);
        assert_eq!(l.tax_code, Some(TaxCode::L1));
        assert_eq!(l.mixed_taxable, Some("88.00".parse::<BigDecimal>().unwrap()));
        assert_eq!(l.mixed_nontaxable, Some("20.00".parse::<BigDecimal>().unwrap()));
        assert!(!l.note.is_empty());
    }

    #[test]
    fn test_small_amount_mixed_candidate() {
        let mut l = line("3.10", "0.25");
        classify_line(&mut l, &Jurisdiction::australia());

        assert_eq!(l.mixed, MixedFlag::Yes);
        assert_eq!(l.mixed_taxable, Some("2.75".parse::<BigDecimal>().unwrap()));
        assert_eq!(l.mixed_nontaxable, Some("0.35".parse::<BigDecimal>().unwrap()));
    }

    #[test]
    fn test_negative_amounts_classify_on_absolutes() {
        let mut l = line("-110.00", "-10.00");
        classify_line(&mut l, &Jurisdiction::australia());

        assert_eq!(l.tax_code, Some(TaxCode::L1));
        assert_eq!(l.mixed, MixedFlag::No);
    }

    #[test]
    fn test_zero_gross_with_tax_defaults_to_zero_rated() {
        let mut l = line("0.00", "4.00");
        classify_line(&mut l, &Jurisdiction::australia());

        assert_eq!(l.tax_code, Some(TaxCode::L0));
        assert_eq!(l.mixed, MixedFlag::No);
    }

    #[test]
    fn test_over_rate_line_defaults_to_zero_rated() {
        // Above the band; surfaced later by the rate validator.
        let mut l = line("110.00", "20.00");
        classify_line(&mut l, &Jurisdiction::australia());

        assert_eq!(l.tax_code, Some(TaxCode::L0));
        assert_eq!(l.mixed, MixedFlag::No);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let mut first = line("108.00", "8.00");
        classify_line(&mut first, &Jurisdiction::australia());
        let mut second = first.clone();
        classify_line(&mut second, &Jurisdiction::australia());

        assert_eq!(first.tax_code, second.tax_code);
        assert_eq!(first.mixed, second.mixed);
        assert_eq!(first.mixed_taxable, second.mixed_taxable);
        assert_eq!(first.mixed_nontaxable, second.mixed_nontaxable);
    }

    #[test]
    fn test_nz_rate_band() {
        let mut l = line("115.00", "15.00");
        classify_line(&mut l, &Jurisdiction::new_zealand());

        assert_eq!(l.tax_code, Some(TaxCode::L1));
        assert_eq!(l.mixed, MixedFlag::No);
    }
}
