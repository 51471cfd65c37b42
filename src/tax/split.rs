//! Mixed-line splitting
//!
//! Replaces each mixed-flagged line with two lines: the taxed portion at the
//! jurisdiction's full rate and the untaxed remainder. The original line's
//! identity fields, flag and note are preserved on both portions so the
//! split stays traceable through aggregation and reconciliation.

use bigdecimal::BigDecimal;

use crate::config::Jurisdiction;
use crate::types::{ExpenseLine, MixedFlag, TaxCode};
use crate::utils::money::{one_cent, round_cents};

/// Segment label on the taxed portion of a split line.
pub const TAXED_SEGMENT: &str = "L1 portion";
/// Segment label on the untaxed portion of a split line.
pub const UNTAXED_SEGMENT: &str = "L0 portion";
/// Segment label on lines awaiting manual review.
pub const UNRESOLVED_SEGMENT: &str = "UNRESOLVED";

/// Split every mixed line whose derived amounts reconcile with its gross.
///
/// A mixed line whose derived taxable + nontaxable drifts from |gross| by
/// more than one cent is downgraded to `CHECK` and passed through unsplit.
/// `CHECK` and unmixed lines pass through unchanged (the former picks up the
/// unresolved segment label).
pub fn split_mixed_lines(lines: Vec<ExpenseLine>, jurisdiction: &Jurisdiction) -> Vec<ExpenseLine> {
    let mut out = Vec::with_capacity(lines.len());

    for line in lines {
        match (line.mixed, line.mixed_taxable.clone(), line.mixed_nontaxable.clone()) {
            (MixedFlag::Yes, Some(taxable), Some(nontaxable)) => {
                let gross_abs = line.gross.abs();
                let drift = (&taxable + &nontaxable - &gross_abs).abs();
                if drift > one_cent() {
                    out.push(downgrade(line));
                } else {
                    let (taxed, untaxed) = split(line, taxable, nontaxable, jurisdiction);
                    out.push(taxed);
                    out.push(untaxed);
                }
            }
            (MixedFlag::Yes, _, _) => out.push(downgrade(line)),
            (MixedFlag::Check, _, _) => {
                let mut line = line;
                line.segment = UNRESOLVED_SEGMENT.to_string();
                out.push(line);
            }
            _ => out.push(line),
        }
    }

    out
}

fn downgrade(mut line: ExpenseLine) -> ExpenseLine {
    line.mixed = MixedFlag::Check;
    line.tax_code = None;
    line.segment = UNRESOLVED_SEGMENT.to_string();
    if line.note.is_empty() {
        line.note = "Derived split does not reconcile with gross; review manually".to_string();
    } else {
        line.note = format!("{}; split does not reconcile with gross", line.note);
    }
    line
}

fn split(
    line: ExpenseLine,
    taxable: BigDecimal,
    nontaxable: BigDecimal,
    jurisdiction: &Jurisdiction,
) -> (ExpenseLine, ExpenseLine) {
    // Restore the original line's sign on both portions.
    let sign = if line.gross < BigDecimal::from(0) {
        BigDecimal::from(-1)
    } else {
        BigDecimal::from(1)
    };

    let mut taxed = line.clone();
    taxed.gross = &sign * &taxable;
    taxed.tax = &sign * round_cents(&(&taxable * jurisdiction.gross_ratio()));
    taxed.recompute_net();
    taxed.tax_code = Some(TaxCode::L1);
    taxed.segment = TAXED_SEGMENT.to_string();

    let mut untaxed = line;
    untaxed.gross = &sign * &nontaxable;
    untaxed.tax = BigDecimal::from(0);
    untaxed.recompute_net();
    untaxed.tax_code = Some(TaxCode::L0);
    untaxed.segment = UNTAXED_SEGMENT.to_string();

    (taxed, untaxed)
}
