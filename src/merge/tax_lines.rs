//! Tax-line merger
//!
//! Sums tax values per merge key (order-independent), then allocates each
//! total across the expense lines sharing that key proportionally to their
//! absolute gross amounts. The allocated share replaces any tax estimate the
//! expense line carried. Keys with no matching expense line become
//! diagnostics, never failures.

use std::collections::{BTreeMap, HashMap};

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::merge::key::MergeKey;
use crate::types::{ExpenseLine, TaxLine};

/// A tax entry whose key matched no expense line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedTax {
    pub key: MergeKey,
    /// Human-readable key rendering for the reconciliation report
    pub key_display: String,
    /// Total tax found under the key
    pub tax_found: BigDecimal,
    /// What the operator should do about it
    pub action: String,
}

/// Result of merging tax lines into expense lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub lines: Vec<ExpenseLine>,
    pub unmatched: Vec<UnmatchedTax>,
}

/// Fold standalone tax entries into the expense lines they belong to.
///
/// After allocation every line's net is recomputed as gross - tax.
pub fn merge_tax_lines(mut lines: Vec<ExpenseLine>, tax_lines: &[TaxLine]) -> MergeOutcome {
    // Summing into a BTreeMap makes the totals independent of input order
    // and the allocation pass deterministic.
    let mut totals: BTreeMap<MergeKey, BigDecimal> = BTreeMap::new();
    for tax_line in tax_lines {
        let key = MergeKey::for_tax_line(tax_line);
        *totals.entry(key).or_insert_with(|| BigDecimal::from(0)) += &tax_line.tax;
    }

    let mut index: HashMap<MergeKey, Vec<usize>> = HashMap::new();
    for (i, line) in lines.iter().enumerate() {
        index.entry(MergeKey::for_expense_line(line)).or_default().push(i);
    }

    let mut unmatched = Vec::new();
    for (key, total) in totals {
        match index.get(&key) {
            Some(positions) => allocate_total(&mut lines, positions, &total),
            None => unmatched.push(UnmatchedTax {
                key_display: key.to_string(),
                key,
                tax_found: total,
                action: "Locate the expense line and post the tax manually".to_string(),
            }),
        }
    }

    for line in &mut lines {
        line.recompute_net();
    }

    MergeOutcome { lines, unmatched }
}

/// Allocate a tax total across the matched lines.
///
/// Shares are proportional to each line's absolute gross; when the grosses
/// sum to zero the total is split evenly instead. The last line takes the
/// remainder so the allocated shares always sum exactly to the total.
fn allocate_total(lines: &mut [ExpenseLine], positions: &[usize], total: &BigDecimal) {
    let zero = BigDecimal::from(0);
    let gross_sum: BigDecimal = positions.iter().map(|&i| lines[i].gross.abs()).sum();

    let mut allocated = BigDecimal::from(0);
    let count = positions.len();
    for (n, &i) in positions.iter().enumerate() {
        let share = if n + 1 == count {
            total - &allocated
        } else if gross_sum > zero {
            total * lines[i].gross.abs() / &gross_sum
        } else {
            total / BigDecimal::from(count as i64)
        };
        allocated += &share;
        lines[i].tax = share;
    }
}
