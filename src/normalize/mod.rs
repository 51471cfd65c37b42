//! Record normalization
//!
//! Coerces raw heterogeneous extract rows into typed [`ExpenseLine`] and
//! [`TaxLine`] records. Only company-paid cash lines with an account code
//! survive; everything else is dropped (and counted). Numeric and date
//! coercion is best-effort: an unparsable value becomes zero / "unknown" and
//! the field name is recorded on the line for audit, never an error.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::Jurisdiction;
use crate::lookup::Lookups;
use crate::types::{ExpenseLine, MixedFlag, TaxLine};

/// GL account that all FB-prefixed card codes post to.
const CARD_POSTING_ACCOUNT: &str = "620120";

/// Accepted date renderings, day-first calendar order.
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d"];

/// Ordered source-field synonyms, resolved once per row.
///
/// The first listed name found on a row wins; later names are fallbacks for
/// older extract layouts.
pub mod columns {
    pub const PAYER_TYPE: &[&str] = &["Journal Payer Payment Type Name", "Payer Payment Type"];
    pub const PAYMENT_CODE: &[&str] = &["Report Entry Payment Code Name", "Payment Code"];
    pub const DEBIT_OR_CREDIT: &[&str] = &["Journal Debit or Credit", "Debit or Credit"];
    pub const ACCOUNT: &[&str] = &["Journal Account Code", "Account Code"];
    pub const EMPLOYEE_ID: &[&str] = &["Employee ID"];
    pub const FIRST_NAME: &[&str] = &["Employee First Name"];
    pub const LAST_NAME: &[&str] = &["Employee Last Name"];
    pub const REPORT_ID: &[&str] = &["Report ID"];
    pub const SUBMIT_DATE: &[&str] = &["Report Submit Date"];
    pub const TRANSACTION_DATE: &[&str] =
        &["Report Entry Transaction Date", "Transaction Date"];
    pub const DEPARTMENT: &[&str] = &["Department", "Cost Center"];
    pub const VENDOR_NAME: &[&str] = &["Report Entry Vendor Name", "Vendor Name"];
    pub const EXPENSE_TYPE: &[&str] = &["Report Entry Expense Type Name", "Expense Type"];
    pub const GROSS_AMOUNT: &[&str] = &["Journal Amount"];
    pub const TAX_AMOUNT: &[&str] =
        &["Report Entry Total Tax Posted Amount", "Tax Posted Amount"];
    pub const TAX_HINT: &[&str] = &["Report Entry Tax Code", "Tax Code"];
}

/// A scalar cell value from a source extract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Empty,
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<NaiveDate> for RawValue {
    fn from(value: NaiveDate) -> Self {
        RawValue::Date(value)
    }
}

impl RawValue {
    /// Render the value as display text; `Empty` renders as "".
    fn as_text(&self) -> String {
        match self {
            RawValue::Text(s) => s.trim().to_string(),
            RawValue::Number(n) => format!("{}", n),
            RawValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            RawValue::Empty => String::new(),
        }
    }
}

/// One raw extract row: column name to scalar value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    fields: HashMap<String, RawValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, convenient for tests and adapters.
    pub fn with(mut self, column: &str, value: impl Into<RawValue>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<RawValue>) {
        self.fields.insert(column.to_string(), value.into());
    }

    fn first_present(&self, synonyms: &[&str]) -> Option<&RawValue> {
        synonyms.iter().find_map(|name| self.fields.get(*name))
    }

    /// First synonym with a non-empty text rendering, or "".
    pub fn text(&self, synonyms: &[&str]) -> String {
        for name in synonyms {
            if let Some(value) = self.fields.get(*name) {
                let rendered = value.as_text();
                if !rendered.is_empty() {
                    return rendered;
                }
            }
        }
        String::new()
    }

    /// Numeric value of the first present synonym.
    ///
    /// Returns the amount and whether it was coerced: a present but
    /// unparsable value falls back to zero with the coercion flag set, an
    /// absent field is a plain zero default.
    pub fn amount(&self, synonyms: &[&str]) -> (BigDecimal, bool) {
        match self.first_present(synonyms) {
            Some(RawValue::Number(n)) => match BigDecimal::try_from(*n) {
                Ok(value) => (value, false),
                Err(_) => (BigDecimal::from(0), true),
            },
            Some(RawValue::Text(s)) => match parse_amount_text(s) {
                Some(value) => (value, false),
                None => (BigDecimal::from(0), true),
            },
            Some(RawValue::Date(_)) => (BigDecimal::from(0), true),
            Some(RawValue::Empty) | None => (BigDecimal::from(0), false),
        }
    }

    /// Date value of the first present synonym, day-first.
    ///
    /// Same coercion contract as [`RawRow::amount`]: unparsable becomes
    /// `None` with the coercion flag set.
    pub fn date(&self, synonyms: &[&str]) -> (Option<NaiveDate>, bool) {
        match self.first_present(synonyms) {
            Some(RawValue::Date(d)) => (Some(*d), false),
            Some(RawValue::Text(s)) => match parse_date_text(s) {
                Some(date) => (Some(date), false),
                None => (None, !s.trim().is_empty()),
            },
            Some(RawValue::Number(_)) => (None, true),
            Some(RawValue::Empty) | None => (None, false),
        }
    }
}

/// Parse a ledger-style amount string.
///
/// Handles thousands separators and the trailing minus convention
/// ("341,199.00-").
fn parse_amount_text(text: &str) -> Option<BigDecimal> {
    let cleaned = text.trim().replace([',', ' '], "");
    if cleaned.is_empty() {
        return None;
    }
    let (body, negative) = match cleaned.strip_suffix('-') {
        Some(body) => (body, true),
        None => (cleaned.as_str(), false),
    };
    let value: BigDecimal = body.parse().ok()?;
    Some(if negative { -value } else { value })
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Normalize an account or cost-center code: numeric-looking values become
/// integer strings, everything else is trimmed.
fn normalize_code(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => format!("{}", value.round() as i64),
        _ => trimmed.to_string(),
    }
}

fn build_display_account(code: &str) -> String {
    let upper = code.to_uppercase();
    if upper.starts_with("FB") {
        format!("{}-{}", upper, CARD_POSTING_ACCOUNT)
    } else {
        code.to_string()
    }
}

fn map_posting_account(code: &str) -> String {
    if code.to_uppercase().starts_with("FB") {
        CARD_POSTING_ACCOUNT.to_string()
    } else {
        code.to_string()
    }
}

/// Result of normalizing one batch of raw rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBatch {
    pub expense_lines: Vec<ExpenseLine>,
    pub tax_lines: Vec<TaxLine>,
    /// Rows removed by the payer/payment filter or for a missing account code
    pub dropped_rows: usize,
}

/// Normalize a batch of raw rows into typed records.
///
/// Debit rows become [`TaxLine`]s (their journal amount is the tax value);
/// everything else becomes an [`ExpenseLine`].
pub fn normalize_rows(
    rows: &[RawRow],
    lookups: &Lookups,
    jurisdiction: &Jurisdiction,
) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for row in rows {
        let payer = row.text(columns::PAYER_TYPE).to_uppercase();
        let payment = row.text(columns::PAYMENT_CODE).to_uppercase();
        if payer != "COMPANY" || payment != "CASH" {
            batch.dropped_rows += 1;
            continue;
        }

        let account_raw = row.text(columns::ACCOUNT);
        if account_raw.is_empty() {
            batch.dropped_rows += 1;
            continue;
        }
        let account = normalize_code(&account_raw);

        let mut coerced_fields = Vec::new();
        let mut track = |name: &str, coerced: bool| {
            if coerced {
                coerced_fields.push(name.to_string());
            }
        };

        let (submit_date, coerced) = row.date(columns::SUBMIT_DATE);
        track(columns::SUBMIT_DATE[0], coerced);
        let (transaction_date, coerced) = row.date(columns::TRANSACTION_DATE);
        track(columns::TRANSACTION_DATE[0], coerced);
        let (gross, coerced) = row.amount(columns::GROSS_AMOUNT);
        track(columns::GROSS_AMOUNT[0], coerced);

        let employee_id = row.text(columns::EMPLOYEE_ID);
        let report_id = row.text(columns::REPORT_ID);
        let department = jurisdiction
            .cost_center_rule
            .apply(&normalize_code(&row.text(columns::DEPARTMENT)));
        let vendor_name = row.text(columns::VENDOR_NAME);
        let expense_type = row.text(columns::EXPENSE_TYPE);

        let side = row.text(columns::DEBIT_OR_CREDIT).to_uppercase();
        if side.starts_with('D') {
            // Standalone tax entry: the journal amount is the tax value.
            batch.tax_lines.push(TaxLine {
                employee_id,
                report_id,
                submit_date,
                transaction_date,
                department,
                account,
                vendor_name,
                expense_type,
                tax: gross,
            });
            continue;
        }

        let (tax, coerced) = row.amount(columns::TAX_AMOUNT);
        track(columns::TAX_AMOUNT[0], coerced);

        let vendor_id = lookups.resolve_vendor(
            &employee_id,
            &row.text(columns::FIRST_NAME),
            &row.text(columns::LAST_NAME),
        );

        let net = &gross - &tax;
        batch.expense_lines.push(ExpenseLine {
            employee_id,
            report_id,
            submit_date,
            transaction_date,
            department,
            display_account: build_display_account(&account),
            posting_account: map_posting_account(&account),
            account,
            vendor_id,
            vendor_name,
            expense_type,
            tax_hint: row.text(columns::TAX_HINT).to_uppercase(),
            gross,
            tax,
            net,
            tax_code: None,
            mixed: MixedFlag::No,
            mixed_taxable: None,
            mixed_nontaxable: None,
            segment: String::new(),
            note: String::new(),
            coerced_fields,
        });
    }

    batch
}
