//! Vendor and employee lookup tables
//!
//! Both tables are supplied fully materialized by an adapter before a batch
//! runs and are read-only during processing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Normalize a vendor name for lookup: uppercase, alphanumerics only.
pub fn normalize_vendor_name(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Normalize an employee identifier for lookup: trimmed and lowercased.
pub fn normalize_employee_id(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Render a supplier identifier canonically.
///
/// Spreadsheet extracts often deliver numeric ids as floats ("10023.0");
/// those become integer strings, anything else is trimmed as-is.
fn canonical_supplier_id(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => format!("{}", value.round() as i64),
        _ => trimmed.to_string(),
    }
}

/// Vendor-name to supplier-id mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorLookup {
    entries: HashMap<String, String>,
}

impl VendorLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (name, supplier id) pairs, skipping entries that normalize
    /// to an empty key or id.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let mut lookup = Self::new();
        for (name, id) in pairs {
            lookup.insert(name.as_ref(), id.as_ref());
        }
        lookup
    }

    pub fn insert(&mut self, name: &str, supplier_id: &str) {
        let key = normalize_vendor_name(name);
        let id = canonical_supplier_id(supplier_id);
        if !key.is_empty() && !id.is_empty() {
            self.entries.insert(key, id);
        }
    }

    /// Look up a supplier id by raw vendor name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&normalize_vendor_name(name))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Employee-id to supplier-id mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeLookup {
    entries: HashMap<String, String>,
}

impl EmployeeLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (employee id, supplier id) pairs, skipping unusable entries.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let mut lookup = Self::new();
        for (employee_id, supplier_id) in pairs {
            lookup.insert(employee_id.as_ref(), supplier_id.as_ref());
        }
        lookup
    }

    pub fn insert(&mut self, employee_id: &str, supplier_id: &str) {
        let key = normalize_employee_id(employee_id);
        let id = canonical_supplier_id(supplier_id);
        if !key.is_empty() && !id.is_empty() {
            self.entries.insert(key, id);
        }
    }

    pub fn get(&self, employee_id: &str) -> Option<&str> {
        self.entries
            .get(&normalize_employee_id(employee_id))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The pair of lookup tables a batch runs with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lookups {
    pub vendors: VendorLookup,
    pub employees: EmployeeLookup,
}

impl Lookups {
    pub fn new(vendors: VendorLookup, employees: EmployeeLookup) -> Self {
        Self { vendors, employees }
    }

    /// Resolve the supplier id for an expense line.
    ///
    /// The employee map wins; otherwise the vendor map is tried with the
    /// employee's name in "FIRST LAST" then "LAST FIRST" order. Returns an
    /// empty string when nothing matches - the line still flows through the
    /// pipeline.
    pub fn resolve_vendor(&self, employee_id: &str, first_name: &str, last_name: &str) -> String {
        if let Some(id) = self.employees.get(employee_id) {
            return id.to_string();
        }

        let primary = format!("{} {}", first_name, last_name);
        if let Some(id) = self.vendors.get(&primary) {
            return id.to_string();
        }

        let alternate = format!("{} {}", last_name, first_name);
        self.vendors
            .get(&alternate)
            .map(str::to_string)
            .unwrap_or_default()
    }
}
