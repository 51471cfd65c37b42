//! # Expense Recon Core
//!
//! A reconciliation engine for expense-report extracts against a
//! separately-reported GST ledger: deterministic key-based matching of tax
//! lines to expense lines, tolerance-driven tax classification, mixed-line
//! splitting, aggregation with currency rounding, and a unified
//! reconciliation report.
//!
//! ## Features
//!
//! - **Record normalization**: typed records from noisy tabular extracts,
//!   with best-effort coercion that is recorded rather than silent
//! - **Tax-line merging**: standalone tax entries folded onto matching
//!   expense lines via a three-tier merge key
//! - **Tax classification**: zero-rated / taxed / mixed-candidate codes from
//!   per-jurisdiction tolerance bands
//! - **Mixed-line splitting**: one blended line becomes a taxed and an
//!   untaxed portion that sum back to the original
//! - **Reconciliation reporting**: per-report totals, rate diagnostics, and
//!   a flattened posting view for downstream bulk entry
//! - **Adapter seams**: spreadsheet/CSV reading and workbook writing live
//!   behind `RowSource`/`ReportSink` traits, never in the core
//!
//! ## Quick Start
//!
//! ```rust
//! use expense_recon_core::{Jurisdiction, Lookups, RawRow, ReconEngine};
//!
//! let engine = ReconEngine::new(Jurisdiction::australia(), Lookups::default()).unwrap();
//!
//! let rows = vec![RawRow::new()
//!     .with("Journal Payer Payment Type Name", "COMPANY")
//!     .with("Report Entry Payment Code Name", "CASH")
//!     .with("Employee ID", "E100")
//!     .with("Report ID", "R900")
//!     .with("Journal Account Code", "620100")
//!     .with("Journal Amount", 110.0)
//!     .with("Report Entry Total Tax Posted Amount", 10.0)];
//!
//! let output = engine.process_batch(&rows);
//! assert_eq!(output.aggregated.len(), 1);
//! ```

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod lookup;
pub mod merge;
pub mod normalize;
pub mod report;
pub mod tax;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use aggregate::*;
pub use config::*;
pub use engine::*;
pub use lookup::*;
pub use merge::*;
pub use normalize::*;
pub use report::*;
pub use tax::*;
pub use traits::*;
pub use types::*;
