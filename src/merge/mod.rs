//! Tax-line merging
//!
//! Associates standalone tax (debit) entries with their originating expense
//! (credit) lines via a deterministic merge key, and folds the tax amounts
//! onto the matched lines.

pub mod key;
pub mod tax_lines;

pub use key::*;
pub use tax_lines::*;
