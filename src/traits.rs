//! Adapter traits
//!
//! The core never touches files, spreadsheets or screens. Adapters feed it
//! raw rows through [`RowSource`] and receive the finished batch through
//! [`ReportSink`]; both sides of the boundary speak typed records only.

use async_trait::async_trait;

use crate::engine::BatchOutput;
use crate::normalize::RawRow;
use crate::types::BatchResult;

/// Supplies the raw rows of one source extract
///
/// Implementations own whatever I/O is involved (spreadsheet readers, CSV
/// parsers, message queues) and surface failures as
/// [`BatchError::Source`](crate::types::BatchError::Source).
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Fetch every row of one batch, in source order.
    async fn fetch_batch(&mut self) -> BatchResult<Vec<RawRow>>;
}

/// Receives the finished output of one batch
///
/// Implementations render the result sets however the presentation layer
/// needs (workbooks, databases, HTTP responses) and surface failures as
/// [`BatchError::Sink`](crate::types::BatchError::Sink).
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Deliver one batch's output.
    async fn deliver(&mut self, output: &BatchOutput) -> BatchResult<()>;
}
