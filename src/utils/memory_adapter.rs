//! In-memory adapter implementations for testing and development

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::engine::BatchOutput;
use crate::normalize::RawRow;
use crate::traits::{ReportSink, RowSource};
use crate::types::BatchResult;

/// Row source backed by a vector of pre-built rows
#[derive(Debug, Clone, Default)]
pub struct MemoryRowSource {
    rows: Vec<RawRow>,
}

impl MemoryRowSource {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl RowSource for MemoryRowSource {
    async fn fetch_batch(&mut self) -> BatchResult<Vec<RawRow>> {
        Ok(self.rows.clone())
    }
}

/// Report sink that collects delivered outputs
///
/// Cloning shares the underlying store, so tests can keep a handle while
/// the engine owns the sink.
#[derive(Debug, Clone, Default)]
pub struct MemoryReportSink {
    outputs: Arc<RwLock<Vec<BatchOutput>>>,
}

impl MemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything delivered so far.
    pub fn outputs(&self) -> Vec<BatchOutput> {
        self.outputs.read().unwrap().clone()
    }

    /// Clear all collected outputs (useful for testing).
    pub fn clear(&self) {
        self.outputs.write().unwrap().clear();
    }
}

#[async_trait]
impl ReportSink for MemoryReportSink {
    async fn deliver(&mut self, output: &BatchOutput) -> BatchResult<()> {
        self.outputs.write().unwrap().push(output.clone());
        Ok(())
    }
}
