// Step history ledger and cost reporting

use crate::models::{CostReport, StepRecord};

/// Append-only ledger of step outcomes
#[derive(Debug, Default)]
pub struct StepHistory {
    records: Vec<StepRecord>,
}

impl StepHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Summarize timing, retries, cache hits and failures
    pub fn cost_report(&self) -> CostReport {
        CostReport {
            steps: self.records.len(),
            total_ms: self.records.iter().map(|r| r.duration_ms).sum(),
            total_retries: self.records.iter().map(|r| u64::from(r.retries_used)).sum(),
            cache_hits: self.records.iter().filter(|r| r.cached).count(),
            errors: self.records.iter().filter(|r| r.error.is_some()).count(),
            history: self.records.clone(),
        }
    }
}
