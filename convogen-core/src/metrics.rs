use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub prompts_processed: u64,
    pub variations_expanded: u64,
    pub generation_calls: u64,
    pub transport_retries: u64,
    pub validation_pass: u64,
    pub validation_fail: u64,
    pub records_accepted: u64,
    pub records_exhausted: u64,
    pub records_written: u64,
}

pub trait Metrics: Send + Sync {
    fn inc_prompt_processed(&self);
    fn inc_variation_expanded(&self);
    fn inc_generation_call(&self);
    fn inc_transport_retry(&self);
    fn record_validation_pass(&self);
    fn record_validation_fail(&self);
    fn inc_record_accepted(&self);
    fn inc_record_exhausted(&self);
    fn inc_record_written(&self);
    fn snapshot(&self) -> MetricsSnapshot;
}

pub struct InMemoryMetrics {
    prompts_processed: AtomicU64,
    variations_expanded: AtomicU64,
    generation_calls: AtomicU64,
    transport_retries: AtomicU64,
    validation_pass: AtomicU64,
    validation_fail: AtomicU64,
    records_accepted: AtomicU64,
    records_exhausted: AtomicU64,
    records_written: AtomicU64,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self {
            prompts_processed: AtomicU64::new(0),
            variations_expanded: AtomicU64::new(0),
            generation_calls: AtomicU64::new(0),
            transport_retries: AtomicU64::new(0),
            validation_pass: AtomicU64::new(0),
            validation_fail: AtomicU64::new(0),
            records_accepted: AtomicU64::new(0),
            records_exhausted: AtomicU64::new(0),
            records_written: AtomicU64::new(0),
        }
    }
}

impl Default for InMemoryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics for InMemoryMetrics {
    fn inc_prompt_processed(&self) {
        self.prompts_processed.fetch_add(1, Ordering::Relaxed);
    }
    fn inc_variation_expanded(&self) {
        self.variations_expanded.fetch_add(1, Ordering::Relaxed);
    }
    fn inc_generation_call(&self) {
        self.generation_calls.fetch_add(1, Ordering::Relaxed);
    }
    fn inc_transport_retry(&self) {
        self.transport_retries.fetch_add(1, Ordering::Relaxed);
    }
    fn record_validation_pass(&self) {
        self.validation_pass.fetch_add(1, Ordering::Relaxed);
    }
    fn record_validation_fail(&self) {
        self.validation_fail.fetch_add(1, Ordering::Relaxed);
    }
    fn inc_record_accepted(&self) {
        self.records_accepted.fetch_add(1, Ordering::Relaxed);
    }
    fn inc_record_exhausted(&self) {
        self.records_exhausted.fetch_add(1, Ordering::Relaxed);
    }
    fn inc_record_written(&self) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
    }
    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            prompts_processed: self.prompts_processed.load(Ordering::Relaxed),
            variations_expanded: self.variations_expanded.load(Ordering::Relaxed),
            generation_calls: self.generation_calls.load(Ordering::Relaxed),
            transport_retries: self.transport_retries.load(Ordering::Relaxed),
            validation_pass: self.validation_pass.load(Ordering::Relaxed),
            validation_fail: self.validation_fail.load(Ordering::Relaxed),
            records_accepted: self.records_accepted.load(Ordering::Relaxed),
            records_exhausted: self.records_exhausted.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
        }
    }
}
