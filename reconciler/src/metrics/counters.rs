use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility.
#[derive(Clone, Default)]
pub struct Counters {
    pub matches_received: Arc<AtomicU64>,
    pub reconciled: Arc<AtomicU64>,

    // outcomes that did not advance a workflow
    pub duplicates: Arc<AtomicU64>,
    pub credits_issued: Arc<AtomicU64>,

    pub transient_retries: Arc<AtomicU64>,
    pub failures: Arc<AtomicU64>,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
