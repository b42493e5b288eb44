use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Per-endpoint request counts, for tests and logs
#[derive(Debug, Default)]
pub struct RequestCounters {
    pub validate_text: AtomicUsize,
    pub generate_text: AtomicUsize,
    pub validate_audio: AtomicUsize,
}

impl RequestCounters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Shared state for stub handlers
#[derive(Clone)]
pub struct StubState {
    /// Delay applied before every reply
    pub delay: Duration,

    pub counters: Arc<RequestCounters>,
}

impl StubState {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            counters: Arc::new(RequestCounters::default()),
        }
    }
}

impl Default for StubState {
    fn default() -> Self {
        Self::new()
    }
}
