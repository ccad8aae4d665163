use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::trace;

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Process-wide source of request nonces.
///
/// Nonces are unix seconds. Every value is strictly greater than the one
/// before it, so two allocations are always at least one second apart. The
/// lock is held while waiting for the clock to reach the next second, which
/// serializes concurrent callers instead of letting them race on the counter.
pub struct NonceAllocator {
    last: Mutex<u64>,
    clock: Arc<dyn Clock>,
}

impl NonceAllocator {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            last: Mutex::new(0),
            clock,
        }
    }

    pub async fn next(&self) -> u64 {
        let mut last = self.last.lock().await;
        loop {
            let now_ms = self.clock.now_millis().max(0) as u64;
            let now = now_ms / 1000;
            if now > *last {
                *last = now;
                return now;
            }
            let wait = 1000 - now_ms % 1000;
            trace!(last = *last, wait_ms = wait, "waiting for next nonce second");
            tokio::time::sleep(Duration::from_millis(wait)).await;
        }
    }

    pub async fn last(&self) -> u64 {
        *self.last.lock().await
    }
}

impl Default for NonceAllocator {
    fn default() -> Self {
        Self::new()
    }
}
