//! Record-store writes still in flight when the REPL exits.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How long exit waits for outstanding writes.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Default)]
pub struct PendingWrites {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl PendingWrites {
    pub fn track(&self, handle: JoinHandle<()>) {
        let mut handles = self.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Wait up to `limit` for every tracked write. Writes still running at
    /// the deadline are aborted; returns how many that was.
    pub async fn flush(&self, limit: Duration) -> usize {
        let handles = std::mem::take(&mut *self.lock());
        if handles.is_empty() {
            return 0;
        }

        debug!(count = handles.len(), "waiting for pending record writes");
        let deadline = tokio::time::Instant::now() + limit;
        let mut abandoned = 0;
        for mut handle in handles {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "record write task failed"),
                Err(_) => {
                    handle.abort();
                    abandoned += 1;
                }
            }
        }
        if abandoned > 0 {
            warn!(abandoned, "record writes abandoned at exit");
        }
        abandoned
    }

    fn lock(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn flush_waits_for_slow_write() {
        let done = Arc::new(AtomicBool::new(false));
        let pending = PendingWrites::default();
        pending.track(tokio::spawn({
            let done = done.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                done.store(true, Ordering::SeqCst);
            }
        }));

        assert_eq!(pending.flush(Duration::from_secs(5)).await, 0);
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn flush_gives_up_at_the_deadline() {
        let pending = PendingWrites::default();
        pending.track(tokio::spawn(std::future::pending::<()>()));
        pending.track(tokio::spawn(async {}));

        assert_eq!(pending.flush(Duration::from_millis(50)).await, 1);
    }

    #[tokio::test]
    async fn flush_with_nothing_tracked() {
        let pending = PendingWrites::default();
        assert_eq!(pending.flush(Duration::from_millis(10)).await, 0);
    }
}
