/// Cancellable deferred execution.
///
/// One pending slot: scheduling replaces (and aborts) whatever was pending,
/// so a burst of schedules within the window collapses to a single run of
/// the last future. Cancellation is explicit — identity switches and store
/// teardown abort the pending write instead of leaking an ambient timer.
///
/// Requires a tokio runtime; the pending task is aborted on drop.
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct Debounce {
    handle: Option<JoinHandle<()>>,
}

impl Debounce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending future, running `fut` after `delay` unless
    /// superseded or cancelled first.
    pub fn schedule<F>(&mut self, delay: Duration, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fut.await;
        }));
    }

    /// Abort the pending future, if any. The future never runs.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debounce {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_burst_runs_last_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut debounce = Debounce::new();

        for i in 1..=5usize {
            let counter = counter.clone();
            debounce.schedule(Duration::from_millis(30), async move {
                counter.store(i, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_millis(80)).await;
        // Only the last scheduled future ran.
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_cancel_prevents_run() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut debounce = Debounce::new();

        let c = counter.clone();
        debounce.schedule(Duration::from_millis(20), async move {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert!(debounce.is_pending());
        debounce.cancel();
        assert!(!debounce.is_pending());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_runs_after_quiet_period() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut debounce = Debounce::new();

        let c = counter.clone();
        debounce.schedule(Duration::from_millis(10), async move {
            c.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!debounce.is_pending());
    }
}
