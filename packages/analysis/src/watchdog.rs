//! Per-user analysis watchdog.
//!
//! A cleanup/alerting signal, not a kill switch: firing does not cancel
//! in-flight work. The orchestrator starts a timer at run entry and stops
//! it on every exit path — normal, fatal, and abandoned alike.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Default deadline before the watchdog fires.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(300);

/// Per-key one-shot timers. Keyed by user identity, not session.
///
/// `start` on a live key replaces the existing timer; `stop` is idempotent
/// and safe to call for keys that were never started or already fired. The
/// callback runs at most once per `start`.
#[derive(Clone, Default)]
pub struct AnalysisWatchdog {
    timers: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl AnalysisWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer for `key`. If not stopped before `deadline` elapses,
    /// `on_timeout` is invoked exactly once.
    pub fn start<F>(&self, key: &str, deadline: Duration, on_timeout: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let timers = Arc::clone(&self.timers);
        let task_key = key.to_string();

        // Hold the lock across spawn + insert so the timer task cannot
        // observe the map before its own handle is registered.
        let mut guard = self.timers.lock().unwrap();
        if let Some(previous) = guard.remove(key) {
            previous.abort();
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            // Deregister before firing; a raced `stop` wins and the
            // callback is skipped.
            if timers.lock().unwrap().remove(&task_key).is_some() {
                tracing::warn!(key = %task_key, "analysis watchdog fired");
                on_timeout();
            }
        });
        guard.insert(key.to_string(), handle);
    }

    /// Cancel and remove the timer for `key`, if any.
    pub fn stop(&self, key: &str) {
        if let Some(handle) = self.timers.lock().unwrap().remove(key) {
            handle.abort();
        }
    }

    /// Whether a timer is currently armed for `key`.
    pub fn is_armed(&self, key: &str) -> bool {
        self.timers.lock().unwrap().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn fires_once_after_deadline() {
        let watchdog = AnalysisWatchdog::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&fired);
        watchdog.start("user-1", Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!watchdog.is_armed("user-1"));
    }

    #[tokio::test]
    async fn stop_before_deadline_suppresses_callback() {
        let watchdog = AnalysisWatchdog::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&fired);
        watchdog.start("user-1", Duration::from_millis(50), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        watchdog.stop("user-1");

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let watchdog = AnalysisWatchdog::new();
        // Never started.
        watchdog.stop("user-1");

        watchdog.start("user-1", Duration::from_millis(5), || {});
        tokio::time::sleep(Duration::from_millis(30)).await;
        // Already fired.
        watchdog.stop("user-1");
        watchdog.stop("user-1");
    }

    #[tokio::test]
    async fn restart_replaces_existing_timer() {
        let watchdog = AnalysisWatchdog::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let first = Arc::clone(&fired);
        watchdog.start("user-1", Duration::from_millis(10), move || {
            first.fetch_add(10, Ordering::SeqCst);
        });
        let second = Arc::clone(&fired);
        watchdog.start("user-1", Duration::from_millis(20), move || {
            second.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(80)).await;
        // Only the replacement fired.
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let watchdog = AnalysisWatchdog::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&fired);
        watchdog.start("user-1", Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        watchdog.start("user-2", Duration::from_secs(60), || {});
        watchdog.stop("user-2");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
