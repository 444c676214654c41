//! Polling synchronizer
//!
//! One configurable primitive replaces the per-view polling loops: fetch
//! immediately, then on a fixed interval, publishing snapshots through a
//! watch channel. A failed poll after the first load keeps the previous value
//! so views never flicker back to empty on a transient blip.
//!
//! Responses can resolve out of order because polls are fire-and-forget and
//! in-flight requests are never aborted. Each request therefore carries a
//! monotonically increasing sequence number and a response is discarded when
//! a later request has already been applied (last request wins).

use crate::error::Result;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Snapshot of a polled resource.
#[derive(Debug, Clone)]
pub enum PollState<T> {
    /// Blocking initial load: nothing has come back yet.
    Loading,
    /// At least one poll completed. `value` is the last good payload and
    /// survives later failures; `last_error` is set while the most recent
    /// poll failed.
    Ready {
        value: Option<T>,
        last_error: Option<String>,
    },
}

impl<T> PollState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, PollState::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            PollState::Ready { value, .. } => value.as_ref(),
            PollState::Loading => None,
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        match self {
            PollState::Ready { last_error, .. } => last_error.as_deref(),
            PollState::Loading => None,
        }
    }
}

/// A background polling task bound to one view. Dropping the handle clears
/// the timer; rebuilding on a dependency change is done by dropping and
/// spawning a fresh resource.
pub struct PolledResource<T> {
    rx: watch::Receiver<PollState<T>>,
    task: JoinHandle<()>,
}

impl<T> PolledResource<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Spawn a polling loop: one fetch now, then one per `every`.
    pub fn spawn<F, Fut>(name: impl Into<String>, every: Duration, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let name = name.into();
        let (tx, rx) = watch::channel(PollState::Loading);
        let tx = Arc::new(tx);
        let fetch = Arc::new(fetch);

        let task = tokio::spawn(async move {
            let started = Arc::new(AtomicU64::new(0));
            let applied = Arc::new(AtomicU64::new(0));

            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let request_seq = started.fetch_add(1, Ordering::SeqCst) + 1;
                let fetch = Arc::clone(&fetch);
                let tx = Arc::clone(&tx);
                let applied = Arc::clone(&applied);
                let name = name.clone();

                // Fire-and-forget so a slow response never delays the next
                // tick; the sequence guard handles the resulting races.
                tokio::spawn(async move {
                    let result = fetch().await;

                    // The sender's lock serializes this closure across
                    // responses, so the sequence check and the write are one
                    // atomic step: a stale response can never slip in between
                    // a newer response's check and its write.
                    tx.send_if_modified(|state| {
                        let newest_applied = applied.fetch_max(request_seq, Ordering::AcqRel);
                        if newest_applied >= request_seq {
                            debug!(
                                resource = %name,
                                seq = request_seq,
                                "discarding stale poll response"
                            );
                            return false;
                        }
                        apply(state, result, &name);
                        true
                    });
                });
            }
        });

        Self { rx, task }
    }

    /// Subscribe to state snapshots.
    pub fn subscribe(&self) -> watch::Receiver<PollState<T>> {
        self.rx.clone()
    }

    /// Current state.
    pub fn state(&self) -> PollState<T> {
        self.rx.borrow().clone()
    }
}

impl<T> Drop for PolledResource<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn apply<T>(state: &mut PollState<T>, result: Result<T>, name: &str) {
    match result {
        Ok(value) => {
            *state = PollState::Ready {
                value: Some(value),
                last_error: None,
            };
        }
        Err(e) => {
            warn!(resource = %name, error = %e, "poll failed");
            match state {
                // The very first response resolves the blocking load even on
                // failure, so the view can render an empty-safe state.
                PollState::Loading => {
                    *state = PollState::Ready {
                        value: None,
                        last_error: Some(e.to_string()),
                    };
                }
                // Never clear already-displayed data.
                PollState::Ready { last_error, .. } => {
                    *last_error = Some(e.to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn first_fetch_resolves_immediately() {
        let poller = PolledResource::spawn("test", Duration::from_secs(10), || async {
            Ok::<_, AppError>(41)
        });

        let mut rx = poller.subscribe();
        assert!(rx.borrow().is_loading());

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().value(), Some(&41));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_keeps_previous_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_fetch = Arc::clone(&calls);

        let poller = PolledResource::spawn("test", Duration::from_secs(10), move || {
            let calls = Arc::clone(&calls_in_fetch);
            async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 => Ok(7),
                    _ => Err(AppError::Transport("connection refused".to_string())),
                }
            }
        });

        let mut rx = poller.subscribe();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().value(), Some(&7));

        // Second poll fails; previous value must survive.
        rx.changed().await.unwrap();
        let state = rx.borrow().clone();
        assert_eq!(state.value(), Some(&7));
        assert!(state.last_error().unwrap().contains("connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn first_failure_resolves_loading_without_value() {
        let poller = PolledResource::spawn("test", Duration::from_secs(10), || async {
            Err::<u32, _>(AppError::Transport("down".to_string()))
        });

        let mut rx = poller.subscribe();
        rx.changed().await.unwrap();
        let state = rx.borrow().clone();
        assert!(!state.is_loading());
        assert_eq!(state.value(), None);
        assert!(state.last_error().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_discarded() {
        // First request takes 5s, second returns immediately: the slow first
        // response lands after the second and must be discarded.
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_fetch = Arc::clone(&calls);

        let poller = PolledResource::spawn("test", Duration::from_secs(1), move || {
            let calls = Arc::clone(&calls_in_fetch);
            async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 => {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        Ok(1)
                    }
                    _ => Ok(2),
                }
            }
        });

        let mut rx = poller.subscribe();

        // Second tick's response applies first.
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().value(), Some(&2));

        // Let the slow first response land; it must not clobber the newer one.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(rx.borrow().value(), Some(&2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn contended_slow_responses_never_regress() {
        // Fast ticks with every third response artificially slowed, on a
        // multi-threaded runtime: responses land out of order from many
        // workers at once, and an applied value must never be older than
        // one already published.
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_fetch = Arc::clone(&calls);

        let poller = PolledResource::spawn("test", Duration::from_micros(50), move || {
            let calls = Arc::clone(&calls_in_fetch);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n % 3 == 0 {
                    tokio::time::sleep(Duration::from_millis(2)).await;
                }
                Ok::<_, AppError>(n)
            }
        });

        let mut rx = poller.subscribe();
        let mut newest = 0usize;
        let deadline = tokio::time::Instant::now() + Duration::from_millis(200);
        while tokio::time::Instant::now() < deadline {
            if rx.changed().await.is_err() {
                break;
            }
            let Some(&value) = rx.borrow_and_update().value() else {
                continue;
            };
            assert!(
                value >= newest,
                "stale response {} applied after newer response {}",
                value,
                newest
            );
            newest = value;
        }
        assert!(newest > 0, "poller made no progress under contention");
    }
}
