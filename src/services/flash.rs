//! Change-flash state machine
//!
//! A tracked cell is either idle or flashing. It starts flashing exactly when
//! the observed value differs from the previously observed one (never on the
//! first observation) and reverts to idle after a fixed duration. A new
//! change while flashing restarts the timer instead of stacking a second one.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default flash duration for table rows.
pub const DEFAULT_FLASH_DURATION: Duration = Duration::from_millis(600);

/// Pure change detector: feed observed values, get back whether this
/// observation is a strict change from the previous one.
#[derive(Debug, Default)]
pub struct FlashTracker<T> {
    last: Option<T>,
}

impl<T: PartialEq> FlashTracker<T> {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Record an observation. Returns true iff the value strictly differs
    /// from the previous observation; the first observation never flashes.
    pub fn observe(&mut self, value: T) -> bool {
        let changed = match &self.last {
            None => false,
            Some(previous) => *previous != value,
        };
        self.last = Some(value);
        changed
    }

    pub fn last(&self) -> Option<&T> {
        self.last.as_ref()
    }
}

/// A tracked field with its revert timer. At most one timer is live at a
/// time; dropping the cell cancels it, so no state updates can fire after
/// the owning view is gone.
pub struct FlashCell<T> {
    tracker: FlashTracker<T>,
    duration: Duration,
    tx: Arc<watch::Sender<bool>>,
    timer: Option<JoinHandle<()>>,
}

impl<T: PartialEq> FlashCell<T> {
    pub fn new(duration: Duration) -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            tracker: FlashTracker::new(),
            duration,
            tx: Arc::new(tx),
            timer: None,
        }
    }

    /// Feed the latest polled value; starts (or restarts) the flash when it
    /// qualifies as a change.
    pub fn observe(&mut self, value: T) {
        if !self.tracker.observe(value) {
            return;
        }

        self.tx.send_replace(true);

        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        let tx = Arc::clone(&self.tx);
        let duration = self.duration;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            tx.send_replace(false);
        }));
    }

    pub fn is_flashing(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl<T: PartialEq> Default for FlashCell<T> {
    fn default() -> Self {
        Self::new(DEFAULT_FLASH_DURATION)
    }
}

impl<T> Drop for FlashCell<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
