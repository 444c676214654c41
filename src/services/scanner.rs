//! TITAN Scanner orchestration
//!
//! The scan itself (walk-forward parameter search, alpha computation, buy
//! signals) runs server-side; this controller only starts/stops it, polls
//! `/titan/status` every second while a scan is active, and fetches the
//! result table exactly once when the run completes.

use crate::error::{AppError, Result};
use crate::gateway::types::{ScanParams, ScanResultRow, ScanStatus};
use crate::state::AppState;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Controller for one scanner view. Dropping it stops the status monitor;
/// the backend scan keeps running and can be re-attached by a new start.
pub struct ScanController {
    state: Arc<AppState>,
    status_tx: Arc<watch::Sender<ScanStatus>>,
    results_tx: Arc<watch::Sender<Option<Vec<ScanResultRow>>>>,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl ScanController {
    pub fn new(state: Arc<AppState>) -> Self {
        let (status_tx, _) = watch::channel(ScanStatus::default());
        let (results_tx, _) = watch::channel(None);
        Self {
            state,
            status_tx: Arc::new(status_tx),
            results_tx: Arc::new(results_tx),
            monitor: Mutex::new(None),
        }
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ScanStatus> {
        self.status_tx.subscribe()
    }

    pub fn subscribe_results(&self) -> watch::Receiver<Option<Vec<ScanResultRow>>> {
        self.results_tx.subscribe()
    }

    pub fn status(&self) -> ScanStatus {
        self.status_tx.borrow().clone()
    }

    /// Trigger a scan and start the 1s status monitor.
    pub async fn start(&self, params: ScanParams) -> Result<()> {
        if self.is_monitoring() {
            let err = AppError::Validation("A scan is already running".to_string());
            self.state.events.warning(err.to_string());
            return Err(err);
        }

        if let Err(e) = self.state.backend.start_scan(&params).await {
            self.state
                .events
                .error("Scan failed to start", e.detail().map(String::from));
            return Err(e);
        }

        info!(
            fee_bps = params.fee_bps,
            wf_train_days = params.wf_train_days,
            wf_test_days = params.wf_test_days,
            "TITAN scan started"
        );
        self.state.events.info("TITAN scan started");
        self.results_tx.send_replace(None);

        let state = Arc::clone(&self.state);
        let status_tx = Arc::clone(&self.status_tx);
        let results_tx = Arc::clone(&self.results_tx);
        let interval = self.state.config.intervals.scan_status;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut seen_running = false;

            loop {
                ticker.tick().await;

                let status = match state.backend.scan_status().await {
                    Ok(status) => status,
                    Err(e) => {
                        // Keep the previous status; the next tick retries.
                        warn!(error = %e, "scan status poll failed");
                        continue;
                    }
                };

                let running = status.running;
                seen_running |= running;
                status_tx.send_replace(status);

                if !running {
                    // The backend flips to running asynchronously after the
                    // start call; an idle status before that flip is stale,
                    // not a completed run.
                    if !seen_running {
                        continue;
                    }
                    // Completion observed: fetch the result table once.
                    match state.backend.scan_results().await {
                        Ok(rows) => {
                            state
                                .events
                                .success(format!("TITAN scan finished: {} symbols", rows.len()));
                            results_tx.send_replace(Some(rows));
                        }
                        Err(e) => {
                            state
                                .events
                                .error("Could not fetch scan results", e.detail().map(String::from));
                        }
                    }
                    break;
                }
            }
        });

        *self.monitor.lock() = Some(handle);
        Ok(())
    }

    /// Ask the backend to stop the sweep. The monitor observes the
    /// `running -> false` transition on its next tick and collects whatever
    /// partial results exist.
    pub async fn stop(&self) -> Result<()> {
        match self.state.backend.stop_scan().await {
            Ok(()) => {
                self.state.events.info("TITAN scan stop requested");
                Ok(())
            }
            Err(e) => {
                self.state
                    .events
                    .error("Scan stop failed", e.detail().map(String::from));
                Err(e)
            }
        }
    }

    /// Per-symbol drill-down of the last scan; opaque payload.
    pub async fn inspect(&self, symbol: &str) -> Result<Value> {
        self.state.backend.inspect_symbol(symbol).await
    }

    fn is_monitoring(&self) -> bool {
        self.monitor
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        if let Some(handle) = self.monitor.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::events::EventBus;
    use crate::gateway::testing::FakeBackend;

    fn state_with(backend: Arc<FakeBackend>) -> Arc<AppState> {
        Arc::new(AppState::new(
            AppConfig::default(),
            backend,
            EventBus::new(),
        ))
    }

    fn running(progress: u32, total: u32, symbol: &str) -> ScanStatus {
        ScanStatus {
            running: true,
            progress,
            total,
            current_symbol: Some(symbol.to_string()),
        }
    }

    fn finished(total: u32) -> ScanStatus {
        ScanStatus {
            running: false,
            progress: total,
            total,
            current_symbol: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn results_fetched_exactly_once_on_completion() {
        let backend = Arc::new(FakeBackend::default());
        backend.push_status(running(1, 3, "FPT"));
        backend.push_status(running(2, 3, "HPG"));
        backend.push_status(finished(3));
        backend.results.lock().unwrap().push(ScanResultRow {
            symbol: "FPT".to_string(),
            close: 98_500.0,
            alpha: 0.12,
            best_length: 21,
            valid: true,
            buy_signal: true,
        });

        let controller = ScanController::new(state_with(Arc::clone(&backend)));
        let mut results = controller.subscribe_results();

        controller.start(ScanParams::default()).await.unwrap();

        // Wait for the monitor to observe completion.
        loop {
            results.changed().await.unwrap();
            if results.borrow().is_some() {
                break;
            }
        }

        let rows = results.borrow().clone().unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].buy_signal);
        assert_eq!(backend.count_calls("scan_results"), 1);

        // Monitor stopped after completion; further time passes nothing.
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        assert_eq!(backend.count_calls("scan_results"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn status_progression_is_published() {
        let backend = Arc::new(FakeBackend::default());
        backend.push_status(running(1, 2, "VCB"));
        backend.push_status(finished(2));

        let controller = ScanController::new(state_with(Arc::clone(&backend)));
        let mut status = controller.subscribe_status();

        controller.start(ScanParams::default()).await.unwrap();

        status.changed().await.unwrap();
        assert_eq!(status.borrow().current_symbol.as_deref(), Some("VCB"));

        status.changed().await.unwrap();
        assert!(!status.borrow().running);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_status_before_the_backend_flips_is_not_completion() {
        // The first status poll can land before the backend marks the scan
        // as running; the monitor must wait it out instead of declaring the
        // run finished and grabbing an empty result table.
        let backend = Arc::new(FakeBackend::default());
        backend.push_status(ScanStatus::default());
        backend.push_status(running(1, 2, "FPT"));
        backend.push_status(finished(2));
        backend.results.lock().unwrap().push(ScanResultRow {
            symbol: "FPT".to_string(),
            close: 98_500.0,
            alpha: 0.08,
            best_length: 34,
            valid: true,
            buy_signal: false,
        });

        let controller = ScanController::new(state_with(Arc::clone(&backend)));
        let mut results = controller.subscribe_results();

        controller.start(ScanParams::default()).await.unwrap();

        loop {
            results.changed().await.unwrap();
            if results.borrow().is_some() {
                break;
            }
        }

        // The full progression was consumed, not cut short at the stale
        // idle status.
        assert_eq!(backend.count_calls("scan_status"), 3);
        assert_eq!(backend.count_calls("scan_results"), 1);
        assert_eq!(controller.status().total, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn start_while_running_is_rejected() {
        let backend = Arc::new(FakeBackend::default());
        backend.push_status(running(1, 100, "FPT"));

        let controller = ScanController::new(state_with(Arc::clone(&backend)));
        controller.start(ScanParams::default()).await.unwrap();

        let err = controller.start(ScanParams::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(backend.count_calls("start_scan"), 1);
    }

    #[tokio::test]
    async fn failed_start_surfaces_backend_detail() {
        let backend = Arc::new(FakeBackend::default());
        *backend.reject_with.lock().unwrap() = Some("universe is empty".to_string());

        let state = state_with(Arc::clone(&backend));
        let mut events = state.events.subscribe();
        let controller = ScanController::new(Arc::clone(&state));

        let err = controller.start(ScanParams::default()).await.unwrap_err();
        assert_eq!(err.detail(), Some("universe is empty"));

        let event = events.recv().await.unwrap();
        assert_eq!(event.detail.as_deref(), Some("universe is empty"));
    }
}
