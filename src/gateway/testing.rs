//! In-memory backend for service tests
//!
//! Records every call and serves configurable canned responses, so service
//! logic (validation, notifications, refetch discipline) is testable without
//! a network.

use crate::error::{AppError, Result};
use crate::gateway::types::*;
use crate::gateway::PortfolioBackend;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct FakeBackend {
    pub calls: Mutex<Vec<String>>,
    /// When set, every mutation is rejected with this detail message.
    pub reject_with: Mutex<Option<String>>,
    pub portfolio: Mutex<Portfolio>,
    pub performance: Mutex<PerformanceSnapshot>,
    pub prices: Mutex<HashMap<String, Vec<PricePoint>>>,
    pub watchlists: Mutex<Vec<Watchlist>>,
    pub watchlist_items: Mutex<Vec<WatchlistItem>>,
    pub dividends: Mutex<Vec<DividendRecord>>,
    /// Scan statuses served in order; the last one repeats.
    pub statuses: Mutex<VecDeque<ScanStatus>>,
    pub results: Mutex<Vec<ScanResultRow>>,
}

impl FakeBackend {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_reject(&self) -> Result<()> {
        if let Some(detail) = self.reject_with.lock().unwrap().clone() {
            return Err(AppError::Backend {
                message: "request rejected".to_string(),
                detail: Some(detail),
            });
        }
        Ok(())
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn push_status(&self, status: ScanStatus) {
        self.statuses.lock().unwrap().push_back(status);
    }
}

#[async_trait]
impl PortfolioBackend for FakeBackend {
    async fn get_portfolio(&self) -> Result<Portfolio> {
        self.record("get_portfolio".to_string());
        Ok(self.portfolio.lock().unwrap().clone())
    }

    async fn get_logs(&self) -> Result<Vec<AuditLogEntry>> {
        self.record("get_logs".to_string());
        Ok(vec![])
    }

    async fn get_performance(&self) -> Result<PerformanceSnapshot> {
        self.record("get_performance".to_string());
        Ok(self.performance.lock().unwrap().clone())
    }

    async fn get_history_summary(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<HistorySummary> {
        self.record(format!("get_history_summary {} {}", start_date, end_date));
        Ok(HistorySummary::default())
    }

    async fn get_nav_history(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        _limit: Option<u32>,
    ) -> Result<Vec<NavPoint>> {
        self.record(format!("get_nav_history {} {}", start_date, end_date));
        Ok(vec![])
    }

    async fn deposit(&self, request: &CashRequest) -> Result<()> {
        self.record(format!(
            "deposit {}",
            serde_json::to_string(request).unwrap()
        ));
        self.check_reject()
    }

    async fn withdraw(&self, request: &CashRequest) -> Result<()> {
        self.record(format!(
            "withdraw {}",
            serde_json::to_string(request).unwrap()
        ));
        self.check_reject()
    }

    async fn buy(&self, request: &TradeRequest) -> Result<()> {
        self.record(format!("buy {}", serde_json::to_string(request).unwrap()));
        self.check_reject()
    }

    async fn sell(&self, request: &TradeRequest) -> Result<()> {
        self.record(format!("sell {}", serde_json::to_string(request).unwrap()));
        self.check_reject()
    }

    async fn undo_last_buy(&self) -> Result<()> {
        self.record("undo_last_buy".to_string());
        self.check_reject()
    }

    async fn update_note(&self, log_id: i64, note: &str) -> Result<()> {
        self.record(format!("update_note {} {}", log_id, note));
        self.check_reject()
    }

    async fn register_dividend(&self, request: &DividendRequest) -> Result<()> {
        self.record(format!(
            "register_dividend {}",
            serde_json::to_string(request).unwrap()
        ));
        self.check_reject()
    }

    async fn update_dividend(&self, id: i64, _request: &DividendRequest) -> Result<()> {
        self.record(format!("update_dividend {}", id));
        self.check_reject()
    }

    async fn pending_dividends(&self) -> Result<Vec<DividendRecord>> {
        self.record("pending_dividends".to_string());
        Ok(self.dividends.lock().unwrap().clone())
    }

    async fn delete_dividend(&self, id: i64) -> Result<()> {
        self.record(format!("delete_dividend {}", id));
        self.check_reject()
    }

    async fn list_watchlists(&self) -> Result<Vec<Watchlist>> {
        self.record("list_watchlists".to_string());
        Ok(self.watchlists.lock().unwrap().clone())
    }

    async fn create_watchlist(&self, name: &str) -> Result<Watchlist> {
        self.record(format!("create_watchlist {}", name));
        self.check_reject()?;
        let watchlist = Watchlist {
            id: self.watchlists.lock().unwrap().len() as i64 + 1,
            name: name.to_string(),
            tickers: vec![],
        };
        self.watchlists.lock().unwrap().push(watchlist.clone());
        Ok(watchlist)
    }

    async fn rename_watchlist(&self, id: i64, name: &str) -> Result<()> {
        self.record(format!("rename_watchlist {} {}", id, name));
        self.check_reject()
    }

    async fn delete_watchlist(&self, id: i64) -> Result<()> {
        self.record(format!("delete_watchlist {}", id));
        self.check_reject()
    }

    async fn add_watchlist_ticker(&self, watchlist_id: i64, ticker: &str) -> Result<()> {
        self.record(format!("add_watchlist_ticker {} {}", watchlist_id, ticker));
        self.check_reject()
    }

    async fn remove_watchlist_ticker(&self, watchlist_id: i64, ticker_id: i64) -> Result<()> {
        self.record(format!(
            "remove_watchlist_ticker {} {}",
            watchlist_id, ticker_id
        ));
        self.check_reject()
    }

    async fn watchlist_detail(&self, watchlist_id: i64) -> Result<Vec<WatchlistItem>> {
        self.record(format!("watchlist_detail {}", watchlist_id));
        Ok(self.watchlist_items.lock().unwrap().clone())
    }

    async fn historical_prices(&self, ticker: &str, period: &str) -> Result<Vec<PricePoint>> {
        self.record(format!("historical_prices {} {}", ticker, period));
        Ok(self
            .prices
            .lock()
            .unwrap()
            .get(ticker)
            .cloned()
            .unwrap_or_default())
    }

    async fn market_summary(&self) -> Result<Vec<MarketIndex>> {
        self.record("market_summary".to_string());
        Ok(vec![])
    }

    async fn live_quotes(&self, symbols: &[String]) -> Result<Vec<LiveQuote>> {
        self.record(format!("live_quotes {}", symbols.join(",")));
        Ok(vec![])
    }

    async fn trending(&self, ticker: &str) -> Result<Trending> {
        self.record(format!("trending {}", ticker));
        Ok(Trending::Unavailable)
    }

    async fn start_scan(&self, params: &ScanParams) -> Result<()> {
        self.record(format!(
            "start_scan {}",
            serde_json::to_string(params).unwrap()
        ));
        self.check_reject()
    }

    async fn stop_scan(&self) -> Result<()> {
        self.record("stop_scan".to_string());
        self.check_reject()
    }

    async fn scan_status(&self) -> Result<ScanStatus> {
        self.record("scan_status".to_string());
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            Ok(statuses.pop_front().unwrap())
        } else {
            Ok(statuses.front().cloned().unwrap_or_default())
        }
    }

    async fn scan_results(&self) -> Result<Vec<ScanResultRow>> {
        self.record("scan_results".to_string());
        Ok(self.results.lock().unwrap().clone())
    }

    async fn inspect_symbol(&self, symbol: &str) -> Result<Value> {
        self.record(format!("inspect_symbol {}", symbol));
        Ok(Value::Null)
    }

    async fn reset_data(&self) -> Result<()> {
        self.record("reset_data".to_string());
        self.check_reject()
    }
}
