//! Remote data gateway
//!
//! Everything the dashboard knows comes through the backend REST API; this
//! module is the single seam. `PortfolioBackend` is the typed contract and
//! `HttpGateway` the production implementation. Services and pollers depend
//! on the trait so tests can substitute an in-memory backend.

pub mod envelope;
pub mod http;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

pub use http::HttpGateway;

use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use types::*;

/// Typed contract over the backend REST API. One method per endpoint, each a
/// single round trip with the response envelope already unwrapped.
#[async_trait]
pub trait PortfolioBackend: Send + Sync {
    // Portfolio and history
    async fn get_portfolio(&self) -> Result<Portfolio>;
    async fn get_logs(&self) -> Result<Vec<AuditLogEntry>>;
    async fn get_performance(&self) -> Result<PerformanceSnapshot>;
    async fn get_history_summary(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<HistorySummary>;
    async fn get_nav_history(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        limit: Option<u32>,
    ) -> Result<Vec<NavPoint>>;

    // Cash and trades
    async fn deposit(&self, request: &CashRequest) -> Result<()>;
    async fn withdraw(&self, request: &CashRequest) -> Result<()>;
    async fn buy(&self, request: &TradeRequest) -> Result<()>;
    async fn sell(&self, request: &TradeRequest) -> Result<()>;
    async fn undo_last_buy(&self) -> Result<()>;
    async fn update_note(&self, log_id: i64, note: &str) -> Result<()>;

    // Dividends
    async fn register_dividend(&self, request: &DividendRequest) -> Result<()>;
    async fn update_dividend(&self, id: i64, request: &DividendRequest) -> Result<()>;
    async fn pending_dividends(&self) -> Result<Vec<DividendRecord>>;
    async fn delete_dividend(&self, id: i64) -> Result<()>;

    // Watchlists
    async fn list_watchlists(&self) -> Result<Vec<Watchlist>>;
    async fn create_watchlist(&self, name: &str) -> Result<Watchlist>;
    async fn rename_watchlist(&self, id: i64, name: &str) -> Result<()>;
    async fn delete_watchlist(&self, id: i64) -> Result<()>;
    async fn add_watchlist_ticker(&self, watchlist_id: i64, ticker: &str) -> Result<()>;
    async fn remove_watchlist_ticker(&self, watchlist_id: i64, ticker_id: i64) -> Result<()>;
    async fn watchlist_detail(&self, watchlist_id: i64) -> Result<Vec<WatchlistItem>>;

    // Market data
    async fn historical_prices(&self, ticker: &str, period: &str) -> Result<Vec<PricePoint>>;
    async fn market_summary(&self) -> Result<Vec<MarketIndex>>;
    async fn live_quotes(&self, symbols: &[String]) -> Result<Vec<LiveQuote>>;
    async fn trending(&self, ticker: &str) -> Result<Trending>;

    // TITAN scanner
    async fn start_scan(&self, params: &ScanParams) -> Result<()>;
    async fn stop_scan(&self) -> Result<()>;
    async fn scan_status(&self) -> Result<ScanStatus>;
    async fn scan_results(&self) -> Result<Vec<ScanResultRow>>;
    async fn inspect_symbol(&self, symbol: &str) -> Result<Value>;

    // Maintenance
    async fn reset_data(&self) -> Result<()>;
}
