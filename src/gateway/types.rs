//! Wire types for the backend REST API
//!
//! All prices are full VND. Payloads are transient view models: holdings are
//! replaced wholesale on every poll and the client never merges or mutates
//! them. Numeric fields the backend may omit default to zero so formatting
//! stays safe.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Portfolio snapshot: cash, NAV and all open positions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Portfolio {
    #[serde(default)]
    pub cash_balance: f64,
    #[serde(default)]
    pub total_nav: f64,
    #[serde(default)]
    pub total_stock_value: f64,
    #[serde(default)]
    pub holdings: Vec<Holding>,
}

/// A single ticker position. `ticker` is the unique key within a portfolio.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,
    #[serde(default)]
    pub volume: i64,
    #[serde(default)]
    pub avg_cost: f64,
    #[serde(default)]
    pub current_price: f64,
    #[serde(default)]
    pub ref_price: f64,
    #[serde(default)]
    pub ceiling_price: f64,
    #[serde(default)]
    pub floor_price: f64,
    #[serde(default)]
    pub current_value: f64,
    #[serde(default)]
    pub profit_loss: f64,
    #[serde(default)]
    pub today_change_pct: f64,
}

/// Performance buckets keyed by range token (`1d`, `1m`, `1y`, `ytd`, ...).
pub type PerformanceSnapshot = HashMap<String, f64>;

/// Realized P&L over a date window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistorySummary {
    #[serde(default)]
    pub realized_pnl: f64,
    #[serde(default)]
    pub total_dividends: f64,
    #[serde(default)]
    pub trade_count: u32,
}

/// One point of the NAV history series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: f64,
}

/// Audit log category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditCategory {
    Cash,
    Stock,
}

/// Audit log event type. The backend owns this set; unknown values map to
/// `Other` instead of failing the whole log fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditType {
    Deposit,
    Withdraw,
    Buy,
    Sell,
    Interest,
    DividendCash,
    DividendStock,
    #[serde(other)]
    Other,
}

/// Append-only audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub category: AuditCategory,
    #[serde(rename = "type")]
    pub event_type: AuditType,
    pub date: NaiveDate,
    pub content: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Dividend event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DividendKind {
    DividendCash,
    DividendStock,
    Rights,
}

/// A registered dividend/rights event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendRecord {
    pub id: i64,
    pub ticker: String,
    pub kind: DividendKind,
    /// Stock dividend / rights ratio (e.g. 0.1 for 10:1).
    #[serde(default)]
    pub ratio: Option<f64>,
    /// Cash amount per share, full VND.
    #[serde(default)]
    pub amount_per_share: Option<f64>,
    pub ex_date: NaiveDate,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    /// Owned quantity snapshotted at the ex-date.
    #[serde(default)]
    pub owned_quantity: i64,
    /// Rights only: purchase price and entitled quantity.
    #[serde(default)]
    pub purchase_price: Option<f64>,
    #[serde(default)]
    pub rights_quantity: Option<i64>,
}

/// A named watchlist with its ticker entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Watchlist {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub tickers: Vec<WatchlistTicker>,
}

/// Watchlist membership entry; `id` is the removal handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistTicker {
    pub id: i64,
    pub ticker: String,
}

/// Enriched watchlist detail row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistItem {
    pub ticker: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub change_pct: f64,
    #[serde(default)]
    pub ref_price: f64,
    #[serde(default)]
    pub ceiling_price: f64,
    #[serde(default)]
    pub floor_price: f64,
    #[serde(default)]
    pub trending: Trending,
    #[serde(default)]
    pub pb: f64,
    #[serde(default)]
    pub roe: f64,
    #[serde(default)]
    pub roa: f64,
    #[serde(default)]
    pub pe: f64,
}

/// Coarse 5-session price-direction classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    StrongUp,
    Up,
    Sideways,
    Down,
    StrongDown,
}

/// Trending descriptor, tagged at the gateway boundary so downstream code
/// pattern-matches a variant instead of probing which fields are present.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Trending {
    Known(TrendingInfo),
    #[default]
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct TrendingInfo {
    pub trend: Trend,
    #[serde(default)]
    pub change_pct: f64,
}

impl Trending {
    /// Classify a raw trending payload. Anything without a parseable `trend`
    /// field is `Unavailable`.
    pub fn from_value(value: Value) -> Trending {
        match serde_json::from_value::<TrendingInfo>(value) {
            Ok(info) => Trending::Known(info),
            Err(_) => Trending::Unavailable,
        }
    }
}

impl Serialize for Trending {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Trending::Known(info) => info.serialize(serializer),
            Trending::Unavailable => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Trending {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Trending::from_value(value))
    }
}

/// One session of a historical close-price series, ordered by date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Market summary index card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketIndex {
    pub index: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub change: f64,
    #[serde(default)]
    pub change_pct: f64,
}

/// Live quote for the ticker tape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveQuote {
    pub symbol: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub change: f64,
    #[serde(default)]
    pub change_pct: f64,
    #[serde(default)]
    pub volume: i64,
}

/// Cash mutation payload for `/deposit` and `/withdraw`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashRequest {
    pub amount: u64,
    pub description: String,
}

/// Trade payload for `/buy` and `/sell`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRequest {
    pub ticker: String,
    pub volume: i64,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Dividend registration/edit payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendRequest {
    pub ticker: String,
    pub kind: DividendKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_per_share: Option<f64>,
    pub ex_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rights_quantity: Option<i64>,
}

/// TITAN scan parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanParams {
    pub fee_bps: f64,
    pub slippage_bps: f64,
    /// Walk-forward train/test window lengths, sessions.
    pub wf_train_days: u32,
    pub wf_test_days: u32,
    pub stability_lambda: f64,
    pub trade_penalty_bps: f64,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            fee_bps: 15.0,
            slippage_bps: 10.0,
            wf_train_days: 252,
            wf_test_days: 63,
            stability_lambda: 0.5,
            trade_penalty_bps: 5.0,
        }
    }
}

/// TITAN scan status, polled every second while a scan is active.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanStatus {
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub current_symbol: Option<String>,
}

/// One row of the TITAN scan result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResultRow {
    pub symbol: String,
    #[serde(default)]
    pub close: f64,
    #[serde(default)]
    pub alpha: f64,
    #[serde(default)]
    pub best_length: u32,
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub buy_signal: bool,
}
