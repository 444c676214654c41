//! HTTP implementation of the backend gateway
//!
//! One reqwest client, one request per call. No retries, no caching, no
//! deduplication here: freshness policy lives in the store and pollers.

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::events::EventBus;
use crate::gateway::envelope::unwrap_envelope;
use crate::gateway::types::*;
use crate::gateway::PortfolioBackend;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// HTTP gateway to the portfolio backend.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    events: EventBus,
}

impl HttpGateway {
    pub fn new(config: &AppConfig, events: EventBus) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(AppError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            events,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, surface transport failures globally, unwrap the
    /// response envelope.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                // No response reached the client: one global notification,
                // then the failure propagates for the local catch.
                self.events
                    .error("Backend unreachable", Some(e.to_string()));
                return Err(AppError::Transport(e.to_string()));
            }
        };

        let body: Value = response.json().await?;
        unwrap_envelope(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.send(self.client.get(self.url(path))).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn get_json_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let value = self
            .send(self.client.get(self.url(path)).query(query))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn post_json(&self, path: &str, body: &impl serde::Serialize) -> Result<Value> {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    async fn post_empty(&self, path: &str) -> Result<Value> {
        self.send(self.client.post(self.url(path))).await
    }
}

#[async_trait]
impl PortfolioBackend for HttpGateway {
    async fn get_portfolio(&self) -> Result<Portfolio> {
        self.get_json("/portfolio").await
    }

    async fn get_logs(&self) -> Result<Vec<AuditLogEntry>> {
        self.get_json("/logs").await
    }

    async fn get_performance(&self) -> Result<PerformanceSnapshot> {
        self.get_json("/performance").await
    }

    async fn get_history_summary(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<HistorySummary> {
        self.get_json_query(
            "/history-summary",
            &[
                ("start_date", start_date.to_string()),
                ("end_date", end_date.to_string()),
            ],
        )
        .await
    }

    async fn get_nav_history(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        limit: Option<u32>,
    ) -> Result<Vec<NavPoint>> {
        let mut query = vec![
            ("start_date", start_date.to_string()),
            ("end_date", end_date.to_string()),
        ];
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        self.get_json_query("/nav-history", &query).await
    }

    async fn deposit(&self, request: &CashRequest) -> Result<()> {
        self.post_json("/deposit", request).await?;
        Ok(())
    }

    async fn withdraw(&self, request: &CashRequest) -> Result<()> {
        self.post_json("/withdraw", request).await?;
        Ok(())
    }

    async fn buy(&self, request: &TradeRequest) -> Result<()> {
        self.post_json("/buy", request).await?;
        Ok(())
    }

    async fn sell(&self, request: &TradeRequest) -> Result<()> {
        self.post_json("/sell", request).await?;
        Ok(())
    }

    async fn undo_last_buy(&self) -> Result<()> {
        self.post_empty("/undo-last-buy").await?;
        Ok(())
    }

    async fn update_note(&self, log_id: i64, note: &str) -> Result<()> {
        let path = format!("/logs/{}/note", log_id);
        self.send(
            self.client
                .put(self.url(&path))
                .json(&json!({ "note": note })),
        )
        .await?;
        Ok(())
    }

    async fn register_dividend(&self, request: &DividendRequest) -> Result<()> {
        self.post_json("/register-dividend", request).await?;
        Ok(())
    }

    async fn update_dividend(&self, id: i64, request: &DividendRequest) -> Result<()> {
        let path = format!("/dividends/{}", id);
        self.send(self.client.put(self.url(&path)).json(request))
            .await?;
        Ok(())
    }

    async fn pending_dividends(&self) -> Result<Vec<DividendRecord>> {
        self.get_json("/dividends/pending").await
    }

    async fn delete_dividend(&self, id: i64) -> Result<()> {
        let path = format!("/dividends/{}", id);
        self.send(self.client.delete(self.url(&path))).await?;
        Ok(())
    }

    async fn list_watchlists(&self) -> Result<Vec<Watchlist>> {
        self.get_json("/watchlists/").await
    }

    async fn create_watchlist(&self, name: &str) -> Result<Watchlist> {
        let value = self.post_json("/watchlists/", &json!({ "name": name })).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn rename_watchlist(&self, id: i64, name: &str) -> Result<()> {
        let path = format!("/watchlists/{}", id);
        self.send(
            self.client
                .put(self.url(&path))
                .json(&json!({ "name": name })),
        )
        .await?;
        Ok(())
    }

    async fn delete_watchlist(&self, id: i64) -> Result<()> {
        let path = format!("/watchlists/{}", id);
        self.send(self.client.delete(self.url(&path))).await?;
        Ok(())
    }

    async fn add_watchlist_ticker(&self, watchlist_id: i64, ticker: &str) -> Result<()> {
        let path = format!("/watchlists/{}/tickers", watchlist_id);
        self.post_json(&path, &json!({ "ticker": ticker })).await?;
        Ok(())
    }

    async fn remove_watchlist_ticker(&self, watchlist_id: i64, ticker_id: i64) -> Result<()> {
        let path = format!("/watchlists/{}/tickers/{}", watchlist_id, ticker_id);
        self.send(self.client.delete(self.url(&path))).await?;
        Ok(())
    }

    async fn watchlist_detail(&self, watchlist_id: i64) -> Result<Vec<WatchlistItem>> {
        let path = format!("/watchlists/{}/detail", watchlist_id);
        self.get_json(&path).await
    }

    async fn historical_prices(&self, ticker: &str, period: &str) -> Result<Vec<PricePoint>> {
        self.get_json_query(
            "/historical",
            &[("ticker", ticker.to_string()), ("period", period.to_string())],
        )
        .await
    }

    async fn market_summary(&self) -> Result<Vec<MarketIndex>> {
        self.get_json("/market-summary").await
    }

    async fn live_quotes(&self, symbols: &[String]) -> Result<Vec<LiveQuote>> {
        if symbols.is_empty() {
            return Ok(vec![]);
        }
        self.get_json_query("/vps-live", &[("symbols", symbols.join(","))])
            .await
    }

    async fn trending(&self, ticker: &str) -> Result<Trending> {
        let path = format!("/trending/{}", ticker);
        let value = self.send(self.client.get(self.url(&path))).await?;
        Ok(Trending::from_value(value))
    }

    async fn start_scan(&self, params: &ScanParams) -> Result<()> {
        self.post_json("/titan/scan", params).await?;
        Ok(())
    }

    async fn stop_scan(&self) -> Result<()> {
        self.post_empty("/titan/stop").await?;
        Ok(())
    }

    async fn scan_status(&self) -> Result<ScanStatus> {
        self.get_json("/titan/status").await
    }

    async fn scan_results(&self) -> Result<Vec<ScanResultRow>> {
        self.get_json("/titan/results").await
    }

    async fn inspect_symbol(&self, symbol: &str) -> Result<Value> {
        let path = format!("/titan/inspect/{}", symbol);
        self.send(self.client.get(self.url(&path))).await
    }

    async fn reset_data(&self) -> Result<()> {
        self.post_empty("/reset-data").await?;
        Ok(())
    }
}
