//! Market Service
//!
//! Market summary cards, the live ticker tape, trending lookups, and the
//! growth comparison chart assembly. Each polled view routes its fetch
//! through the shared store so simultaneous consumers of the same key
//! coalesce into one request.

use crate::error::Result;
use crate::gateway::types::{LiveQuote, MarketIndex, PricePoint, Trending};
use crate::poller::PolledResource;
use crate::services::growth::{normalize_growth, GrowthInputs, GrowthPoint, Subject};
use crate::state::{AppState, MARKET_SUMMARY_KEY};
use std::collections::HashMap;
use std::sync::Arc;

pub struct MarketService;

impl MarketService {
    pub async fn refresh_summary(state: &AppState) -> Result<Vec<MarketIndex>> {
        let summary = state
            .market
            .fetch_through(MARKET_SUMMARY_KEY, || state.backend.market_summary())
            .await?;
        Ok(summary)
    }

    /// 30s market summary poller.
    pub fn spawn_summary_poller(state: &Arc<AppState>) -> PolledResource<Vec<MarketIndex>> {
        let interval = state.config.intervals.market;
        let state = Arc::clone(state);
        PolledResource::spawn("market-summary", interval, move || {
            let state = Arc::clone(&state);
            async move { Self::refresh_summary(&state).await }
        })
    }

    /// 15s live-quote poller for a fixed symbol set. Rebuilt by the caller
    /// when the set changes.
    pub fn spawn_quotes_poller(
        state: &Arc<AppState>,
        symbols: Vec<String>,
    ) -> PolledResource<Vec<LiveQuote>> {
        let interval = state.config.intervals.live_quotes;
        let key = symbols.join(",");
        let state = Arc::clone(state);
        PolledResource::spawn(format!("live-quotes:{}", key), interval, move || {
            let state = Arc::clone(&state);
            let key = key.clone();
            let symbols = symbols.clone();
            async move {
                state
                    .quotes
                    .fetch_through(&key, || state.backend.live_quotes(&symbols))
                    .await
            }
        })
    }

    pub async fn trending(state: &AppState, ticker: &str) -> Result<Trending> {
        state.backend.trending(ticker).await
    }

    /// Assemble the growth comparison chart for the current selection and
    /// range: one historical series per non-portfolio subject, the
    /// performance snapshot for the portfolio, then the aligned normalize.
    pub async fn load_growth_chart(state: &AppState) -> Result<Vec<GrowthPoint>> {
        let subjects = state.comparison_subjects();
        let range = state.chart_range();

        let mut series: HashMap<Subject, Vec<PricePoint>> = HashMap::new();
        let mut portfolio_growth = None;

        for subject in &subjects {
            match subject {
                Subject::Portfolio => {
                    let performance = state.backend.get_performance().await?;
                    portfolio_growth = performance.get(range.as_str()).copied();
                }
                Subject::Index => {
                    let points = state
                        .backend
                        .historical_prices("VNINDEX", range.as_str())
                        .await?;
                    series.insert(Subject::Index, points);
                }
                Subject::Ticker(symbol) => {
                    let points = state
                        .backend
                        .historical_prices(symbol, range.as_str())
                        .await?;
                    series.insert(subject.clone(), points);
                }
            }
        }

        Ok(normalize_growth(&GrowthInputs {
            subjects: &subjects,
            series: &series,
            portfolio_growth,
        }))
    }

    /// 30s growth-chart poller. Dropped and rebuilt when the selection or
    /// range changes, which also restarts the fetch immediately.
    pub fn spawn_growth_poller(state: &Arc<AppState>) -> PolledResource<Vec<GrowthPoint>> {
        let interval = state.config.intervals.market;
        let state = Arc::clone(state);
        PolledResource::spawn("growth-chart", interval, move || {
            let state = Arc::clone(&state);
            async move { Self::load_growth_chart(&state).await }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::events::EventBus;
    use crate::gateway::testing::FakeBackend;
    use crate::services::growth::ChartRange;
    use chrono::NaiveDate;

    fn point(day: u32, close: f64) -> PricePoint {
        PricePoint {
            date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            close,
        }
    }

    fn state_with(backend: Arc<FakeBackend>) -> AppState {
        AppState::new(AppConfig::default(), backend, EventBus::new())
    }

    #[tokio::test]
    async fn growth_chart_combines_series_and_performance() {
        let backend = Arc::new(FakeBackend::default());
        backend.prices.lock().unwrap().insert(
            "VNINDEX".to_string(),
            vec![point(2, 1200.0), point(3, 1212.0)],
        );
        backend.prices.lock().unwrap().insert(
            "FPT".to_string(),
            vec![point(2, 100_000.0), point(3, 105_000.0)],
        );
        backend
            .performance
            .lock()
            .unwrap()
            .insert("3m".to_string(), 7.5);

        let state = state_with(Arc::clone(&backend));
        state.set_chart_range(ChartRange::M3);
        state.add_comparison_subject(Subject::Portfolio);
        state.add_comparison_subject(Subject::Index);
        state.add_comparison_subject(Subject::Ticker("FPT".to_string()));

        let chart = MarketService::load_growth_chart(&state).await.unwrap();
        assert_eq!(chart.len(), 2);
        assert_eq!(chart[1].values["VNINDEX"], 1.0);
        assert_eq!(chart[1].values["FPT"], 5.0);
        assert_eq!(chart[1].values["PORTFOLIO"], 7.5);

        // The per-ticker loop fetched history with the range token.
        assert_eq!(backend.count_calls("historical_prices VNINDEX 3m"), 1);
        assert_eq!(backend.count_calls("historical_prices FPT 3m"), 1);
    }

    #[tokio::test]
    async fn summary_refresh_publishes_to_store() {
        let backend = Arc::new(FakeBackend::default());
        let state = state_with(Arc::clone(&backend));

        MarketService::refresh_summary(&state).await.unwrap();
        assert!(state.market.get(MARKET_SUMMARY_KEY).is_some());
    }

    #[tokio::test]
    async fn empty_selection_yields_no_chart() {
        let backend = Arc::new(FakeBackend::default());
        let state = state_with(Arc::clone(&backend));

        let chart = MarketService::load_growth_chart(&state).await.unwrap();
        assert!(chart.is_empty());
        assert!(backend.calls.lock().unwrap().is_empty());
    }
}
