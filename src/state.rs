//! Application state management

use crate::config::AppConfig;
use crate::events::EventBus;
use crate::gateway::types::{
    DividendRecord, LiveQuote, MarketIndex, Portfolio, Watchlist, WatchlistItem,
};
use crate::gateway::PortfolioBackend;
use crate::services::growth::{ChartRange, Subject, MAX_COMPARISON_SUBJECTS};
use crate::store::ResourceStore;
use parking_lot::RwLock;
use std::sync::Arc;

/// Store key for the portfolio snapshot.
pub const PORTFOLIO_KEY: &str = "portfolio";
/// Store key for the market summary cards.
pub const MARKET_SUMMARY_KEY: &str = "market-summary";
/// Store key for the watchlist collection.
pub const WATCHLISTS_KEY: &str = "watchlists";
/// Store key for pending dividends.
pub const PENDING_DIVIDENDS_KEY: &str = "dividends-pending";

/// Growth-chart comparison selection, capped at
/// [`MAX_COMPARISON_SUBJECTS`] subjects.
#[derive(Debug, Default)]
pub struct ComparisonSelection {
    subjects: Vec<Subject>,
}

impl ComparisonSelection {
    /// Try to add a subject. Duplicates are ignored (and count as success);
    /// a subject beyond the cap is rejected and the selection left unchanged.
    pub fn add(&mut self, subject: Subject) -> bool {
        if self.subjects.contains(&subject) {
            return true;
        }
        if self.subjects.len() >= MAX_COMPARISON_SUBJECTS {
            return false;
        }
        self.subjects.push(subject);
        true
    }

    pub fn remove(&mut self, subject: &Subject) {
        self.subjects.retain(|s| s != subject);
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

/// Application state shared by services and pollers. Each remote entity kind
/// lives in one keyed store so simultaneously visible views read the same
/// snapshot; selections are client-local and never persisted.
pub struct AppState {
    pub config: AppConfig,
    pub backend: Arc<dyn PortfolioBackend>,
    pub events: EventBus,

    pub portfolio: ResourceStore<Portfolio>,
    pub market: ResourceStore<Vec<MarketIndex>>,
    pub quotes: ResourceStore<Vec<LiveQuote>>,
    pub watchlists: ResourceStore<Vec<Watchlist>>,
    pub watchlist_detail: ResourceStore<Vec<WatchlistItem>>,
    pub dividends: ResourceStore<Vec<DividendRecord>>,

    active_watchlist: RwLock<Option<i64>>,
    comparison: RwLock<ComparisonSelection>,
    chart_range: RwLock<ChartRange>,
}

impl AppState {
    pub fn new(config: AppConfig, backend: Arc<dyn PortfolioBackend>, events: EventBus) -> Self {
        Self {
            config,
            backend,
            events,
            portfolio: ResourceStore::new(),
            market: ResourceStore::new(),
            quotes: ResourceStore::new(),
            watchlists: ResourceStore::new(),
            watchlist_detail: ResourceStore::new(),
            dividends: ResourceStore::new(),
            active_watchlist: RwLock::new(None),
            comparison: RwLock::new(ComparisonSelection::default()),
            chart_range: RwLock::new(ChartRange::M3),
        }
    }

    pub fn active_watchlist(&self) -> Option<i64> {
        *self.active_watchlist.read()
    }

    pub fn set_active_watchlist(&self, id: Option<i64>) {
        *self.active_watchlist.write() = id;
    }

    pub fn chart_range(&self) -> ChartRange {
        *self.chart_range.read()
    }

    pub fn set_chart_range(&self, range: ChartRange) {
        *self.chart_range.write() = range;
    }

    /// Add a comparison subject, surfacing a warning when the cap is hit.
    pub fn add_comparison_subject(&self, subject: Subject) -> bool {
        let added = self.comparison.write().add(subject);
        if !added {
            self.events.warning(format!(
                "At most {} comparison subjects can be selected",
                MAX_COMPARISON_SUBJECTS
            ));
        }
        added
    }

    pub fn remove_comparison_subject(&self, subject: &Subject) {
        self.comparison.write().remove(subject);
    }

    pub fn comparison_subjects(&self) -> Vec<Subject> {
        self.comparison.read().subjects().to_vec()
    }
}
