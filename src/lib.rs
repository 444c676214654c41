//! Titanfolio - portfolio dashboard client core
//!
//! Headless client for a personal investment-portfolio backend (cash,
//! holdings, dividends, watchlists, and the TITAN parameter scanner). All
//! business math lives server-side; this crate owns the REST gateway, the
//! polling synchronizers, the derived growth-series math, the change-flash
//! machinery, and the form controllers a front end plugs into.

pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod poller;
pub mod services;
pub mod state;
pub mod store;

use config::AppConfig;
use error::Result;
use events::EventBus;
use gateway::HttpGateway;
use services::market::MarketService;
use services::portfolio::PortfolioService;
use state::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging, wire the state, and run the headless dashboard loop
/// until ctrl-c: pollers keep the shared store fresh and every notification
/// is logged.
pub async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "titanfolio=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(base_url = %config.base_url, "Starting Titanfolio client");

    let events = EventBus::new();
    let backend = Arc::new(HttpGateway::new(&config, events.clone())?);
    let state = Arc::new(AppState::new(config, backend, events));

    // Log notifications the way the UI would toast them.
    let mut notifications = state.events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = notifications.recv().await {
            match event.detail {
                Some(detail) => {
                    tracing::info!(level = ?event.level, detail = %detail, "{}", event.message)
                }
                None => tracing::info!(level = ?event.level, "{}", event.message),
            }
        }
    });

    let portfolio_poller = PortfolioService::spawn_poller(&state);
    let market_poller = MarketService::spawn_summary_poller(&state);

    // Once holdings are known, follow them on the live ticker tape.
    let mut portfolio_rx = portfolio_poller.subscribe();
    let quotes_state = Arc::clone(&state);
    let quotes_task = tokio::spawn(async move {
        let mut quotes_poller = None;
        let mut tracked: Vec<String> = Vec::new();
        while portfolio_rx.changed().await.is_ok() {
            let symbols: Vec<String> = portfolio_rx
                .borrow()
                .value()
                .map(|p| p.holdings.iter().map(|h| h.ticker.clone()).collect())
                .unwrap_or_default();
            if symbols != tracked && !symbols.is_empty() {
                tracing::debug!(symbols = ?symbols, "rebuilding live-quote poller");
                quotes_poller = Some(MarketService::spawn_quotes_poller(
                    &quotes_state,
                    symbols.clone(),
                ));
                tracked = symbols;
            }
        }
        drop(quotes_poller);
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    quotes_task.abort();
    drop(market_poller);
    drop(portfolio_poller);
    Ok(())
}
