//! Watchlist Service
//!
//! CRUD over named watchlists plus the enriched detail rows. Which watchlist
//! is "active" is client-local state on `AppState`; the backend only stores
//! the lists themselves.

use crate::error::{AppError, Result};
use crate::gateway::types::{Watchlist, WatchlistItem};
use crate::poller::PolledResource;
use crate::state::{AppState, WATCHLISTS_KEY};
use crate::store::ResourceStore;
use std::sync::Arc;
use tracing::warn;

pub struct WatchlistService;

impl WatchlistService {
    /// Fetch all watchlists and publish them. Picks the first list as active
    /// when nothing is selected yet.
    pub async fn refresh(state: &AppState) -> Result<Vec<Watchlist>> {
        let watchlists = state.backend.list_watchlists().await?;
        if state.active_watchlist().is_none() {
            state.set_active_watchlist(watchlists.first().map(|w| w.id));
        }
        state.watchlists.publish(WATCHLISTS_KEY, watchlists.clone());
        Ok(watchlists)
    }

    pub async fn create(state: &AppState, name: &str) -> Result<Watchlist> {
        let name = name.trim();
        if name.is_empty() {
            let err = AppError::Validation("Watchlist name is required".to_string());
            state.events.warning(err.to_string());
            return Err(err);
        }

        match state.backend.create_watchlist(name).await {
            Ok(watchlist) => {
                state
                    .events
                    .success(format!("Watchlist '{}' created", watchlist.name));
                state.set_active_watchlist(Some(watchlist.id));
                Self::refetch(state).await;
                Ok(watchlist)
            }
            Err(e) => {
                state
                    .events
                    .error("Watchlist creation failed", e.detail().map(String::from));
                Err(e)
            }
        }
    }

    pub async fn rename(state: &AppState, id: i64, name: &str) -> Result<()> {
        match state.backend.rename_watchlist(id, name.trim()).await {
            Ok(()) => {
                state.events.success("Watchlist renamed");
                Self::refetch(state).await;
                Ok(())
            }
            Err(e) => {
                state
                    .events
                    .error("Watchlist rename failed", e.detail().map(String::from));
                Err(e)
            }
        }
    }

    pub async fn delete(state: &AppState, id: i64) -> Result<()> {
        match state.backend.delete_watchlist(id).await {
            Ok(()) => {
                state.events.success("Watchlist deleted");
                if state.active_watchlist() == Some(id) {
                    state.set_active_watchlist(None);
                }
                Self::refetch(state).await;
                Ok(())
            }
            Err(e) => {
                state
                    .events
                    .error("Watchlist deletion failed", e.detail().map(String::from));
                Err(e)
            }
        }
    }

    pub async fn add_ticker(state: &AppState, watchlist_id: i64, ticker: &str) -> Result<()> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            let err = AppError::Validation("Ticker is required".to_string());
            state.events.warning(err.to_string());
            return Err(err);
        }

        match state.backend.add_watchlist_ticker(watchlist_id, &ticker).await {
            Ok(()) => {
                state.events.success(format!("{} added", ticker));
                Self::refetch(state).await;
                Ok(())
            }
            Err(e) => {
                state
                    .events
                    .error("Could not add ticker", e.detail().map(String::from));
                Err(e)
            }
        }
    }

    pub async fn remove_ticker(state: &AppState, watchlist_id: i64, ticker_id: i64) -> Result<()> {
        match state
            .backend
            .remove_watchlist_ticker(watchlist_id, ticker_id)
            .await
        {
            Ok(()) => {
                state.events.success("Ticker removed");
                Self::refetch(state).await;
                Ok(())
            }
            Err(e) => {
                state
                    .events
                    .error("Could not remove ticker", e.detail().map(String::from));
                Err(e)
            }
        }
    }

    /// Spawn the 10s detail poller for one watchlist, routed through the
    /// shared store. The caller drops the handle (and with it the timer)
    /// when the active watchlist changes.
    pub fn spawn_detail_poller(
        state: &Arc<AppState>,
        watchlist_id: i64,
    ) -> PolledResource<Vec<WatchlistItem>> {
        let interval = state.config.intervals.dashboard;
        let state = Arc::clone(state);
        PolledResource::spawn(
            format!("watchlist-detail:{}", watchlist_id),
            interval,
            move || {
                let state = Arc::clone(&state);
                async move {
                    fetch_detail_through_store(&state.watchlist_detail, &state, watchlist_id).await
                }
            },
        )
    }

    async fn refetch(state: &AppState) {
        if let Err(e) = Self::refresh(state).await {
            warn!(error = %e, "watchlist refetch failed");
        }
    }
}

async fn fetch_detail_through_store(
    store: &ResourceStore<Vec<WatchlistItem>>,
    state: &AppState,
    watchlist_id: i64,
) -> Result<Vec<WatchlistItem>> {
    store
        .fetch_through(&watchlist_id.to_string(), || async {
            state.backend.watchlist_detail(watchlist_id).await
        })
        .await
}
