//! Dividend Service
//!
//! Register/edit/delete dividend and rights events. Same mutation discipline
//! as the cash controllers: validate locally, submit, notify, re-pull the
//! pending list once on success.

use crate::error::{AppError, Result};
use crate::gateway::types::{DividendKind, DividendRecord, DividendRequest};
use crate::state::{AppState, PENDING_DIVIDENDS_KEY};
use tracing::{info, warn};

pub struct DividendService;

impl DividendService {
    /// Fetch pending dividends and publish them to the shared store.
    pub async fn refresh_pending(state: &AppState) -> Result<Vec<DividendRecord>> {
        let pending = state.backend.pending_dividends().await?;
        state.dividends.publish(PENDING_DIVIDENDS_KEY, pending.clone());
        Ok(pending)
    }

    pub async fn register(state: &AppState, request: DividendRequest) -> Result<()> {
        if let Err(e) = validate(&request) {
            state.events.warning(e.to_string());
            return Err(e);
        }

        info!(ticker = %request.ticker, kind = ?request.kind, "registering dividend");
        match state.backend.register_dividend(&request).await {
            Ok(()) => {
                state
                    .events
                    .success(format!("Dividend registered for {}", request.ticker));
                Self::refetch(state).await;
                Ok(())
            }
            Err(e) => {
                state
                    .events
                    .error("Dividend registration failed", e.detail().map(String::from));
                Err(e)
            }
        }
    }

    pub async fn update(state: &AppState, id: i64, request: DividendRequest) -> Result<()> {
        if let Err(e) = validate(&request) {
            state.events.warning(e.to_string());
            return Err(e);
        }

        match state.backend.update_dividend(id, &request).await {
            Ok(()) => {
                state.events.success("Dividend updated");
                Self::refetch(state).await;
                Ok(())
            }
            Err(e) => {
                state
                    .events
                    .error("Dividend update failed", e.detail().map(String::from));
                Err(e)
            }
        }
    }

    pub async fn delete(state: &AppState, id: i64) -> Result<()> {
        match state.backend.delete_dividend(id).await {
            Ok(()) => {
                state.events.success("Dividend deleted");
                Self::refetch(state).await;
                Ok(())
            }
            Err(e) => {
                state
                    .events
                    .error("Dividend deletion failed", e.detail().map(String::from));
                Err(e)
            }
        }
    }

    async fn refetch(state: &AppState) {
        if let Err(e) = Self::refresh_pending(state).await {
            warn!(error = %e, "pending dividends refetch failed");
        }
    }
}

fn validate(request: &DividendRequest) -> Result<()> {
    if request.ticker.trim().is_empty() {
        return Err(AppError::Validation("Ticker is required".to_string()));
    }
    match request.kind {
        DividendKind::DividendCash => {
            if request.amount_per_share.unwrap_or(0.0) <= 0.0 {
                return Err(AppError::Validation(
                    "Cash dividend requires an amount per share".to_string(),
                ));
            }
        }
        DividendKind::DividendStock => {
            if request.ratio.unwrap_or(0.0) <= 0.0 {
                return Err(AppError::Validation(
                    "Stock dividend requires a ratio".to_string(),
                ));
            }
        }
        DividendKind::Rights => {
            if request.purchase_price.unwrap_or(0.0) <= 0.0
                || request.rights_quantity.unwrap_or(0) <= 0
            {
                return Err(AppError::Validation(
                    "Rights issue requires purchase price and quantity".to_string(),
                ));
            }
        }
    }
    Ok(())
}
