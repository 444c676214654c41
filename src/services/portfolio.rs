//! Portfolio Service
//!
//! Cash and trade controllers. Business validation lives server-side; this
//! layer only short-circuits empty/garbled input, submits the mutation, and
//! on success clears the form, notifies, and re-pulls the source of truth
//! exactly once. There is no optimistic local update. On failure the form
//! state is left intact so the user can correct and resubmit.

use crate::error::{AppError, Result};
use crate::gateway::types::{CashRequest, Portfolio, TradeRequest};
use crate::services::forms::{
    autoscale_price, format_price, format_thousands, is_price_char, normalize_amount_input,
    parse_amount, parse_price,
};
use crate::state::{AppState, PORTFOLIO_KEY};
use tracing::{info, warn};

/// Deposit/withdraw form state.
#[derive(Debug, Default, Clone)]
pub struct CashForm {
    pub amount: String,
    pub description: String,
}

impl CashForm {
    /// Feed the raw amount keystroke buffer; redisplays with separators.
    pub fn set_amount(&mut self, raw: &str) {
        self.amount = normalize_amount_input(raw);
    }

    pub fn set_description(&mut self, raw: &str) {
        self.description = raw.to_string();
    }

    fn to_request(&self) -> Result<CashRequest> {
        Ok(CashRequest {
            amount: parse_amount(&self.amount)?,
            description: self.description.trim().to_string(),
        })
    }

    fn clear(&mut self) {
        self.amount.clear();
        self.description.clear();
    }
}

/// Buy/sell form state.
#[derive(Debug, Default, Clone)]
pub struct TradeForm {
    pub ticker: String,
    pub volume: String,
    pub price: String,
    pub note: String,
}

impl TradeForm {
    pub fn set_ticker(&mut self, raw: &str) {
        self.ticker = raw.trim().to_uppercase();
    }

    pub fn set_volume(&mut self, raw: &str) {
        self.volume = normalize_amount_input(raw);
    }

    /// Price keystrokes outside `[0-9,.]` are ignored.
    pub fn set_price(&mut self, raw: &str) {
        self.price = raw.chars().filter(|c| is_price_char(*c)).collect();
    }

    /// Blur handler: apply the thousands shorthand and redisplay.
    pub fn blur_price(&mut self) {
        if let Ok(price) = parse_price(&self.price) {
            self.price = format_price(autoscale_price(price));
        }
    }

    fn to_request(&self) -> Result<TradeRequest> {
        if self.ticker.is_empty() {
            return Err(AppError::Validation("Ticker is required".to_string()));
        }
        let volume = parse_amount(&self.volume)
            .map_err(|_| AppError::Validation("Volume is required".to_string()))?;
        let note = self.note.trim();
        Ok(TradeRequest {
            ticker: self.ticker.clone(),
            volume: volume as i64,
            price: parse_price(&self.price)?,
            note: (!note.is_empty()).then(|| note.to_string()),
        })
    }

    fn clear(&mut self) {
        self.ticker.clear();
        self.volume.clear();
        self.price.clear();
        self.note.clear();
    }
}

/// Portfolio service for cash/trade mutations and snapshot refresh.
pub struct PortfolioService;

impl PortfolioService {
    /// Fetch the snapshot and publish it to the shared store.
    pub async fn refresh(state: &AppState) -> Result<Portfolio> {
        let portfolio = state.backend.get_portfolio().await?;
        state.portfolio.publish(PORTFOLIO_KEY, portfolio.clone());
        Ok(portfolio)
    }

    pub async fn deposit(state: &AppState, form: &mut CashForm) -> Result<()> {
        let request = match form.to_request() {
            Ok(request) => request,
            Err(e) => {
                state.events.warning(e.to_string());
                return Err(e);
            }
        };

        info!(amount = request.amount, "submitting deposit");
        match state.backend.deposit(&request).await {
            Ok(()) => {
                state.events.success(format!(
                    "Deposited {} VND",
                    format_thousands(request.amount)
                ));
                form.clear();
                Self::refetch_after_mutation(state).await;
                Ok(())
            }
            Err(e) => {
                state
                    .events
                    .error("Deposit failed", e.detail().map(String::from));
                Err(e)
            }
        }
    }

    pub async fn withdraw(state: &AppState, form: &mut CashForm) -> Result<()> {
        let request = match form.to_request() {
            Ok(request) => request,
            Err(e) => {
                state.events.warning(e.to_string());
                return Err(e);
            }
        };

        info!(amount = request.amount, "submitting withdrawal");
        match state.backend.withdraw(&request).await {
            Ok(()) => {
                state.events.success(format!(
                    "Withdrew {} VND",
                    format_thousands(request.amount)
                ));
                form.clear();
                Self::refetch_after_mutation(state).await;
                Ok(())
            }
            Err(e) => {
                state
                    .events
                    .error("Withdrawal failed", e.detail().map(String::from));
                Err(e)
            }
        }
    }

    pub async fn buy(state: &AppState, form: &mut TradeForm) -> Result<()> {
        Self::trade(state, form, true).await
    }

    pub async fn sell(state: &AppState, form: &mut TradeForm) -> Result<()> {
        Self::trade(state, form, false).await
    }

    async fn trade(state: &AppState, form: &mut TradeForm, is_buy: bool) -> Result<()> {
        let request = match form.to_request() {
            Ok(request) => request,
            Err(e) => {
                state.events.warning(e.to_string());
                return Err(e);
            }
        };

        let side = if is_buy { "buy" } else { "sell" };
        info!(
            ticker = %request.ticker,
            volume = request.volume,
            price = request.price,
            side,
            "submitting order"
        );

        let result = if is_buy {
            state.backend.buy(&request).await
        } else {
            state.backend.sell(&request).await
        };

        match result {
            Ok(()) => {
                state.events.success(format!(
                    "{} {} {} @ {}",
                    if is_buy { "Bought" } else { "Sold" },
                    format_thousands(request.volume as u64),
                    request.ticker,
                    format_price(request.price)
                ));
                form.clear();
                Self::refetch_after_mutation(state).await;
                Ok(())
            }
            Err(e) => {
                let label = if is_buy {
                    "Buy order rejected"
                } else {
                    "Sell order rejected"
                };
                state.events.error(label, e.detail().map(String::from));
                Err(e)
            }
        }
    }

    pub async fn undo_last_buy(state: &AppState) -> Result<()> {
        match state.backend.undo_last_buy().await {
            Ok(()) => {
                state.events.success("Last buy undone");
                Self::refetch_after_mutation(state).await;
                Ok(())
            }
            Err(e) => {
                state
                    .events
                    .error("Undo failed", e.detail().map(String::from));
                Err(e)
            }
        }
    }

    pub async fn update_note(state: &AppState, log_id: i64, note: &str) -> Result<()> {
        match state.backend.update_note(log_id, note).await {
            Ok(()) => {
                state.events.success("Note saved");
                Ok(())
            }
            Err(e) => {
                state
                    .events
                    .error("Note update failed", e.detail().map(String::from));
                Err(e)
            }
        }
    }

    /// 10s dashboard poller for the portfolio snapshot, routed through the
    /// shared store.
    pub fn spawn_poller(state: &std::sync::Arc<AppState>) -> crate::poller::PolledResource<Portfolio> {
        let interval = state.config.intervals.dashboard;
        let state = std::sync::Arc::clone(state);
        crate::poller::PolledResource::spawn("portfolio", interval, move || {
            let state = std::sync::Arc::clone(&state);
            async move {
                state
                    .portfolio
                    .fetch_through(PORTFOLIO_KEY, || state.backend.get_portfolio())
                    .await
            }
        })
    }

    // Consistency after a mutation is one full re-pull. Its failure is not
    // the mutation's failure: the next poll recovers.
    async fn refetch_after_mutation(state: &AppState) {
        if let Err(e) = Self::refresh(state).await {
            warn!(error = %e, "post-mutation refetch failed");
        }
    }
}
