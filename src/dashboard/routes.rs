//! Dashboard API route handlers.
//!
//! All endpoints return JSON. The single session account lives behind a
//! `RwLock`: mutations hold the write lock for the whole operation, reads
//! take the read lock and always see a fully applied state.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::engine::history::{self, HistoryQuery};
use crate::engine::Account;
use crate::market::PriceOracle;
use crate::types::{
    BalancePoint, ErrorKind, HoldingView, LedgerError, PortfolioSummary, Receipt, TradeQuote,
    Transaction, TransactionKind,
};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub account: RwLock<Account>,
    pub oracle: Arc<dyn PriceOracle>,
}

impl DashboardState {
    pub fn new(account: Account, oracle: Arc<dyn PriceOracle>) -> Self {
        Self {
            account: RwLock::new(account),
            oracle,
        }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OnboardRequest {
    pub name: String,
    pub initial_funding: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CashRequest {
    pub amount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradeRequest {
    pub symbol: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteParams {
    pub symbol: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionParams {
    pub kind: Option<String>,
    pub symbol: Option<String>,
    /// "newest" (default) or "oldest".
    pub order: Option<String>,
    pub limit: Option<usize>,
}

/// Successful mutation: message, the appended transaction, and the
/// summary as of right after it. The mutation stands even when the
/// summary can't be valued; `summary` is then null and `valuation_error`
/// says why.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResponse {
    pub ok: bool,
    pub message: String,
    pub transaction: Option<Transaction>,
    pub summary: Option<PortfolioSummary>,
    pub valuation_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolPrice {
    pub symbol: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub kind: ErrorKind,
    pub message: String,
}

/// An error on its way out as an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    /// Body or query string that could not be decoded.
    Request { status: StatusCode, message: String },
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self::Ledger(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::request(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::request(rejection.status(), rejection.body_text())
    }
}

impl ApiError {
    fn request(status: StatusCode, message: String) -> Self {
        warn!(%status, error = %message, "Request rejected");
        Self::Request { status, message }
    }

    fn bad_request(message: String) -> Self {
        Self::request(StatusCode::BAD_REQUEST, message)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Ledger(err) => err.kind(),
            Self::Request { .. } => ErrorKind::InvalidRequest,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Request { status, .. } => *status,
            Self::Ledger(err) => match err.kind() {
                ErrorKind::InvalidRequest
                | ErrorKind::InvalidName
                | ErrorKind::InvalidAmount
                | ErrorKind::InvalidQuantity => StatusCode::BAD_REQUEST,
                ErrorKind::UnknownSymbol | ErrorKind::NoSuchHolding => StatusCode::NOT_FOUND,
                ErrorKind::InsufficientFunds
                | ErrorKind::InsufficientHolding
                | ErrorKind::AlreadyOnboarded => StatusCode::CONFLICT,
                ErrorKind::ValuationError => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        let message = match self {
            Self::Ledger(err) => err.to_string(),
            Self::Request { message, .. } => message,
        };
        let body = ErrorBody {
            ok: false,
            kind,
            message,
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Wrap an applied mutation. Valuation failures are reported alongside,
/// never in place of, the committed receipt.
fn applied(
    account: &Account,
    oracle: &dyn PriceOracle,
    message: String,
    transaction: Option<Transaction>,
) -> Json<OperationResponse> {
    let (summary, valuation_error) = match account.summarize(oracle) {
        Ok(summary) => (Some(summary), None),
        Err(e) => (None, Some(e.to_string())),
    };
    Json(OperationResponse {
        ok: true,
        message,
        transaction,
        summary,
        valuation_error,
    })
}

fn respond(
    account: &Account,
    oracle: &dyn PriceOracle,
    receipt: Receipt,
) -> Json<OperationResponse> {
    applied(account, oracle, receipt.message, Some(receipt.transaction))
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/summary
pub async fn get_summary(State(state): State<AppState>) -> ApiResult<PortfolioSummary> {
    let account = state.account.read().await;
    Ok(Json(account.summarize(state.oracle.as_ref())?))
}

/// GET /api/holdings
pub async fn get_holdings(State(state): State<AppState>) -> ApiResult<Vec<HoldingView>> {
    let account = state.account.read().await;
    Ok(Json(account.holdings_view(state.oracle.as_ref())?))
}

/// GET /api/transactions
pub async fn get_transactions(
    State(state): State<AppState>,
    params: Result<Query<TransactionParams>, QueryRejection>,
) -> ApiResult<Vec<Transaction>> {
    let Query(params) = params?;
    let mut query = HistoryQuery::default();
    if let Some(kind) = params.kind.as_deref() {
        let kind: TransactionKind = kind
            .parse()
            .map_err(|e: anyhow::Error| ApiError::bad_request(e.to_string()))?;
        query = query.kind(kind);
    }
    if let Some(symbol) = params.symbol.as_deref() {
        query = query.symbol(symbol);
    }
    match params.order.as_deref() {
        None | Some("newest") => {}
        Some("oldest") => query = query.oldest_first(),
        Some(other) => {
            return Err(ApiError::bad_request(format!("Unknown order: {other}")));
        }
    }
    if let Some(limit) = params.limit {
        query = query.limit(limit);
    }

    let account = state.account.read().await;
    Ok(Json(query.apply(account.transactions())))
}

/// GET /api/balance-history
pub async fn get_balance_history(State(state): State<AppState>) -> Json<Vec<BalancePoint>> {
    let account = state.account.read().await;
    Json(history::balance_history(account.transactions()))
}

/// GET /api/symbols
pub async fn get_symbols(State(state): State<AppState>) -> ApiResult<Vec<SymbolPrice>> {
    let oracle = state.oracle.as_ref();
    let symbols = oracle
        .symbols()
        .into_iter()
        .map(|symbol| {
            let price = oracle.lookup(&symbol).map_err(LedgerError::from)?;
            Ok(SymbolPrice { symbol, price })
        })
        .collect::<Result<Vec<_>, LedgerError>>()?;
    Ok(Json(symbols))
}

/// GET /api/quote
pub async fn get_quote(
    State(state): State<AppState>,
    params: Result<Query<QuoteParams>, QueryRejection>,
) -> ApiResult<TradeQuote> {
    let Query(params) = params?;
    let account = state.account.read().await;
    Ok(Json(account.quote(
        state.oracle.as_ref(),
        &params.symbol,
        params.quantity,
    )?))
}

/// POST /api/onboard
pub async fn onboard(
    State(state): State<AppState>,
    payload: Result<Json<OnboardRequest>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(req) = payload?;
    let mut account = state.account.write().await;
    let receipt = account.onboard(&req.name, req.initial_funding)?;
    Ok(respond(&account, state.oracle.as_ref(), receipt))
}

/// POST /api/deposit
pub async fn deposit(
    State(state): State<AppState>,
    payload: Result<Json<CashRequest>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(req) = payload?;
    let mut account = state.account.write().await;
    let receipt = account.deposit(req.amount)?;
    Ok(respond(&account, state.oracle.as_ref(), receipt))
}

/// POST /api/withdraw
pub async fn withdraw(
    State(state): State<AppState>,
    payload: Result<Json<CashRequest>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(req) = payload?;
    let mut account = state.account.write().await;
    let receipt = account.withdraw(req.amount)?;
    Ok(respond(&account, state.oracle.as_ref(), receipt))
}

/// POST /api/buy
pub async fn buy(
    State(state): State<AppState>,
    payload: Result<Json<TradeRequest>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(req) = payload?;
    let oracle = state.oracle.as_ref();
    let mut account = state.account.write().await;
    let receipt = account.buy(oracle, &req.symbol, req.quantity)?;
    Ok(respond(&account, oracle, receipt))
}

/// POST /api/sell
pub async fn sell(
    State(state): State<AppState>,
    payload: Result<Json<TradeRequest>, JsonRejection>,
) -> ApiResult<OperationResponse> {
    let Json(req) = payload?;
    let oracle = state.oracle.as_ref();
    let mut account = state.account.write().await;
    let receipt = account.sell(oracle, &req.symbol, req.quantity)?;
    Ok(respond(&account, oracle, receipt))
}

/// POST /api/reset — replace the session account with an empty one.
pub async fn reset(State(state): State<AppState>) -> Json<OperationResponse> {
    let mut account = state.account.write().await;
    let dropped = account.transactions().len();
    *account = Account::new();
    info!(dropped_transactions = dropped, "Simulation reset");

    applied(
        &account,
        state.oracle.as_ref(),
        "Simulation reset.".to_string(),
        None,
    )
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
