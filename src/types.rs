//! Shared types for the TradeSim ledger.
//!
//! These types form the data model used across all modules.
//! The engine owns the mutable state; everything here is either an
//! immutable record or an owned read model handed out to callers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Holding
// ---------------------------------------------------------------------------

/// Accumulated ownership of one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    /// Units owned. Always > 0 while the holding is in the account.
    pub quantity: u64,
    /// Volume-weighted average price paid per currently-held unit.
    pub average_cost: Decimal,
}

impl fmt::Display for Holding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{} @ {:.2}", self.symbol, self.quantity, self.average_cost)
    }
}

impl Holding {
    /// Total paid for the units still held. `None` if it overflows.
    pub fn cost_basis(&self) -> Option<Decimal> {
        self.average_cost.checked_mul(Decimal::from(self.quantity))
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of ledger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Buy,
    Sell,
}

impl TransactionKind {
    /// Whether this kind moves shares as well as cash.
    pub fn is_trade(&self) -> bool {
        matches!(self, TransactionKind::Buy | TransactionKind::Sell)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Deposit => write!(f, "DEPOSIT"),
            TransactionKind::Withdrawal => write!(f, "WITHDRAWAL"),
            TransactionKind::Buy => write!(f, "BUY"),
            TransactionKind::Sell => write!(f, "SELL"),
        }
    }
}

/// Attempt to parse a string into a TransactionKind (case-insensitive).
impl std::str::FromStr for TransactionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdrawal" | "withdraw" => Ok(TransactionKind::Withdrawal),
            "buy" => Ok(TransactionKind::Buy),
            "sell" => Ok(TransactionKind::Sell),
            _ => Err(anyhow::anyhow!("Unknown transaction kind: {s}")),
        }
    }
}

/// Outcome marker on a recorded transaction. Only applied events are
/// recorded, so there is a single variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Completed,
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// Immutable record of one applied ledger event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: TransactionKind,
    /// Present for BUY/SELL only.
    pub symbol: Option<String>,
    /// Present for BUY/SELL only.
    pub quantity: Option<u64>,
    /// Execution price, present for BUY/SELL only.
    pub unit_price: Option<Decimal>,
    /// Signed cash effect: positive for DEPOSIT/SELL, negative for
    /// WITHDRAWAL/BUY.
    pub amount: Decimal,
    /// Cash balance right after this event was applied.
    pub balance_after: Decimal,
    pub status: TransactionStatus,
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = self.timestamp.format("%Y-%m-%d %H:%M:%S");
        match (&self.symbol, self.quantity, self.unit_price) {
            (Some(symbol), Some(qty), Some(price)) => write!(
                f,
                "{ts} {} {symbol} x{qty} @ {price:.2} amount={:+.2} balance={:.2}",
                self.kind, self.amount, self.balance_after,
            ),
            _ => write!(
                f,
                "{ts} {} amount={:+.2} balance={:.2}",
                self.kind, self.amount, self.balance_after,
            ),
        }
    }
}

impl Transaction {
    /// A cash-only event (DEPOSIT or WITHDRAWAL).
    pub fn cash(kind: TransactionKind, amount: Decimal, balance_after: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            symbol: None,
            quantity: None,
            unit_price: None,
            amount,
            balance_after,
            status: TransactionStatus::Completed,
        }
    }

    /// A share trade (BUY or SELL).
    pub fn trade(
        kind: TransactionKind,
        symbol: &str,
        quantity: u64,
        unit_price: Decimal,
        amount: Decimal,
        balance_after: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            symbol: Some(symbol.to_string()),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
            amount,
            balance_after,
            status: TransactionStatus::Completed,
        }
    }
}

// ---------------------------------------------------------------------------
// Read models
// ---------------------------------------------------------------------------

/// A holding valued at the current market price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingView {
    pub symbol: String,
    pub quantity: u64,
    pub average_cost: Decimal,
    pub current_price: Decimal,
    pub market_value: Decimal,
    pub cost_basis: Decimal,
    pub unrealized_pl: Decimal,
}

impl HoldingView {
    /// Value `holding` at `current_price`. `None` if any figure overflows.
    pub fn new(holding: &Holding, current_price: Decimal) -> Option<Self> {
        let market_value = current_price.checked_mul(Decimal::from(holding.quantity))?;
        let cost_basis = holding.cost_basis()?;
        Some(Self {
            symbol: holding.symbol.clone(),
            quantity: holding.quantity,
            average_cost: holding.average_cost,
            current_price,
            market_value,
            cost_basis,
            unrealized_pl: market_value.checked_sub(cost_basis)?,
        })
    }
}

/// Point-in-time valuation of an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub owner_name: Option<String>,
    pub cash_balance: Decimal,
    pub market_value: Decimal,
    pub total_value: Decimal,
    /// Principal ever deposited; the denominator for P/L.
    pub cumulative_deposits: Decimal,
    /// Deposits minus withdrawals. Reported alongside, not used for P/L.
    pub net_contributions: Decimal,
    pub total_pl: Decimal,
    /// Total P/L as a percentage of cumulative deposits.
    pub pl_percentage: Decimal,
    pub holdings: Vec<HoldingView>,
    pub transaction_count: usize,
}

impl fmt::Display for PortfolioSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | cash={:.2} | market={:.2} | total={:.2} | P/L={:+.2} ({:+.2}%) | holdings={} | txns={}",
            self.owner_name.as_deref().unwrap_or("<not onboarded>"),
            self.cash_balance,
            self.market_value,
            self.total_value,
            self.total_pl,
            self.pl_percentage,
            self.holdings.len(),
            self.transaction_count,
        )
    }
}

/// Result of a successfully applied operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Human-readable confirmation.
    pub message: String,
    /// Copy of the transaction that was appended.
    pub transaction: Transaction,
}

/// Pre-trade estimate for buying `quantity` units of `symbol`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeQuote {
    pub symbol: String,
    pub quantity: u64,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub available_cash: Decimal,
    pub affordable: bool,
}

/// Cash balance after a given transaction, for charting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancePoint {
    pub timestamp: DateTime<Utc>,
    pub balance: Decimal,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Machine-readable error category, stable across message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed request body or query at the HTTP boundary.
    InvalidRequest,
    InvalidName,
    InvalidAmount,
    InvalidQuantity,
    InsufficientFunds,
    InsufficientHolding,
    NoSuchHolding,
    UnknownSymbol,
    AlreadyOnboarded,
    ValuationError,
}

/// Domain errors raised by the account engine. A rejected operation
/// leaves the account untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("Owner name cannot be empty")]
    InvalidName,

    #[error("Amount must be greater than zero, got {0}")]
    InvalidAmount(Decimal),

    #[error("Quantity must be greater than zero, got {0}")]
    InvalidQuantity(i64),

    #[error("Insufficient funds: need {needed:.2}, have {available:.2}")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    #[error("Insufficient shares of {symbol}: requested {requested}, held {held}")]
    InsufficientHolding {
        symbol: String,
        requested: u64,
        held: u64,
    },

    #[error("No holding for {0}")]
    NoSuchHolding(String),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Account already onboarded for {0}")]
    AlreadyOnboarded(String),

    #[error("Cannot value {symbol}: {reason}")]
    Valuation { symbol: String, reason: String },
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidName => ErrorKind::InvalidName,
            LedgerError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            LedgerError::InvalidQuantity(_) => ErrorKind::InvalidQuantity,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::InsufficientHolding { .. } => ErrorKind::InsufficientHolding,
            LedgerError::NoSuchHolding(_) => ErrorKind::NoSuchHolding,
            LedgerError::UnknownSymbol(_) => ErrorKind::UnknownSymbol,
            LedgerError::AlreadyOnboarded(_) => ErrorKind::AlreadyOnboarded,
            LedgerError::Valuation { .. } => ErrorKind::ValuationError,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
