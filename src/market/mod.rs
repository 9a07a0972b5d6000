//! Market data.
//!
//! Defines the `PriceOracle` trait the account engine prices trades and
//! valuations through, and the fixed price table that stands in for a
//! live feed.

pub mod fixed;

use rust_decimal::Decimal;

pub use fixed::FixedPriceTable;

/// Errors a price source can report.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PriceError {
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Invalid price for {symbol}: {price}")]
    InvalidPrice { symbol: String, price: String },
}

/// Abstraction over price sources.
///
/// Implementors hold no mutable state, so a single instance can be shared
/// across threads without locking. Lookups are case-sensitive.
#[cfg_attr(test, mockall::automock)]
pub trait PriceOracle: Send + Sync {
    /// Current unit price for `symbol`. Unknown symbols are an error,
    /// never a zero price.
    fn lookup(&self, symbol: &str) -> Result<Decimal, PriceError>;

    /// Tradable symbols, sorted.
    fn symbols(&self) -> Vec<String>;
}
