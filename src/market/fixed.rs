//! Fixed price table.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use super::{PriceError, PriceOracle};

/// A static symbol → price map.
#[derive(Debug, Clone)]
pub struct FixedPriceTable {
    prices: BTreeMap<String, Decimal>,
}

impl Default for FixedPriceTable {
    fn default() -> Self {
        let prices = BTreeMap::from([
            ("COALINDIA".to_string(), dec!(450.00)),
            ("MARICO".to_string(), dec!(670.00)),
            ("ICICIAMC".to_string(), dec!(1200.00)),
        ]);
        Self { prices }
    }
}

impl FixedPriceTable {
    /// Build a table, rejecting any non-positive price.
    pub fn new<I>(prices: I) -> Result<Self, PriceError>
    where
        I: IntoIterator<Item = (String, Decimal)>,
    {
        let mut table = BTreeMap::new();
        for (symbol, price) in prices {
            if price <= Decimal::ZERO {
                return Err(PriceError::InvalidPrice {
                    symbol,
                    price: price.to_string(),
                });
            }
            table.insert(symbol, price);
        }
        Ok(Self { prices: table })
    }
}

impl PriceOracle for FixedPriceTable {
    fn lookup(&self, symbol: &str) -> Result<Decimal, PriceError> {
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| PriceError::UnknownSymbol(symbol.to_string()))
    }

    fn symbols(&self) -> Vec<String> {
        self.prices.keys().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
