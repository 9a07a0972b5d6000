//! Mock price oracle for integration testing.
//!
//! Provides a deterministic `PriceOracle` whose prices can be moved,
//! delisted, or failed from test code, and which counts lookups.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tradesim::market::{PriceError, PriceOracle};

/// A mock price source for deterministic testing.
///
/// All state is in-memory and shared between clones, so a test can keep
/// a handle while the account engine uses another.
#[derive(Clone)]
pub struct MockOracle {
    prices: Arc<Mutex<BTreeMap<String, Decimal>>>,
    lookups: Arc<AtomicUsize>,
    /// If set, every lookup fails with UnknownSymbol.
    outage: Arc<Mutex<bool>>,
}

impl MockOracle {
    /// The three default symbols at their fixed prices.
    pub fn new() -> Self {
        Self::with_prices(&[
            ("COALINDIA", dec!(450.00)),
            ("MARICO", dec!(670.00)),
            ("ICICIAMC", dec!(1200.00)),
        ])
    }

    pub fn with_prices(prices: &[(&str, Decimal)]) -> Self {
        let map = prices
            .iter()
            .map(|(s, p)| (s.to_string(), *p))
            .collect();
        Self {
            prices: Arc::new(Mutex::new(map)),
            lookups: Arc::new(AtomicUsize::new(0)),
            outage: Arc::new(Mutex::new(false)),
        }
    }

    pub fn set_price(&self, symbol: &str, price: Decimal) {
        self.prices.lock().unwrap().insert(symbol.to_string(), price);
    }

    pub fn delist(&self, symbol: &str) {
        self.prices.lock().unwrap().remove(symbol);
    }

    pub fn set_outage(&self, down: bool) {
        *self.outage.lock().unwrap() = down;
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl PriceOracle for MockOracle {
    fn lookup(&self, symbol: &str) -> Result<Decimal, PriceError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if *self.outage.lock().unwrap() {
            return Err(PriceError::UnknownSymbol(symbol.to_string()));
        }
        self.prices
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .ok_or_else(|| PriceError::UnknownSymbol(symbol.to_string()))
    }

    fn symbols(&self) -> Vec<String> {
        self.prices.lock().unwrap().keys().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_default_prices() {
        let oracle = MockOracle::new();
        assert_eq!(oracle.lookup("MARICO").unwrap(), dec!(670));
        assert_eq!(oracle.symbols().len(), 3);
        assert_eq!(oracle.lookups(), 1);
    }

    #[test]
    fn test_mock_set_price_and_delist() {
        let oracle = MockOracle::new();
        oracle.set_price("MARICO", dec!(700));
        assert_eq!(oracle.lookup("MARICO").unwrap(), dec!(700));

        oracle.delist("MARICO");
        assert!(oracle.lookup("MARICO").is_err());
    }

    #[test]
    fn test_mock_outage() {
        let oracle = MockOracle::new();
        oracle.set_outage(true);
        assert!(oracle.lookup("COALINDIA").is_err());
        oracle.set_outage(false);
        assert!(oracle.lookup("COALINDIA").is_ok());
    }

    #[test]
    fn test_mock_clones_share_state() {
        let oracle = MockOracle::new();
        let handle = oracle.clone();
        handle.set_price("ACME", dec!(1));
        assert_eq!(oracle.lookup("ACME").unwrap(), dec!(1));
        assert_eq!(handle.lookups(), 1);
    }
}
