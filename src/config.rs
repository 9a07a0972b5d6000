//! Configuration loading from TOML.
//!
//! Reads `config.toml` (or the file named by `TRADESIM_CONFIG`) and
//! deserializes into strongly-typed structs.

use anyhow::{anyhow, Context, Result};
use rust_decimal::prelude::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;

use crate::market::FixedPriceTable;

/// Default config file path.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub market: MarketConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketConfig {
    /// Symbol → unit price. Symbols are case-sensitive.
    pub prices: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Path from `TRADESIM_CONFIG`, falling back to `config.toml`.
    pub fn resolve_path() -> String {
        std::env::var("TRADESIM_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string())
    }

    /// Build the fixed price table from `[market.prices]`.
    pub fn price_table(&self) -> Result<FixedPriceTable> {
        let mut prices = Vec::with_capacity(self.market.prices.len());
        for (symbol, price) in &self.market.prices {
            let price = Decimal::from_f64(*price)
                .ok_or_else(|| anyhow!("Price for {symbol} is not a finite number"))?;
            prices.push((symbol.clone(), price.normalize()));
        }
        FixedPriceTable::new(prices).context("Invalid [market.prices] table")
    }
}
