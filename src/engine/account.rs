//! Account — cash, holdings, and the transaction ledger.
//!
//! Every mutating operation validates all of its preconditions before it
//! touches any field, so a rejected call leaves the account exactly as it
//! was and appends nothing to the history.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::market::{PriceError, PriceOracle};
use crate::types::{
    Holding, HoldingView, LedgerError, PortfolioSummary, Receipt, TradeQuote, Transaction,
    TransactionKind,
};

impl From<PriceError> for LedgerError {
    fn from(err: PriceError) -> Self {
        match err {
            PriceError::UnknownSymbol(symbol) => LedgerError::UnknownSymbol(symbol),
            PriceError::InvalidPrice { symbol, price } => LedgerError::Valuation {
                symbol,
                reason: format!("price source returned {price}"),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// The ledger aggregate. One instance per simulation session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Account {
    owner_name: Option<String>,
    cash_balance: Decimal,
    cumulative_deposits: Decimal,
    holdings: BTreeMap<String, Holding>,
    transactions: Vec<Transaction>,
}

impl Account {
    /// An empty, not-yet-onboarded account.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner_name(&self) -> Option<&str> {
        self.owner_name.as_deref()
    }

    pub fn is_onboarded(&self) -> bool {
        self.owner_name.is_some()
    }

    pub fn cash_balance(&self) -> Decimal {
        self.cash_balance
    }

    pub fn cumulative_deposits(&self) -> Decimal {
        self.cumulative_deposits
    }

    pub fn holding(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.get(symbol)
    }

    /// Holdings ordered by symbol.
    pub fn holdings(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.values()
    }

    /// Chronological history of applied events.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Deposits minus withdrawals.
    pub fn net_contributions(&self) -> Decimal {
        self.transactions
            .iter()
            .filter(|tx| !tx.kind.is_trade())
            .map(|tx| tx.amount)
            .sum()
    }

    // -- Mutations ---------------------------------------------------------

    /// Set the owner and fund the account. Allowed once.
    pub fn onboard(&mut self, name: &str, initial_funding: Decimal) -> Result<Receipt, LedgerError> {
        if let Some(owner) = &self.owner_name {
            return Err(rejected(LedgerError::AlreadyOnboarded(owner.clone())));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(rejected(LedgerError::InvalidName));
        }
        // Validate funding here so a failed deposit can't leave the name set.
        let (balance, deposits) = self.credit_deposit(initial_funding)?;

        self.owner_name = Some(name.to_string());
        let receipt = self.apply_deposit(initial_funding, balance, deposits);
        info!(owner = name, funding = %initial_funding, "Account onboarded");

        Ok(Receipt {
            message: format!("Welcome, {name}. Account funded with {initial_funding:.2}."),
            ..receipt
        })
    }

    /// Add cash. Counts toward cumulative deposits.
    pub fn deposit(&mut self, amount: Decimal) -> Result<Receipt, LedgerError> {
        let (balance, deposits) = self.credit_deposit(amount)?;
        Ok(self.apply_deposit(amount, balance, deposits))
    }

    /// Remove cash. Cumulative deposits are left as they are.
    pub fn withdraw(&mut self, amount: Decimal) -> Result<Receipt, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(rejected(LedgerError::InvalidAmount(amount)));
        }
        if amount > self.cash_balance {
            return Err(rejected(LedgerError::InsufficientFunds {
                needed: amount,
                available: self.cash_balance,
            }));
        }

        self.cash_balance -= amount;
        let tx = Transaction::cash(TransactionKind::Withdrawal, -amount, self.cash_balance);
        info!(amount = %amount, balance = %self.cash_balance, "Withdrawal applied");

        Ok(self.record(tx, format!("Withdrew {amount:.2}.")))
    }

    /// Buy `quantity` units at the oracle's current price.
    pub fn buy(
        &mut self,
        oracle: &dyn PriceOracle,
        symbol: &str,
        quantity: i64,
    ) -> Result<Receipt, LedgerError> {
        let qty = positive_quantity(quantity)?;
        let price = quote_price(oracle, symbol)?;
        let cost = extend(price, qty, quantity)?;

        if cost > self.cash_balance {
            return Err(rejected(LedgerError::InsufficientFunds {
                needed: cost,
                available: self.cash_balance,
            }));
        }

        let updated = match self.holdings.get(symbol) {
            Some(existing) => {
                let new_qty = existing
                    .quantity
                    .checked_add(qty)
                    .ok_or_else(|| rejected(LedgerError::InvalidQuantity(quantity)))?;
                let basis = existing
                    .cost_basis()
                    .and_then(|basis| basis.checked_add(cost))
                    .ok_or_else(|| rejected(LedgerError::InvalidQuantity(quantity)))?;
                Holding {
                    symbol: symbol.to_string(),
                    quantity: new_qty,
                    average_cost: basis / Decimal::from(new_qty),
                }
            }
            None => Holding {
                symbol: symbol.to_string(),
                quantity: qty,
                average_cost: price,
            },
        };

        // All checks passed; apply.
        self.cash_balance -= cost;
        debug!(holding = %updated, "Holding updated");
        self.holdings.insert(symbol.to_string(), updated);

        let tx = Transaction::trade(TransactionKind::Buy, symbol, qty, price, -cost, self.cash_balance);
        info!(
            symbol,
            quantity = qty,
            price = %price,
            cost = %cost,
            balance = %self.cash_balance,
            "Buy executed"
        );

        Ok(self.record(tx, format!("Bought {qty} {symbol} @ {price:.2} for {cost:.2}.")))
    }

    /// Sell `quantity` units of an existing holding at the oracle's
    /// current price. Average cost of the remainder is unchanged.
    pub fn sell(
        &mut self,
        oracle: &dyn PriceOracle,
        symbol: &str,
        quantity: i64,
    ) -> Result<Receipt, LedgerError> {
        let qty = positive_quantity(quantity)?;
        let held = self
            .holdings
            .get(symbol)
            .map(|h| h.quantity)
            .ok_or_else(|| rejected(LedgerError::NoSuchHolding(symbol.to_string())))?;
        if qty > held {
            return Err(rejected(LedgerError::InsufficientHolding {
                symbol: symbol.to_string(),
                requested: qty,
                held,
            }));
        }
        let price = quote_price(oracle, symbol)?;
        let proceeds = extend(price, qty, quantity)?;
        let new_balance = self
            .cash_balance
            .checked_add(proceeds)
            .ok_or_else(|| rejected(LedgerError::InvalidQuantity(quantity)))?;

        self.cash_balance = new_balance;
        let remaining = held - qty;
        if remaining == 0 {
            self.holdings.remove(symbol);
            debug!(symbol, "Holding closed");
        } else if let Some(holding) = self.holdings.get_mut(symbol) {
            holding.quantity = remaining;
        }

        let tx = Transaction::trade(TransactionKind::Sell, symbol, qty, price, proceeds, self.cash_balance);
        info!(
            symbol,
            quantity = qty,
            price = %price,
            proceeds = %proceeds,
            remaining,
            balance = %self.cash_balance,
            "Sell executed"
        );

        Ok(self.record(tx, format!("Sold {qty} {symbol} @ {price:.2} for {proceeds:.2}.")))
    }

    // -- Reads -------------------------------------------------------------

    /// Value every holding at the current price. Fails closed if any held
    /// symbol can't be priced.
    pub fn holdings_view(&self, oracle: &dyn PriceOracle) -> Result<Vec<HoldingView>, LedgerError> {
        self.holdings
            .values()
            .map(|holding| {
                let price = oracle
                    .lookup(&holding.symbol)
                    .map_err(|e| valuation_error(&holding.symbol, e.to_string()))?;
                if price <= Decimal::ZERO {
                    return Err(valuation_error(
                        &holding.symbol,
                        format!("non-positive price {price}"),
                    ));
                }
                HoldingView::new(holding, price)
                    .ok_or_else(|| valuation_error(&holding.symbol, "value overflows".to_string()))
            })
            .collect()
    }

    /// Cash, market value, and total P/L against cumulative deposits.
    pub fn summarize(&self, oracle: &dyn PriceOracle) -> Result<PortfolioSummary, LedgerError> {
        let holdings = self.holdings_view(oracle)?;
        let overflow = || valuation_error("portfolio", "total overflows".to_string());
        let market_value = holdings
            .iter()
            .try_fold(Decimal::ZERO, |acc, h| acc.checked_add(h.market_value))
            .ok_or_else(overflow)?;
        let total_value = self
            .cash_balance
            .checked_add(market_value)
            .ok_or_else(overflow)?;
        let total_pl = total_value
            .checked_sub(self.cumulative_deposits)
            .ok_or_else(overflow)?;
        let pl_percentage = if self.cumulative_deposits > Decimal::ZERO {
            total_pl
                .checked_div(self.cumulative_deposits)
                .and_then(|ratio| ratio.checked_mul(dec!(100)))
                .ok_or_else(overflow)?
        } else {
            Decimal::ZERO
        };

        let summary = PortfolioSummary {
            owner_name: self.owner_name.clone(),
            cash_balance: self.cash_balance,
            market_value,
            total_value,
            cumulative_deposits: self.cumulative_deposits,
            net_contributions: self.net_contributions(),
            total_pl,
            pl_percentage,
            holdings,
            transaction_count: self.transactions.len(),
        };
        debug!(%summary, "Portfolio summarized");
        Ok(summary)
    }

    /// What buying `quantity` of `symbol` would cost right now.
    pub fn quote(
        &self,
        oracle: &dyn PriceOracle,
        symbol: &str,
        quantity: i64,
    ) -> Result<TradeQuote, LedgerError> {
        let qty = positive_quantity(quantity)?;
        let unit_price = quote_price(oracle, symbol)?;
        let total = extend(unit_price, qty, quantity)?;
        Ok(TradeQuote {
            symbol: symbol.to_string(),
            quantity: qty,
            unit_price,
            total,
            available_cash: self.cash_balance,
            affordable: total <= self.cash_balance,
        })
    }

    // -- Internals ---------------------------------------------------------

    /// Validate a deposit and compute the resulting (balance, deposits)
    /// without mutating anything.
    fn credit_deposit(&self, amount: Decimal) -> Result<(Decimal, Decimal), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(rejected(LedgerError::InvalidAmount(amount)));
        }
        let balance = self.cash_balance.checked_add(amount);
        let deposits = self.cumulative_deposits.checked_add(amount);
        match (balance, deposits) {
            (Some(b), Some(d)) => Ok((b, d)),
            _ => Err(rejected(LedgerError::InvalidAmount(amount))),
        }
    }

    fn apply_deposit(&mut self, amount: Decimal, balance: Decimal, deposits: Decimal) -> Receipt {
        self.cash_balance = balance;
        self.cumulative_deposits = deposits;
        let tx = Transaction::cash(TransactionKind::Deposit, amount, self.cash_balance);
        info!(
            amount = %amount,
            balance = %self.cash_balance,
            cumulative_deposits = %self.cumulative_deposits,
            "Deposit applied"
        );
        self.record(tx, format!("Deposited {amount:.2}."))
    }

    fn record(&mut self, tx: Transaction, message: String) -> Receipt {
        self.transactions.push(tx.clone());
        Receipt {
            message,
            transaction: tx,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn rejected(err: LedgerError) -> LedgerError {
    warn!(kind = ?err.kind(), error = %err, "Operation rejected");
    err
}

fn valuation_error(symbol: &str, reason: String) -> LedgerError {
    rejected(LedgerError::Valuation {
        symbol: symbol.to_string(),
        reason,
    })
}

fn positive_quantity(quantity: i64) -> Result<u64, LedgerError> {
    u64::try_from(quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| rejected(LedgerError::InvalidQuantity(quantity)))
}

/// Price a symbol for trading. A pluggable source returning a
/// non-positive price is treated as unable to price.
fn quote_price(oracle: &dyn PriceOracle, symbol: &str) -> Result<Decimal, LedgerError> {
    let price = oracle.lookup(symbol).map_err(|e| rejected(e.into()))?;
    if price <= Decimal::ZERO {
        return Err(valuation_error(symbol, format!("non-positive price {price}")));
    }
    Ok(price)
}

/// `price * qty`, rejecting overflow as an invalid quantity.
fn extend(price: Decimal, qty: u64, requested: i64) -> Result<Decimal, LedgerError> {
    price
        .checked_mul(Decimal::from(qty))
        .ok_or_else(|| rejected(LedgerError::InvalidQuantity(requested)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
