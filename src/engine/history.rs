//! Transaction history queries and balance replay.

use rust_decimal::Decimal;

use crate::types::{BalancePoint, Transaction, TransactionKind};

/// Filter and ordering for the history table. Newest first by default.
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    pub kind: Option<TransactionKind>,
    pub symbol: Option<String>,
    pub newest_first: bool,
    pub limit: Option<usize>,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            kind: None,
            symbol: None,
            newest_first: true,
            limit: None,
        }
    }
}

impl HistoryQuery {
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn symbol(mut self, symbol: &str) -> Self {
        self.symbol = Some(symbol.to_string());
        self
    }

    pub fn oldest_first(mut self) -> Self {
        self.newest_first = false;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, tx: &Transaction) -> bool {
        self.kind.is_none_or(|k| tx.kind == k)
            && self
                .symbol
                .as_deref()
                .is_none_or(|s| tx.symbol.as_deref() == Some(s))
    }

    /// Matching transactions as owned copies, ordered and truncated.
    pub fn apply(&self, transactions: &[Transaction]) -> Vec<Transaction> {
        let filtered = transactions.iter().filter(|tx| self.matches(tx));
        let limit = self.limit.unwrap_or(usize::MAX);
        if self.newest_first {
            filtered.rev().take(limit).cloned().collect()
        } else {
            filtered.take(limit).cloned().collect()
        }
    }
}

/// Rebuild the cash balance from signed amounts.
pub fn replay_balance(transactions: &[Transaction]) -> Decimal {
    transactions.iter().map(|tx| tx.amount).sum()
}

/// Balance after each event, oldest first.
pub fn balance_history(transactions: &[Transaction]) -> Vec<BalancePoint> {
    transactions
        .iter()
        .map(|tx| BalancePoint {
            timestamp: tx.timestamp,
            balance: tx.balance_after,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
