//! End-to-end ledger scenarios against the mock oracle.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use tradesim::engine::history::{replay_balance, HistoryQuery};
use tradesim::engine::Account;
use tradesim::types::{ErrorKind, LedgerError, TransactionKind};

use crate::mock_oracle::MockOracle;

fn onboarded(funding: Decimal) -> Account {
    let mut account = Account::new();
    account.onboard("Asha", funding).unwrap();
    account
}

/// Invariants every account must satisfy after any sequence of calls.
fn assert_invariants(account: &Account) {
    assert!(account.cash_balance() >= Decimal::ZERO);
    assert!(account.holdings().all(|h| h.quantity > 0));
    assert_eq!(replay_balance(account.transactions()), account.cash_balance());
    if let Some(last) = account.transactions().last() {
        assert_eq!(last.balance_after, account.cash_balance());
    }
}

#[test]
fn test_walkthrough_onboard_buy_sell() {
    let oracle = MockOracle::new();

    let mut account = Account::new();
    account.onboard("Asha", dec!(10000)).unwrap();
    assert_eq!(account.cash_balance(), dec!(10000));
    assert_eq!(account.cumulative_deposits(), dec!(10000));
    assert_eq!(account.transactions().len(), 1);
    assert_eq!(account.transactions()[0].kind, TransactionKind::Deposit);

    account.buy(&oracle, "COALINDIA", 10).unwrap();
    assert_eq!(account.cash_balance(), dec!(5500));
    let h = account.holding("COALINDIA").unwrap();
    assert_eq!((h.quantity, h.average_cost), (10, dec!(450)));

    account.buy(&oracle, "COALINDIA", 5).unwrap();
    assert_eq!(account.cash_balance(), dec!(3250));
    let h = account.holding("COALINDIA").unwrap();
    assert_eq!((h.quantity, h.average_cost), (15, dec!(450)));

    let receipt = account.sell(&oracle, "COALINDIA", 15).unwrap();
    assert_eq!(receipt.transaction.amount, dec!(6750));
    assert_eq!(account.cash_balance(), dec!(10000));
    assert!(account.holding("COALINDIA").is_none());

    let kinds: Vec<_> = account.transactions().iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TransactionKind::Deposit,
            TransactionKind::Buy,
            TransactionKind::Buy,
            TransactionKind::Sell
        ]
    );
    assert_eq!(oracle.lookups(), 3);
    assert_invariants(&account);
}

#[test]
fn test_withdraw_beyond_balance_rejected() {
    let mut account = onboarded(dec!(10000));
    let err = account.withdraw(dec!(20000)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    assert_eq!(account.cash_balance(), dec!(10000));
    assert_eq!(account.transactions().len(), 1);
}

#[test]
fn test_unknown_symbol_rejected_without_mutation() {
    let oracle = MockOracle::new();
    let mut account = onboarded(dec!(10000));

    let err = account.buy(&oracle, "UNKNOWN", 1).unwrap_err();
    assert_eq!(err, LedgerError::UnknownSymbol("UNKNOWN".into()));
    assert_eq!(account.cash_balance(), dec!(10000));
    assert_eq!(account.holdings().count(), 0);
    assert_eq!(account.transactions().len(), 1);
}

#[test]
fn test_deposit_withdraw_round_trip_keeps_deposits() {
    let mut account = onboarded(dec!(500));
    account.deposit(dec!(1234.56)).unwrap();
    account.withdraw(dec!(1234.56)).unwrap();

    assert_eq!(account.cash_balance(), dec!(500));
    assert_eq!(account.cumulative_deposits(), dec!(1734.56));
    assert_invariants(&account);
}

#[test]
fn test_buy_then_full_sell_restores_cash() {
    let oracle = MockOracle::new();
    let mut account = onboarded(dec!(5000));

    for symbol in ["COALINDIA", "MARICO", "ICICIAMC"] {
        let before = account.cash_balance();
        account.buy(&oracle, symbol, 3).unwrap();
        account.sell(&oracle, symbol, 3).unwrap();
        assert_eq!(account.cash_balance(), before);
        assert!(account.holding(symbol).is_none());
    }
    assert_invariants(&account);
}

#[test]
fn test_price_move_shows_in_summary() {
    let oracle = MockOracle::new();
    let mut account = onboarded(dec!(10000));
    account.buy(&oracle, "MARICO", 10).unwrap();

    oracle.set_price("MARICO", dec!(737));
    let summary = account.summarize(&oracle).unwrap();

    assert_eq!(summary.cash_balance, dec!(3300));
    assert_eq!(summary.market_value, dec!(7370));
    assert_eq!(summary.total_value, dec!(10670));
    assert_eq!(summary.total_pl, dec!(670));
    assert_eq!(summary.pl_percentage, dec!(6.7));
    assert_eq!(summary.holdings[0].unrealized_pl, dec!(670));
}

#[test]
fn test_sell_at_higher_price_realizes_gain() {
    let oracle = MockOracle::new();
    let mut account = onboarded(dec!(1000));
    account.buy(&oracle, "COALINDIA", 2).unwrap();

    oracle.set_price("COALINDIA", dec!(500));
    account.sell(&oracle, "COALINDIA", 1).unwrap();

    assert_eq!(account.cash_balance(), dec!(600));
    assert_eq!(account.holding("COALINDIA").unwrap().average_cost, dec!(450));

    let summary = account.summarize(&oracle).unwrap();
    assert_eq!(summary.total_value, dec!(1100));
    assert_eq!(summary.total_pl, dec!(100));
}

#[test]
fn test_delisted_holding_fails_valuation_closed() {
    let oracle = MockOracle::new();
    let mut account = onboarded(dec!(1000));
    account.buy(&oracle, "COALINDIA", 1).unwrap();

    oracle.delist("COALINDIA");
    let err = account.summarize(&oracle).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValuationError);

    let err = account.sell(&oracle, "COALINDIA", 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownSymbol);
    assert_eq!(account.holding("COALINDIA").unwrap().quantity, 1);
    assert_invariants(&account);
}

#[test]
fn test_outage_rejects_trades_atomically() {
    let oracle = MockOracle::new();
    let mut account = onboarded(dec!(5000));
    account.buy(&oracle, "MARICO", 1).unwrap();

    oracle.set_outage(true);
    assert!(account.buy(&oracle, "MARICO", 1).is_err());
    assert!(account.sell(&oracle, "MARICO", 1).is_err());
    assert_eq!(account.transactions().len(), 2);

    oracle.set_outage(false);
    account.sell(&oracle, "MARICO", 1).unwrap();
    assert_eq!(account.cash_balance(), dec!(5000));
}

#[test]
fn test_rejections_never_recorded() {
    let oracle = MockOracle::new();
    let mut account = Account::new();

    assert!(account.deposit(dec!(-5)).is_err());
    assert!(account.withdraw(dec!(1)).is_err());
    assert!(account.buy(&oracle, "COALINDIA", 1).is_err());
    assert!(account.sell(&oracle, "COALINDIA", 1).is_err());
    assert!(account.onboard("", dec!(10)).is_err());
    assert!(account.transactions().is_empty());

    account.onboard("Asha", dec!(10)).unwrap();
    assert!(account.onboard("Asha", dec!(10)).is_err());
    assert_eq!(account.transactions().len(), 1);
}

#[test]
fn test_mixed_sequence_preserves_invariants() {
    let oracle = MockOracle::new();
    let mut account = onboarded(dec!(20000));

    let steps: Vec<(&str, &str, i64)> = vec![
        ("buy", "COALINDIA", 7),
        ("buy", "ICICIAMC", 3),
        ("sell", "COALINDIA", 2),
        ("buy", "MARICO", 50),
        ("sell", "ICICIAMC", 4),
        ("sell", "ICICIAMC", 3),
        ("buy", "COALINDIA", 0),
        ("sell", "MARICO", 1),
        ("sell", "COALINDIA", 5),
    ];

    for (i, (op, symbol, qty)) in steps.into_iter().enumerate() {
        if i == 3 {
            oracle.set_price("COALINDIA", dec!(431.25));
        }
        let _ = match op {
            "buy" => account.buy(&oracle, symbol, qty),
            _ => account.sell(&oracle, symbol, qty),
        };
        assert_invariants(&account);
    }

    assert!(account.holding("COALINDIA").is_none());
    assert!(account.holding("ICICIAMC").is_none());
}

#[test]
fn test_literal_cost_basis_ignores_withdrawals() {
    let mut account = onboarded(dec!(1000));
    account.deposit(dec!(1000)).unwrap();
    account.withdraw(dec!(1000)).unwrap();

    let summary = account.summarize(&MockOracle::new()).unwrap();
    assert_eq!(summary.total_value, dec!(1000));
    assert_eq!(summary.cumulative_deposits, dec!(2000));
    assert_eq!(summary.net_contributions, dec!(1000));
    // Nothing was lost, yet P/L reads -50% against cumulative deposits.
    assert_eq!(summary.total_pl, dec!(-1000));
    assert_eq!(summary.pl_percentage, dec!(-50));
}

#[test]
fn test_history_query_over_session() {
    let oracle = MockOracle::new();
    let mut account = onboarded(dec!(5000));
    account.buy(&oracle, "MARICO", 1).unwrap();
    account.buy(&oracle, "COALINDIA", 1).unwrap();
    account.sell(&oracle, "MARICO", 1).unwrap();

    let marico = HistoryQuery::default()
        .symbol("MARICO")
        .apply(account.transactions());
    assert_eq!(marico.len(), 2);
    assert_eq!(marico[0].kind, TransactionKind::Sell);
    assert_eq!(marico[1].kind, TransactionKind::Buy);
}
