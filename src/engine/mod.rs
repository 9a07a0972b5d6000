//! Account engine — ledger state transitions, valuation, and history.

pub mod account;
pub mod history;

pub use account::Account;
pub use history::HistoryQuery;
