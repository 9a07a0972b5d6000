//! Integration tests: the ledger driven end to end through a
//! deterministic price source.

mod ledger;
mod mock_oracle;
