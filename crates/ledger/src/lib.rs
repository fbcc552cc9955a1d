//! `ledgerly-ledger` — accounts and transactions domain.
//!
//! Pure data + arithmetic; no storage or transport concerns. Balances and
//! category spend are always computed from the transaction set, never stored.

pub mod account;
pub mod category;
pub mod transaction;

pub use account::{Account, AccountKind};
pub use category::Category;
pub use transaction::{
    Transaction, TransactionId, TransactionKind, account_balance, month_category_spend,
    same_calendar_month,
};
