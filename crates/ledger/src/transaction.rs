use core::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ledgerly_core::{AccountId, CategoryId, Entity, Money, TenantId};

/// Unique identifier for a transaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Direction/shape of a transaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
    /// Outgoing transfer from this transaction's account into `to_account`.
    Transfer { to_account: AccountId },
}

/// A single ledger entry. `amount` is always non-negative; direction comes
/// from `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub tenant_id: TenantId,
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
    #[serde(flatten)]
    pub kind: TransactionKind,
    pub amount: Money,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Computed balance of `account_id` over a transaction set:
/// income − expense + transfers-in − transfers-out.
pub fn account_balance(account_id: AccountId, transactions: &[Transaction]) -> Money {
    let mut balance = Money::ZERO;
    for tx in transactions {
        match tx.kind {
            TransactionKind::Income if tx.account_id == account_id => {
                balance = balance.saturating_add(tx.amount);
            }
            TransactionKind::Expense if tx.account_id == account_id => {
                balance = balance.saturating_sub(tx.amount);
            }
            TransactionKind::Transfer { to_account } => {
                if tx.account_id == account_id {
                    balance = balance.saturating_sub(tx.amount);
                }
                if to_account == account_id {
                    balance = balance.saturating_add(tx.amount);
                }
            }
            _ => {}
        }
    }
    balance
}

/// True when `a` and `b` fall in the same calendar month (UTC).
pub fn same_calendar_month(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Sum of expense transactions in `category_id` within the calendar month of
/// `reference`.
pub fn month_category_spend(
    category_id: CategoryId,
    reference: DateTime<Utc>,
    transactions: &[Transaction],
) -> Money {
    transactions
        .iter()
        .filter(|tx| {
            matches!(tx.kind, TransactionKind::Expense)
                && tx.category_id == Some(category_id)
                && same_calendar_month(tx.occurred_at, reference)
        })
        .map(|tx| tx.amount)
        .sum()
}
