//! Evaluation context: the event (if any) that triggered this engine run.

use serde::{Deserialize, Serialize};

use ledgerly_core::{AccountId, CategoryId, Money};
use ledgerly_ledger::TransactionKind;

/// Context from a triggering event (e.g. a transaction just created).
///
/// All fields optional: a bare "check" run carries none of them, and
/// context-dependent conditions simply don't match then.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertContext {
    pub transaction_amount: Option<Money>,
    pub transaction_kind: Option<TransactionKind>,
    pub category_id: Option<CategoryId>,
    pub account_id: Option<AccountId>,
}

impl AlertContext {
    /// Context for a just-recorded transaction.
    pub fn for_transaction(tx: &ledgerly_ledger::Transaction) -> Self {
        Self {
            transaction_amount: Some(tx.amount),
            transaction_kind: Some(tx.kind),
            category_id: tx.category_id,
            account_id: Some(tx.account_id),
        }
    }
}
