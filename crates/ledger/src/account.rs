use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledgerly_core::{AccountId, Entity, TenantId};

/// Kind of financial account.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Checking,
    Savings,
    Credit,
    Cash,
    Investment,
}

/// A financial account within one tenant.
///
/// Balance is not a field: it is derived from the transaction set
/// (income − expense + transfers-in − transfers-out).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub tenant_id: TenantId,
    pub name: String,
    pub kind: AccountKind,
    pub created_at: DateTime<Utc>,
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
