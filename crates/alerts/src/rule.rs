//! Alert rules: typed condition/action unions and the raw storage shape.
//!
//! Conditions and actions are persisted as JSON blobs; [`RawAlertRule::decode`]
//! validates them at the storage boundary and surfaces a typed
//! [`RuleEvaluationError`] on malformed data instead of silently
//! misinterpreting fields.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use ledgerly_core::{AccountId, CategoryId, Entity, Money, TenantId};

/// Unique identifier for an alert rule.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertRuleId(Uuid);

impl AlertRuleId {
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

impl Default for AlertRuleId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for AlertRuleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AlertRuleId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// When a rule triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertCondition {
    /// Triggering transaction's amount exceeds `value`.
    AmountAbove { value: Money },
    /// Triggering transaction is income (always matches when one is present).
    IncomeReceived,
    /// This month's expense total in `category_id` exceeds `value`.
    CategorySpendExceeds { category_id: CategoryId, value: Money },
    /// The triggering account's computed balance is below `value`.
    BalanceBelow { value: Money },
}

/// What a triggered rule does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertAction {
    /// Insert a tenant-scoped notification referencing the rule name.
    CreateNotification,
    /// POST `{alert, condition, context, triggeredAt}` to `url`, best-effort.
    SendWebhook { url: String },
}

/// A tenant's condition→action rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: AlertRuleId,
    pub tenant_id: TenantId,
    pub name: String,
    pub condition: AlertCondition,
    pub action: AlertAction,
    pub active: bool,
    pub last_triggered: Option<DateTime<Utc>>,
    pub trigger_count: u64,
}

impl Entity for AlertRule {
    type Id = AlertRuleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AlertRule {
    /// Serialize into the raw storage shape (condition/action as JSON blobs).
    pub fn into_raw(self) -> RawAlertRule {
        RawAlertRule {
            id: self.id,
            tenant_id: self.tenant_id,
            name: self.name,
            // Serialization of a closed enum cannot fail.
            condition: serde_json::to_value(&self.condition).unwrap_or(serde_json::Value::Null),
            action: serde_json::to_value(&self.action).unwrap_or(serde_json::Value::Null),
            active: self.active,
            last_triggered: self.last_triggered,
            trigger_count: self.trigger_count,
        }
    }
}

/// Malformed or unevaluable rule data. Logged and skipped, never surfaced to
/// the end user, never aborts sibling rule evaluation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleEvaluationError {
    #[error("rule '{name}' has a malformed condition: {detail}")]
    MalformedCondition { name: String, detail: String },

    #[error("rule '{name}' has a malformed action: {detail}")]
    MalformedAction { name: String, detail: String },

    #[error("rule '{name}' references unknown category {category_id}")]
    UnknownCategory { name: String, category_id: CategoryId },

    #[error("rule '{name}' references unknown account {account_id}")]
    UnknownAccount { name: String, account_id: AccountId },
}

/// The rule as it sits in storage: condition/action are loosely-typed JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAlertRule {
    pub id: AlertRuleId,
    pub tenant_id: TenantId,
    pub name: String,
    pub condition: serde_json::Value,
    pub action: serde_json::Value,
    pub active: bool,
    pub last_triggered: Option<DateTime<Utc>>,
    pub trigger_count: u64,
}

impl RawAlertRule {
    /// Validate and decode into the typed rule.
    pub fn decode(self) -> Result<AlertRule, RuleEvaluationError> {
        let condition: AlertCondition = serde_json::from_value(self.condition).map_err(|e| {
            RuleEvaluationError::MalformedCondition {
                name: self.name.clone(),
                detail: e.to_string(),
            }
        })?;
        let action: AlertAction = serde_json::from_value(self.action).map_err(|e| {
            RuleEvaluationError::MalformedAction {
                name: self.name.clone(),
                detail: e.to_string(),
            }
        })?;
        Ok(AlertRule {
            id: self.id,
            tenant_id: self.tenant_id,
            name: self.name,
            condition,
            action,
            active: self.active,
            last_triggered: self.last_triggered,
            trigger_count: self.trigger_count,
        })
    }
}
