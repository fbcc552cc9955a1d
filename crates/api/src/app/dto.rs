use chrono::{DateTime, Utc};
use serde::Deserialize;

use ledgerly_auth::RoleId;
use ledgerly_budgets::{Budget, BudgetStatus, Goal, progress_percent, utilization_percent};
use ledgerly_core::{AccountId, CategoryId, Money};
use ledgerly_ledger::{Account, AccountKind, TransactionKind};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub kind: AccountKind,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub kind: Option<AccountKind>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
    /// `kind` plus `to_account` for transfers; same shape the domain stores.
    #[serde(flatten)]
    pub kind: TransactionKind,
    /// Minor units.
    pub amount: Money,
    #[serde(default)]
    pub description: String,
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBudgetRequest {
    pub category_id: CategoryId,
    pub name: String,
    pub monthly_limit: Money,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBudgetRequest {
    pub name: Option<String>,
    pub monthly_limit: Option<Money>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGoalRequest {
    pub name: String,
    pub target: Money,
}

#[derive(Debug, Deserialize)]
pub struct ContributeRequest {
    pub amount: Money,
}

#[derive(Debug, Deserialize)]
pub struct CreateAlertRuleRequest {
    pub name: String,
    pub condition: serde_json::Value,
    pub action: serde_json::Value,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAlertRuleRequest {
    pub name: Option<String>,
    pub condition: Option<serde_json::Value>,
    pub action: Option<serde_json::Value>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateWebhookRequest {
    pub name: String,
    pub url: String,
    pub secret: String,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWebhookRequest {
    pub name: Option<String>,
    pub url: Option<String>,
    pub secret: Option<String>,
    pub events: Option<Vec<String>>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct InviteUserRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub role_id: RoleId,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role_id: RoleId,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePrefsRequest {
    pub notify_on_budget_exceeded: Option<bool>,
    pub notify_on_low_balance: Option<bool>,
    pub notify_on_goal_milestone: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub budget_warning_percent: Option<u32>,
    pub budget_critical_percent: Option<u32>,
    pub low_balance_threshold: Option<Money>,
}

fn default_true() -> bool {
    true
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn account_to_json(account: &Account, balance: Money) -> serde_json::Value {
    serde_json::json!({
        "id": account.id.to_string(),
        "name": account.name,
        "kind": account.kind,
        "balance": balance,
        "created_at": account.created_at,
    })
}

pub fn budget_to_json(budget: &Budget, spent: Money, status: BudgetStatus) -> serde_json::Value {
    serde_json::json!({
        "id": budget.id.to_string(),
        "category_id": budget.category_id.to_string(),
        "name": budget.name,
        "monthly_limit": budget.monthly_limit,
        "spent": spent,
        "utilization_percent": utilization_percent(spent, budget.monthly_limit),
        "status": status,
    })
}

pub fn goal_to_json(goal: &Goal) -> serde_json::Value {
    serde_json::json!({
        "id": goal.id.to_string(),
        "name": goal.name,
        "target": goal.target,
        "saved": goal.saved,
        "progress_percent": progress_percent(goal.saved, goal.target),
        "created_at": goal.created_at,
    })
}
