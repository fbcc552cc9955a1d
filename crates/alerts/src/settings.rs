//! Tenant thresholds and per-user notification preferences.
//!
//! Read-only inputs to the engine.

use serde::{Deserialize, Serialize};

use ledgerly_core::{Money, TenantId};

/// Per-tenant alerting thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSettings {
    pub tenant_id: TenantId,
    /// Budget utilization percentage that reads as a warning.
    pub budget_warning_percent: u32,
    /// Budget utilization percentage that reads as critical/exceeded.
    pub budget_critical_percent: u32,
    /// Account balances below this emit low-balance notifications.
    pub low_balance_threshold: Money,
}

impl TenantSettings {
    pub fn defaults(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            budget_warning_percent: 80,
            budget_critical_percent: 100,
            low_balance_threshold: Money::from_minor_units(10_000),
        }
    }
}

/// Per-user opt-out flags. All enabled by default.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNotificationPrefs {
    pub notify_on_budget_exceeded: bool,
    pub notify_on_low_balance: bool,
    pub notify_on_goal_milestone: bool,
}

impl Default for UserNotificationPrefs {
    fn default() -> Self {
        Self {
            notify_on_budget_exceeded: true,
            notify_on_low_balance: true,
            notify_on_goal_milestone: true,
        }
    }
}
