use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ledgerly_core::{CategoryId, Entity, Money, TenantId};

/// Unique identifier for a budget.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BudgetId(Uuid);

impl BudgetId {
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

impl Default for BudgetId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for BudgetId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BudgetId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// A per-category spending limit, applied per calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub tenant_id: TenantId,
    pub category_id: CategoryId,
    pub name: String,
    pub monthly_limit: Money,
}

impl Entity for Budget {
    type Id = BudgetId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Classification of a budget against tenant thresholds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    Ok,
    Warning,
    Critical,
}

/// Percentage of the limit consumed, clamped to `[0, u32::MAX]`.
///
/// A non-positive limit reads as fully consumed: a zero budget with any spend
/// is over it.
pub fn utilization_percent(spent: Money, limit: Money) -> u32 {
    if limit.minor_units() <= 0 {
        return if spent.minor_units() > 0 { u32::MAX } else { 0 };
    }
    let spent = spent.minor_units().max(0) as i128;
    let pct = spent * 100 / limit.minor_units() as i128;
    pct.clamp(0, u32::MAX as i128) as u32
}

impl Budget {
    /// Classify this month's spend. Thresholds are inclusive: sitting exactly
    /// at the critical percentage is critical.
    pub fn status(&self, spent: Money, warning_percent: u32, critical_percent: u32) -> BudgetStatus {
        let pct = utilization_percent(spent, self.monthly_limit);
        if pct >= critical_percent {
            BudgetStatus::Critical
        } else if pct >= warning_percent {
            BudgetStatus::Warning
        } else {
            BudgetStatus::Ok
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn budget(limit: i64) -> Budget {
        Budget {
            id: BudgetId::new(),
            tenant_id: TenantId::new(),
            category_id: CategoryId::new(),
            name: "groceries".into(),
            monthly_limit: Money::from_minor_units(limit),
        }
    }

    #[test]
    fn exactly_at_critical_threshold_is_critical() {
        let b = budget(10_000);
        let status = b.status(Money::from_minor_units(10_000), 80, 100);
        assert_eq!(status, BudgetStatus::Critical);
    }

    #[test]
    fn between_warning_and_critical_is_warning() {
        let b = budget(10_000);
        assert_eq!(b.status(Money::from_minor_units(8_500), 80, 100), BudgetStatus::Warning);
        assert_eq!(b.status(Money::from_minor_units(7_900), 80, 100), BudgetStatus::Ok);
    }

    proptest! {
        /// Status is monotone in spend: more spend never lowers the status.
        #[test]
        fn status_is_monotone_in_spend(spend_a in 0i64..1_000_000, spend_b in 0i64..1_000_000) {
            let b = budget(50_000);
            let (lo, hi) = if spend_a <= spend_b { (spend_a, spend_b) } else { (spend_b, spend_a) };
            let rank = |s: BudgetStatus| match s {
                BudgetStatus::Ok => 0,
                BudgetStatus::Warning => 1,
                BudgetStatus::Critical => 2,
            };
            let lo_status = b.status(Money::from_minor_units(lo), 80, 100);
            let hi_status = b.status(Money::from_minor_units(hi), 80, 100);
            prop_assert!(rank(lo_status) <= rank(hi_status));
        }
    }
}
