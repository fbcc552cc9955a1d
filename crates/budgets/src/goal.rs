use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ledgerly_core::{Entity, Money, TenantId};

/// Unique identifier for a savings goal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(Uuid);

impl GoalId {
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

impl Default for GoalId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for GoalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GoalId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Milestone percentages a goal reports on, each independently and at most
/// once per crossing.
pub const MILESTONES: [u32; 4] = [25, 50, 75, 100];

/// A savings goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub tenant_id: TenantId,
    pub name: String,
    pub target: Money,
    pub saved: Money,
    pub created_at: DateTime<Utc>,
}

impl Entity for Goal {
    type Id = GoalId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Percentage of `target` reached by `saved`, clamped at 0 below and
/// uncapped above 100 (over-saving reads as >100%).
pub fn progress_percent(saved: Money, target: Money) -> u32 {
    if target.minor_units() <= 0 {
        return 0;
    }
    let saved = saved.minor_units().max(0) as i128;
    let pct = saved * 100 / target.minor_units() as i128;
    pct.clamp(0, u32::MAX as i128) as u32
}

/// Milestones newly crossed when saved moves from `before` to `after`.
///
/// A milestone is crossed when the progress percentage reaches it for the
/// first time; a contribution jumping several milestones reports all of them.
pub fn milestones_crossed(before: Money, after: Money, target: Money) -> Vec<u32> {
    let prev = progress_percent(before, target);
    let now = progress_percent(after, target);
    MILESTONES
        .into_iter()
        .filter(|m| prev < *m && now >= *m)
        .collect()
}

impl Goal {
    /// Record a contribution, returning newly crossed milestones.
    pub fn contribute(&mut self, amount: Money) -> Vec<u32> {
        let before = self.saved;
        self.saved = self.saved.saturating_add(amount);
        milestones_crossed(before, self.saved, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn goal(target: i64, saved: i64) -> Goal {
        Goal {
            id: GoalId::new(),
            tenant_id: TenantId::new(),
            name: "emergency fund".into(),
            target: Money::from_minor_units(target),
            saved: Money::from_minor_units(saved),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn sequential_contributions_report_each_milestone_once() {
        let mut g = goal(10_000, 0);
        assert_eq!(g.contribute(Money::from_minor_units(2_500)), vec![25]);
        assert_eq!(g.contribute(Money::from_minor_units(2_500)), vec![50]);
        assert_eq!(g.contribute(Money::from_minor_units(5_000)), vec![75, 100]);
        assert_eq!(g.contribute(Money::from_minor_units(1_000)), Vec::<u32>::new());
    }

    #[test]
    fn zero_target_never_reports_milestones() {
        let mut g = goal(0, 0);
        assert!(g.contribute(Money::from_minor_units(1_000)).is_empty());
    }

    proptest! {
        /// Across any contribution sequence, each milestone is reported at
        /// most once, in ascending order.
        #[test]
        fn milestones_are_unique_across_a_sequence(
            contributions in proptest::collection::vec(1i64..5_000, 1..30)
        ) {
            let mut g = goal(10_000, 0);
            let mut seen = Vec::new();
            for c in contributions {
                for m in g.contribute(Money::from_minor_units(c)) {
                    prop_assert!(!seen.contains(&m), "milestone {m} reported twice");
                    if let Some(last) = seen.last() {
                        prop_assert!(*last < m);
                    }
                    seen.push(m);
                }
            }
        }
    }
}
