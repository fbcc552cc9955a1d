//! `ledgerly-budgets` — monthly budgets and savings goals.
//!
//! Pure classification arithmetic; the alert engine feeds it current spend
//! and tenant thresholds and acts on the results.

pub mod budget;
pub mod goal;

pub use budget::{Budget, BudgetId, BudgetStatus, utilization_percent};
pub use goal::{Goal, GoalId, MILESTONES, milestones_crossed, progress_percent};
