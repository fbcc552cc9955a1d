//! `ledgerly-alerts` — the alert/notification engine.
//!
//! Evaluates a tenant's condition→action rules against current financial
//! state and emits notifications or outbound webhook calls. Evaluation is
//! per-rule isolated: one malformed or failing rule never aborts its
//! siblings. Duplicate notifications are suppressed per period by a
//! content-based check (title/message substring within a time window).

pub mod context;
pub mod engine;
pub mod notification;
pub mod rule;
pub mod settings;
pub mod store;

pub use context::AlertContext;
pub use engine::{AlertEngine, EvaluationReport, RuleOutcome};
pub use notification::{DedupeWindow, Notification, NotificationId, Severity};
pub use rule::{AlertAction, AlertCondition, AlertRule, AlertRuleId, RawAlertRule, RuleEvaluationError};
pub use settings::{TenantSettings, UserNotificationPrefs};
pub use store::{AlertRuleStore, FinanceReader, NotificationStore, SettingsStore};
