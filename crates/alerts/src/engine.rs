//! Rule evaluation and periodic notification checks.
//!
//! Each engine run takes every active rule of the tenant through
//! pending → evaluated → {triggered → action-dispatched, not-triggered}.
//! Nothing is cached across runs; the only persisted state is each rule's
//! `last_triggered`/`trigger_count` and the notifications themselves.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use ledgerly_core::TenantId;
use ledgerly_ledger::TransactionKind;
use ledgerly_webhooks::{OutboundWebhook, WebhookPublisher, WebhookSender};

use crate::context::AlertContext;
use crate::notification::{DedupeWindow, Notification, Severity};
use crate::rule::{AlertAction, AlertCondition, AlertRule, AlertRuleId, RuleEvaluationError};
use crate::store::{AlertRuleStore, FinanceReader, NotificationStore, SettingsStore};

/// Terminal state of one rule within an engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    NotTriggered,
    /// Condition matched and the action was dispatched (delivery itself is
    /// best-effort and may still have failed).
    Triggered,
    /// Malformed or unevaluable rule; logged and skipped.
    Skipped(RuleEvaluationError),
}

#[derive(Debug, Default)]
pub struct EvaluationReport {
    pub outcomes: Vec<(AlertRuleId, RuleOutcome)>,
}

impl EvaluationReport {
    pub fn evaluated(&self) -> usize {
        self.outcomes.len()
    }

    pub fn triggered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, RuleOutcome::Triggered))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, RuleOutcome::Skipped(_)))
            .count()
    }
}

/// The alert/notification engine. Stateless across calls; safe to share.
pub struct AlertEngine {
    rules: Arc<dyn AlertRuleStore>,
    notifications: Arc<dyn NotificationStore>,
    finance: Arc<dyn FinanceReader>,
    settings: Arc<dyn SettingsStore>,
    sender: Arc<dyn WebhookSender>,
    publisher: Arc<WebhookPublisher>,
}

impl AlertEngine {
    pub fn new(
        rules: Arc<dyn AlertRuleStore>,
        notifications: Arc<dyn NotificationStore>,
        finance: Arc<dyn FinanceReader>,
        settings: Arc<dyn SettingsStore>,
        sender: Arc<dyn WebhookSender>,
        publisher: Arc<WebhookPublisher>,
    ) -> Self {
        Self {
            rules,
            notifications,
            finance,
            settings,
            sender,
            publisher,
        }
    }

    /// Evaluate all active rules for a tenant, optionally against a
    /// triggering event context. One rule's failure never aborts the rest.
    pub async fn evaluate(
        &self,
        tenant_id: TenantId,
        ctx: Option<&AlertContext>,
    ) -> EvaluationReport {
        let now = Utc::now();
        let mut report = EvaluationReport::default();

        for raw in self.rules.active_rules(tenant_id) {
            let rule_id = raw.id;
            let outcome = match raw.decode() {
                Ok(rule) => match self.condition_matches(&rule, ctx, now) {
                    Ok(false) => RuleOutcome::NotTriggered,
                    Ok(true) => {
                        // Triggering means "condition matched": bookkeeping
                        // happens before and regardless of action delivery.
                        self.rules.record_trigger(tenant_id, rule.id, now);
                        self.dispatch(&rule, ctx, now).await;
                        RuleOutcome::Triggered
                    }
                    Err(e) => RuleOutcome::Skipped(e),
                },
                Err(e) => RuleOutcome::Skipped(e),
            };

            if let RuleOutcome::Skipped(e) = &outcome {
                tracing::warn!(%tenant_id, %rule_id, error = %e, "alert rule skipped");
            }
            report.outcomes.push((rule_id, outcome));
        }

        report
    }

    fn condition_matches(
        &self,
        rule: &AlertRule,
        ctx: Option<&AlertContext>,
        now: DateTime<Utc>,
    ) -> Result<bool, RuleEvaluationError> {
        match &rule.condition {
            AlertCondition::AmountAbove { value } => Ok(ctx
                .and_then(|c| c.transaction_amount)
                .is_some_and(|amount| amount > *value)),

            AlertCondition::IncomeReceived => Ok(ctx
                .and_then(|c| c.transaction_kind)
                .is_some_and(|kind| matches!(kind, TransactionKind::Income))),

            AlertCondition::CategorySpendExceeds { category_id, value } => {
                let spend = self
                    .finance
                    .month_category_spend(rule.tenant_id, *category_id, now)
                    .ok_or_else(|| RuleEvaluationError::UnknownCategory {
                        name: rule.name.clone(),
                        category_id: *category_id,
                    })?;
                Ok(spend > *value)
            }

            AlertCondition::BalanceBelow { value } => {
                let Some(account_id) = ctx.and_then(|c| c.account_id) else {
                    return Ok(false);
                };
                let balance = self
                    .finance
                    .account_balance(rule.tenant_id, account_id)
                    .ok_or_else(|| RuleEvaluationError::UnknownAccount {
                        name: rule.name.clone(),
                        account_id,
                    })?;
                Ok(balance < *value)
            }
        }
    }

    async fn dispatch(&self, rule: &AlertRule, ctx: Option<&AlertContext>, now: DateTime<Utc>) {
        match &rule.action {
            AlertAction::CreateNotification => {
                let notification = Notification::new(
                    rule.tenant_id,
                    None,
                    format!("Alert: {}", rule.name),
                    format!("Alert rule \"{}\" was triggered.", rule.name),
                    Severity::Warning,
                )
                .with_link("/alerts");
                self.insert_and_announce(notification).await;
            }

            AlertAction::SendWebhook { url } => {
                let payload = serde_json::json!({
                    "alert": rule.name,
                    "condition": rule.condition,
                    "context": ctx,
                    "triggeredAt": now.to_rfc3339_opts(SecondsFormat::Millis, true),
                });
                let outbound = OutboundWebhook {
                    url: url.clone(),
                    event: None,
                    signature: None,
                    body: payload.to_string(),
                };
                if let Err(e) = self.sender.send(outbound).await {
                    tracing::debug!(
                        rule = %rule.name,
                        error = %e,
                        "alert webhook delivery failed (best-effort, not retried)"
                    );
                }
            }
        }
    }

    async fn insert_and_announce(&self, notification: Notification) {
        let tenant_id = notification.tenant_id;
        let data = match serde_json::to_value(&notification) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::error!(error = %e, "notification payload failed to serialize");
                None
            }
        };
        self.notifications.insert(notification);
        // Registered webhooks get the full payload or nothing at all.
        if let Some(data) = data {
            self.publisher
                .publish(tenant_id, "notification.created", data)
                .await;
        }
    }

    /// Periodic checks: budget warning/critical, low balance, goal
    /// milestones. Each emission is dedupe-suppressed within its window, so
    /// running this endpoint repeatedly within a period is idempotent while
    /// distinct milestones still each emit once.
    ///
    /// Returns the number of notifications created.
    pub async fn run_periodic_checks(&self, tenant_id: TenantId) -> usize {
        let now = Utc::now();
        let settings = self.settings.tenant_settings(tenant_id);
        let recipients = self.settings.recipients(tenant_id);
        let mut created = 0;

        for budget in self.finance.budgets(tenant_id) {
            let Some(spent) = self
                .finance
                .month_category_spend(tenant_id, budget.category_id, now)
            else {
                continue;
            };
            let pct = ledgerly_budgets::utilization_percent(spent, budget.monthly_limit);
            let status = budget.status(
                spent,
                settings.budget_warning_percent,
                settings.budget_critical_percent,
            );

            let (title, message, severity) = match status {
                ledgerly_budgets::BudgetStatus::Ok => continue,
                ledgerly_budgets::BudgetStatus::Warning => (
                    "Budget warning",
                    format!(
                        "Budget \"{}\" is at {pct}% of its monthly limit",
                        budget.name
                    ),
                    Severity::Warning,
                ),
                ledgerly_budgets::BudgetStatus::Critical => (
                    "Budget exceeded",
                    format!(
                        "Budget \"{}\" has reached {pct}% of its monthly limit",
                        budget.name
                    ),
                    Severity::Critical,
                ),
            };

            for user_id in &recipients {
                if !self
                    .settings
                    .user_prefs(tenant_id, *user_id)
                    .notify_on_budget_exceeded
                {
                    continue;
                }
                if self.notifications.exists_similar(
                    tenant_id,
                    Some(*user_id),
                    title,
                    &format!("Budget \"{}\"", budget.name),
                    DedupeWindow::CalendarMonth,
                    now,
                ) {
                    continue;
                }
                let n = Notification::new(tenant_id, Some(*user_id), title, message.clone(), severity)
                    .with_link("/budgets");
                self.insert_and_announce(n).await;
                created += 1;
            }
        }

        for account in self.finance.accounts(tenant_id) {
            let Some(balance) = self.finance.account_balance(tenant_id, account.id) else {
                continue;
            };
            if balance >= settings.low_balance_threshold {
                continue;
            }
            let message = format!(
                "Account \"{}\" balance {balance} is below your low-balance threshold",
                account.name
            );

            for user_id in &recipients {
                if !self
                    .settings
                    .user_prefs(tenant_id, *user_id)
                    .notify_on_low_balance
                {
                    continue;
                }
                if self.notifications.exists_similar(
                    tenant_id,
                    Some(*user_id),
                    "Low balance",
                    &format!("Account \"{}\"", account.name),
                    DedupeWindow::Last24Hours,
                    now,
                ) {
                    continue;
                }
                let n = Notification::new(
                    tenant_id,
                    Some(*user_id),
                    "Low balance",
                    message.clone(),
                    Severity::Warning,
                )
                .with_link("/accounts");
                self.insert_and_announce(n).await;
                created += 1;
            }
        }

        for goal in self.finance.goals(tenant_id) {
            let pct = ledgerly_budgets::progress_percent(goal.saved, goal.target);
            for milestone in ledgerly_budgets::MILESTONES {
                if pct < milestone {
                    break;
                }
                let message = format!(
                    "Goal \"{}\" reached {milestone}% of its target",
                    goal.name
                );

                for user_id in &recipients {
                    if !self
                        .settings
                        .user_prefs(tenant_id, *user_id)
                        .notify_on_goal_milestone
                    {
                        continue;
                    }
                    // The milestone percentage is part of the matched
                    // fragment, so 25/50/75/100 each emit independently.
                    if self.notifications.exists_similar(
                        tenant_id,
                        Some(*user_id),
                        "Goal milestone",
                        &format!("Goal \"{}\" reached {milestone}%", goal.name),
                        DedupeWindow::CalendarMonth,
                        now,
                    ) {
                        continue;
                    }
                    let n = Notification::new(
                        tenant_id,
                        Some(*user_id),
                        "Goal milestone",
                        message.clone(),
                        Severity::Info,
                    )
                    .with_link("/goals");
                    self.insert_and_announce(n).await;
                    created += 1;
                }
            }
        }

        created
    }
}
