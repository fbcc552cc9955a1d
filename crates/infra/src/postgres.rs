//! Postgres-backed notification storage.
//!
//! Implements the [`NotificationStore`] port over a sqlx connection pool.
//! Every query includes `tenant_id` in the WHERE clause, so cross-tenant
//! access is impossible at the storage layer. The duplicate check pushes the
//! substring-within-window predicate into SQL.
//!
//! The port is synchronous; queries are driven through [`run_query`], which
//! requires the multi-thread tokio runtime.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use sqlx::{PgPool, Row};

use ledgerly_alerts::{DedupeWindow, Notification, NotificationId, NotificationStore, Severity};
use ledgerly_core::{TenantId, UserId};

pub struct PostgresNotificationStore {
    pool: Arc<PgPool>,
}

impl PostgresNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }
}

/// Drives `future` to completion from the synchronous port methods.
///
/// The calling worker is parked as a blocking thread before re-entering the
/// runtime, so the insert path stays safe when the engine calls the store
/// from async context. Requires the multi-thread runtime; outside any
/// runtime the query is dropped and `None` returned.
fn run_query<F: Future>(future: F) -> Option<F::Output> {
    let handle = tokio::runtime::Handle::try_current().ok()?;
    Some(tokio::task::block_in_place(move || handle.block_on(future)))
}

fn severity_to_str(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Critical => "critical",
    }
}

fn severity_from_str(s: &str) -> Severity {
    match s {
        "critical" => Severity::Critical,
        "warning" => Severity::Warning,
        _ => Severity::Info,
    }
}

/// Earliest `created_at` that still counts as "within the window" of `now`.
fn window_start(window: DedupeWindow, now: DateTime<Utc>) -> DateTime<Utc> {
    match window {
        DedupeWindow::CalendarMonth => Utc
            .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
            .single()
            .unwrap_or(now),
        DedupeWindow::Last24Hours => now - Duration::hours(24),
    }
}

fn row_to_notification(row: &sqlx::postgres::PgRow) -> Option<Notification> {
    let id = row.try_get::<uuid::Uuid, _>("id").ok()?;
    let tenant_id = row.try_get::<uuid::Uuid, _>("tenant_id").ok()?;
    let user_id = row.try_get::<Option<uuid::Uuid>, _>("user_id").ok()?;
    let title = row.try_get::<String, _>("title").ok()?;
    let message = row.try_get::<String, _>("message").ok()?;
    let severity = row.try_get::<String, _>("severity").ok()?;
    let read = row.try_get::<bool, _>("read").ok()?;
    let link = row.try_get::<Option<String>, _>("link").ok()?;
    let created_at = row.try_get::<DateTime<Utc>, _>("created_at").ok()?;

    Some(Notification {
        id: NotificationId::from_uuid(id),
        tenant_id: TenantId::from_uuid(tenant_id),
        user_id: user_id.map(UserId::from_uuid),
        title,
        message,
        severity: severity_from_str(&severity),
        read,
        link,
        created_at,
    })
}

impl NotificationStore for PostgresNotificationStore {
    fn insert(&self, notification: Notification) {
        let pool = self.pool.clone();
        run_query(async move {
            let result = sqlx::query(
                r#"
                INSERT INTO notifications (
                    id,
                    tenant_id,
                    user_id,
                    title,
                    message,
                    severity,
                    read,
                    link,
                    created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(notification.id.as_uuid())
            .bind(notification.tenant_id.as_uuid())
            .bind(notification.user_id.as_ref().map(|u| *u.as_uuid()))
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(severity_to_str(notification.severity))
            .bind(notification.read)
            .bind(&notification.link)
            .bind(notification.created_at)
            .execute(&*pool)
            .await;

            if let Err(e) = result {
                tracing::error!(error = %e, "failed to insert notification");
            }
        });
    }

    fn list(&self, tenant_id: TenantId) -> Vec<Notification> {
        let pool = self.pool.clone();
        let tenant_uuid = *tenant_id.as_uuid();
        run_query(async move {
            match sqlx::query(
                r#"
                SELECT id, tenant_id, user_id, title, message, severity, read, link, created_at
                FROM notifications
                WHERE tenant_id = $1
                ORDER BY created_at DESC
                "#,
            )
            .bind(tenant_uuid)
            .fetch_all(&*pool)
            .await
            {
                Ok(rows) => rows.iter().filter_map(row_to_notification).collect(),
                Err(e) => {
                    tracing::error!(error = %e, "failed to list notifications");
                    vec![]
                }
            }
        })
        .unwrap_or_default()
    }

    fn mark_read(&self, tenant_id: TenantId, id: NotificationId) -> bool {
        let pool = self.pool.clone();
        let tenant_uuid = *tenant_id.as_uuid();
        let id_uuid = *id.as_uuid();
        run_query(async move {
            match sqlx::query(
                "UPDATE notifications SET read = TRUE WHERE tenant_id = $1 AND id = $2",
            )
            .bind(tenant_uuid)
            .bind(id_uuid)
            .execute(&*pool)
            .await
            {
                Ok(done) => done.rows_affected() > 0,
                Err(e) => {
                    tracing::error!(error = %e, "failed to mark notification read");
                    false
                }
            }
        })
        .unwrap_or(false)
    }

    fn exists_similar(
        &self,
        tenant_id: TenantId,
        user_id: Option<UserId>,
        title_fragment: &str,
        message_fragment: &str,
        window: DedupeWindow,
        now: DateTime<Utc>,
    ) -> bool {
        let pool = self.pool.clone();
        let tenant_uuid = *tenant_id.as_uuid();
        let user_uuid = user_id.as_ref().map(|u| *u.as_uuid());
        let title_fragment = title_fragment.to_string();
        let message_fragment = message_fragment.to_string();
        let since = window_start(window, now);
        run_query(async move {
            match sqlx::query(
                r#"
                SELECT 1 AS one
                FROM notifications
                WHERE tenant_id = $1
                  AND user_id IS NOT DISTINCT FROM $2
                  AND title LIKE '%' || $3 || '%'
                  AND message LIKE '%' || $4 || '%'
                  AND created_at >= $5
                  AND created_at <= $6
                LIMIT 1
                "#,
            )
            .bind(tenant_uuid)
            .bind(user_uuid)
            .bind(&title_fragment)
            .bind(&message_fragment)
            .bind(since)
            .bind(now)
            .fetch_optional(&*pool)
            .await
            {
                Ok(row) => row.is_some(),
                Err(e) => {
                    tracing::error!(error = %e, "failed to run notification duplicate check");
                    false
                }
            }
        })
        .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_month_window_starts_at_the_first() {
        let now = Utc.with_ymd_and_hms(2026, 3, 15, 12, 30, 0).unwrap();
        let start = window_start(DedupeWindow::CalendarMonth, now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn last_24_hours_window_is_rolling() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 6, 0, 0).unwrap();
        let start = window_start(DedupeWindow::Last24Hours, now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 2, 28, 6, 0, 0).unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn queries_run_to_completion_from_async_context() {
        assert_eq!(run_query(async { 21 * 2 }), Some(42));
    }

    #[test]
    fn queries_are_dropped_outside_a_runtime() {
        assert_eq!(run_query(async { 1 }), None);
    }

    #[test]
    fn severity_round_trips_through_text() {
        for severity in [Severity::Info, Severity::Warning, Severity::Critical] {
            assert_eq!(severity_from_str(severity_to_str(severity)), severity);
        }
    }
}
