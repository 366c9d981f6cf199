//! Alert/notification dispatcher.
//!
//! Turns detected stock signals and system events into persisted rows.
//! Alert creation is a conditional insert backed by the partial unique
//! index on (product_id, alert_type) for UNREAD rows, so concurrent
//! triggers (inline post-mutation check vs cron sweep) cannot flood
//! duplicates. Email delivery is fire-and-forget: a transport failure is
//! logged and never rolls back the notification row.

use sqlx::SqlitePool;
use uuid::Uuid;

use super::{SignalKind, StockSignal};
use crate::authz::{permissions, roles_with_permission};
use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::mailer::Mailer;
use crate::models::alert::{Alert, DbAlert, DB_ALERT_COLUMNS};
use crate::models::notification::{
    DbNotification, Notification, NotificationCreateRequest, NotificationType, Priority,
    DB_NOTIFICATION_COLUMNS,
};
use crate::utils::utc_now;

fn alert_copy(signal: &StockSignal) -> (String, String) {
    match signal.kind {
        SignalKind::OutOfStock => (
            format!("Out of stock: {}", signal.sku),
            format!("{} ({}) has no stock left", signal.name, signal.sku),
        ),
        SignalKind::LowStock => (
            format!("Low stock: {}", signal.sku),
            format!(
                "{} ({}) is at {} units, at or below the minimum of {}",
                signal.name, signal.sku, signal.stock, signal.min_stock
            ),
        ),
    }
}

/// Persist the alert for a detected signal and fan out notifications.
/// Returns true when a new alert row was created; false when an unread
/// alert for the same (product, type) already existed and the whole
/// dispatch was suppressed.
pub async fn dispatch_signal(
    pool: &SqlitePool,
    config: &AppConfig,
    mailer: &dyn Mailer,
    signal: &StockSignal,
) -> AppResult<bool> {
    let (title, message) = alert_copy(signal);
    let now = utc_now();

    // INSERT OR IGNORE rides on uq_alerts_unread; a racing duplicate
    // resolves to rows_affected == 0 instead of an error.
    let created = sqlx::query(&format!(
        "INSERT OR IGNORE INTO alerts ({DB_ALERT_COLUMNS}) VALUES (?, ?, 'UNREAD', ?, ?, ?, ?, NULL)",
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(signal.kind.alert_type().as_str())
    .bind(&title)
    .bind(&message)
    .bind(signal.product_id.to_string())
    .bind(now)
    .execute(pool)
    .await?
    .rows_affected();

    if created == 0 {
        tracing::debug!(product = %signal.sku, "unread alert already present, dispatch suppressed");
        return Ok(false);
    }

    let priority = match signal.kind {
        SignalKind::OutOfStock => Priority::Urgent,
        SignalKind::LowStock => Priority::High,
    };

    let recipients = alert_recipients(pool).await?;
    for (user_id, email) in recipients {
        let notification = create_notification(
            pool,
            config,
            mailer,
            &NotificationCreateRequest {
                notification_type: NotificationType::StockAlert,
                priority: Some(priority),
                title: title.clone(),
                message: message.clone(),
                user_id,
                payload: Some(serde_json::json!({
                    "product_id": signal.product_id,
                    "sku": signal.sku,
                    "stock": signal.stock,
                    "min_stock": signal.min_stock,
                })),
                send_email: Some(config.email_enabled),
            },
            None,
        )
        .await;

        if let Err(err) = notification {
            // One bad recipient must not starve the rest of the fan-out.
            tracing::error!(user = %email, error = %err, "failed to create stock alert notification");
        }
    }

    Ok(true)
}

/// Active users whose role grants `alerts.view`.
async fn alert_recipients(pool: &SqlitePool) -> AppResult<Vec<(Uuid, String)>> {
    let roles = roles_with_permission(permissions::ALERTS_VIEW);
    let placeholders = vec!["?"; roles.len()].join(", ");
    let sql = format!(
        "SELECT id, email FROM users WHERE is_active = 1 AND deleted_at IS NULL AND role IN ({placeholders})",
    );

    let mut query = sqlx::query_as::<_, (String, String)>(&sql);
    for role in &roles {
        query = query.bind(role.as_str());
    }

    let rows = query.fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .filter_map(|(id, email)| Uuid::parse_str(&id).ok().map(|id| (id, email)))
        .collect())
}

/// Persist a notification and hand it to the mail transport when asked.
pub async fn create_notification(
    pool: &SqlitePool,
    config: &AppConfig,
    mailer: &dyn Mailer,
    req: &NotificationCreateRequest,
    sender_id: Option<Uuid>,
) -> AppResult<Notification> {
    let id = Uuid::new_v4();
    let now = utc_now();
    let priority = req.priority.unwrap_or(Priority::Normal);
    let send_email = req.send_email.unwrap_or(false) && config.email_enabled;
    let payload = req
        .payload
        .as_ref()
        .map(|value| serde_json::to_string(value))
        .transpose()
        .map_err(|err| AppError::internal(format!("failed to encode payload: {err}")))?;

    sqlx::query(&format!(
        "INSERT INTO notifications ({DB_NOTIFICATION_COLUMNS}) VALUES (?, ?, ?, 'UNREAD', ?, ?, ?, ?, ?, ?, ?, NULL)",
    ))
    .bind(id.to_string())
    .bind(req.notification_type.as_str())
    .bind(priority.as_str())
    .bind(&req.title)
    .bind(&req.message)
    .bind(req.user_id.to_string())
    .bind(sender_id.map(|s| s.to_string()))
    .bind(&payload)
    .bind(send_email as i64)
    .bind(now)
    .execute(pool)
    .await?;

    if send_email {
        let recipient: Option<String> =
            sqlx::query_scalar("SELECT email FROM users WHERE id = ? AND deleted_at IS NULL")
                .bind(req.user_id.to_string())
                .fetch_optional(pool)
                .await?;

        if let Some(email) = recipient {
            if let Err(err) = mailer.send(&email, &req.title, &req.message).await {
                // At-least-once, best-effort: the row above stays either way.
                tracing::warn!(to = %email, error = %err, "email delivery failed");
            }
        }
    }

    fetch_notification(pool, id, req.user_id).await
}

async fn fetch_notification(
    pool: &SqlitePool,
    id: Uuid,
    user_id: Uuid,
) -> AppResult<Notification> {
    let row = sqlx::query_as::<_, DbNotification>(&format!(
        "SELECT {DB_NOTIFICATION_COLUMNS} FROM notifications WHERE id = ? AND user_id = ?",
    ))
    .bind(id.to_string())
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("notification not found"))?;

    row.try_into()
}

/// Mark one notification read. Scoped to the owner: a foreign id reports
/// NotFound rather than Forbidden so ids do not leak.
pub async fn mark_notification_read(
    pool: &SqlitePool,
    id: Uuid,
    user_id: Uuid,
) -> AppResult<Notification> {
    let now = utc_now();
    sqlx::query(
        "UPDATE notifications SET status = 'READ', read_at = ? WHERE id = ? AND user_id = ? AND status = 'UNREAD'",
    )
    .bind(now)
    .bind(id.to_string())
    .bind(user_id.to_string())
    .execute(pool)
    .await?;

    // Zero rows means absent, foreign, or already read; the fetch reports
    // NotFound for the first two and returns the row as-is for the last.
    fetch_notification(pool, id, user_id).await
}

pub async fn mark_all_notifications_read(pool: &SqlitePool, user_id: Uuid) -> AppResult<u64> {
    let now = utc_now();
    let affected = sqlx::query(
        "UPDATE notifications SET status = 'READ', read_at = ? WHERE user_id = ? AND status = 'UNREAD'",
    )
    .bind(now)
    .bind(user_id.to_string())
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected)
}

/// Purge READ notifications older than the retention window. UNREAD rows
/// are never deleted regardless of age.
pub async fn cleanup_notifications(pool: &SqlitePool, retention_days: i64) -> AppResult<u64> {
    let cutoff = utc_now() - chrono::Duration::days(retention_days);
    let affected = sqlx::query(
        "DELETE FROM notifications WHERE status = 'READ' AND read_at IS NOT NULL AND read_at < ?",
    )
    .bind(cutoff)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected)
}

pub async fn mark_alert_read(pool: &SqlitePool, id: Uuid) -> AppResult<Alert> {
    let now = utc_now();
    sqlx::query("UPDATE alerts SET status = 'READ', read_at = ? WHERE id = ? AND status = 'UNREAD'")
        .bind(now)
        .bind(id.to_string())
        .execute(pool)
        .await?;

    let row = sqlx::query_as::<_, DbAlert>(&format!(
        "SELECT {DB_ALERT_COLUMNS} FROM alerts WHERE id = ?",
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("alert not found"))?;

    row.try_into()
}

pub async fn mark_all_alerts_read(pool: &SqlitePool) -> AppResult<u64> {
    let now = utc_now();
    let affected = sqlx::query("UPDATE alerts SET status = 'READ', read_at = ? WHERE status = 'UNREAD'")
        .bind(now)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(affected)
}
