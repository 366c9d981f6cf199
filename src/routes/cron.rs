use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::alerts;
use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::utils::utc_now;

#[derive(Debug, Serialize, ToSchema)]
pub struct SweepResponse {
    pub stock_alerts: bool,
    pub cleanup: bool,
    pub errors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[utoipa::path(
    post,
    path = "/cron/run",
    tag = "Cron",
    responses(
        (status = 200, description = "Sweep summary", body = SweepResponse),
        (status = 401, description = "Missing or wrong shared secret")
    )
)]
pub async fn run_scheduled_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<SweepResponse>> {
    // Shared-secret trust boundary for the external scheduler; this is not
    // a user permission and never goes through the role table.
    let expected = state
        .config
        .cron_secret
        .as_deref()
        .ok_or_else(|| AppError::configuration("CRON_SECRET not set"))?;

    let presented = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if presented != Some(expected) {
        return Err(AppError::unauthorized("invalid cron token"));
    }

    let mut errors = Vec::new();

    // Step 1: full-catalog stock sweep. Failures are recorded, not raised,
    // so cleanup still runs.
    let stock_alerts = match alerts::sweep_all(&state.pool).await {
        Ok(signals) => {
            let mut ok = true;
            for signal in &signals {
                if let Err(err) =
                    alerts::dispatch_signal(&state.pool, &state.config, state.mailer.as_ref(), signal)
                        .await
                {
                    tracing::error!(product = %signal.sku, error = %err, "sweep dispatch failed");
                    errors.push(format!("stock alert for {}: {err}", signal.sku));
                    ok = false;
                }
            }
            ok
        }
        Err(err) => {
            errors.push(format!("stock sweep: {err}"));
            false
        }
    };

    // Step 2: purge stale read notifications.
    let cleanup = match alerts::cleanup_notifications(
        &state.pool,
        state.config.notification_retention_days,
    )
    .await
    {
        Ok(deleted) => {
            tracing::info!(deleted, "notification cleanup completed");
            true
        }
        Err(err) => {
            errors.push(format!("cleanup: {err}"));
            false
        }
    };

    Ok(Json(SweepResponse {
        stock_alerts,
        cleanup,
        errors,
        timestamp: utc_now(),
    }))
}
