use std::sync::Arc;

use crate::errors::AppError;

/// Runtime configuration resolved from the environment once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: Arc<Vec<u8>>,
    pub jwt_exp_hours: i64,
    /// Shared secret for the external scheduler that triggers `/cron/run`.
    pub cron_secret: Option<String>,
    /// READ notifications older than this many days are purged by cleanup.
    pub notification_retention_days: i64,
    /// When false the mailer is never invoked, notifications still persist.
    pub email_enabled: bool,
}

const DEFAULT_RETENTION_DAYS: i64 = 30;

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::configuration("JWT_SECRET not set"))?;

        let jwt_exp_hours = std::env::var("JWT_EXP_HOURS")
            .map(|val| val.parse::<i64>())
            .unwrap_or(Ok(24))
            .map_err(|_| AppError::configuration("JWT_EXP_HOURS must be a valid integer"))?;

        let cron_secret = std::env::var("CRON_SECRET").ok().filter(|s| !s.is_empty());

        let notification_retention_days = std::env::var("NOTIFICATION_RETENTION_DAYS")
            .map(|val| val.parse::<i64>())
            .unwrap_or(Ok(DEFAULT_RETENTION_DAYS))
            .map_err(|_| {
                AppError::configuration("NOTIFICATION_RETENTION_DAYS must be a valid integer")
            })?;

        let email_enabled = std::env::var("EMAIL_ENABLED")
            .map(|val| matches!(val.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            jwt_secret: Arc::new(jwt_secret.into_bytes()),
            jwt_exp_hours,
            cron_secret,
            notification_retention_days,
            email_enabled,
        })
    }
}
