use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum AlertType {
    #[serde(rename = "CRITICAL")]
    Critical,
    #[serde(rename = "WARNING")]
    Warning,
    #[serde(rename = "INFO")]
    Info,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Critical => "CRITICAL",
            AlertType::Warning => "WARNING",
            AlertType::Info => "INFO",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertType {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CRITICAL" => Ok(AlertType::Critical),
            "WARNING" => Ok(AlertType::Warning),
            "INFO" => Ok(AlertType::Info),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum AlertStatus {
    #[serde(rename = "UNREAD")]
    Unread,
    #[serde(rename = "READ")]
    Read,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Unread => "UNREAD",
            AlertStatus::Read => "READ",
        }
    }
}

impl FromStr for AlertStatus {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "UNREAD" => Ok(AlertStatus::Unread),
            "READ" => Ok(AlertStatus::Read),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Alert {
    pub id: Uuid,
    pub alert_type: AlertType,
    pub status: AlertStatus,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbAlert {
    pub id: String,
    pub alert_type: String,
    pub status: String,
    pub title: String,
    pub message: String,
    pub product_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbAlert> for Alert {
    type Error = AppError;

    fn try_from(value: DbAlert) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&value.id)
            .map_err(|err| AppError::internal(format!("invalid alert id: {err}")))?;
        let product_id = value
            .product_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|err| AppError::internal(format!("invalid product id: {err}")))?;
        let alert_type = AlertType::from_str(&value.alert_type)
            .map_err(|_| AppError::internal(format!("unknown alert type: {}", value.alert_type)))?;
        let status = AlertStatus::from_str(&value.status)
            .map_err(|_| AppError::internal(format!("unknown alert status: {}", value.status)))?;

        Ok(Alert {
            id,
            alert_type,
            status,
            title: value.title,
            message: value.message,
            product_id,
            created_at: value.created_at,
            read_at: value.read_at,
        })
    }
}

pub const DB_ALERT_COLUMNS: &str = "id, alert_type, status, title, message, product_id, created_at, read_at";

#[derive(Debug, Deserialize, ToSchema)]
pub struct AlertListQuery {
    pub status: Option<String>,
    pub alert_type: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
