use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum NotificationType {
    #[serde(rename = "STOCK_ALERT")]
    StockAlert,
    #[serde(rename = "MOVEMENT")]
    Movement,
    #[serde(rename = "USER_ACTION")]
    UserAction,
    #[serde(rename = "SYSTEM_UPDATE")]
    SystemUpdate,
    #[serde(rename = "SECURITY")]
    Security,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::StockAlert => "STOCK_ALERT",
            NotificationType::Movement => "MOVEMENT",
            NotificationType::UserAction => "USER_ACTION",
            NotificationType::SystemUpdate => "SYSTEM_UPDATE",
            NotificationType::Security => "SECURITY",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "STOCK_ALERT" => Ok(NotificationType::StockAlert),
            "MOVEMENT" => Ok(NotificationType::Movement),
            "USER_ACTION" => Ok(NotificationType::UserAction),
            "SYSTEM_UPDATE" => Ok(NotificationType::SystemUpdate),
            "SECURITY" => Ok(NotificationType::Security),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Priority {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "NORMAL")]
    Normal,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "URGENT")]
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Normal => "NORMAL",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        }
    }
}

impl FromStr for Priority {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "LOW" => Ok(Priority::Low),
            "NORMAL" => Ok(Priority::Normal),
            "HIGH" => Ok(Priority::High),
            "URGENT" => Ok(Priority::Urgent),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum NotificationStatus {
    #[serde(rename = "UNREAD")]
    Unread,
    #[serde(rename = "READ")]
    Read,
    #[serde(rename = "ARCHIVED")]
    Archived,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Unread => "UNREAD",
            NotificationStatus::Read => "READ",
            NotificationStatus::Archived => "ARCHIVED",
        }
    }
}

impl FromStr for NotificationStatus {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "UNREAD" => Ok(NotificationStatus::Unread),
            "READ" => Ok(NotificationStatus::Read),
            "ARCHIVED" => Ok(NotificationStatus::Archived),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub notification_type: NotificationType,
    pub priority: Priority,
    pub status: NotificationStatus,
    pub title: String,
    pub message: String,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub payload: Option<Value>,
    pub send_email: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbNotification {
    pub id: String,
    pub notification_type: String,
    pub priority: String,
    pub status: String,
    pub title: String,
    pub message: String,
    pub user_id: String,
    pub sender_id: Option<String>,
    pub payload: Option<String>,
    pub send_email: i64,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbNotification> for Notification {
    type Error = AppError;

    fn try_from(value: DbNotification) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&value.id)
            .map_err(|err| AppError::internal(format!("invalid notification id: {err}")))?;
        let user_id = Uuid::parse_str(&value.user_id)
            .map_err(|err| AppError::internal(format!("invalid user id: {err}")))?;
        let sender_id = value
            .sender_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|err| AppError::internal(format!("invalid sender id: {err}")))?;
        let notification_type = NotificationType::from_str(&value.notification_type)
            .map_err(|_| AppError::internal(format!("unknown notification type: {}", value.notification_type)))?;
        let priority = Priority::from_str(&value.priority)
            .map_err(|_| AppError::internal(format!("unknown priority: {}", value.priority)))?;
        let status = NotificationStatus::from_str(&value.status)
            .map_err(|_| AppError::internal(format!("unknown notification status: {}", value.status)))?;
        let payload = value
            .payload
            .as_deref()
            .map(serde_json::from_str::<Value>)
            .transpose()
            .map_err(|err| AppError::internal(format!("invalid notification payload: {err}")))?;

        Ok(Notification {
            id,
            notification_type,
            priority,
            status,
            title: value.title,
            message: value.message,
            user_id,
            sender_id,
            payload,
            send_email: value.send_email != 0,
            created_at: value.created_at,
            read_at: value.read_at,
        })
    }
}

pub const DB_NOTIFICATION_COLUMNS: &str = "id, notification_type, priority, status, title, message, user_id, sender_id, payload, send_email, created_at, read_at";

#[derive(Debug, Deserialize, ToSchema)]
pub struct NotificationCreateRequest {
    pub notification_type: NotificationType,
    pub priority: Option<Priority>,
    pub title: String,
    pub message: String,
    pub user_id: Uuid,
    #[schema(value_type = Object)]
    pub payload: Option<Value>,
    pub send_email: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NotificationListQuery {
    pub status: Option<String>,
    pub notification_type: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkAllResponse {
    pub count: u64,
}
