use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::Role;
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_overrides: Option<HashMap<String, bool>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub department: Option<String>,
    pub is_active: i64,
    pub permission_overrides: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbUser> for User {
    type Error = AppError;

    fn try_from(value: DbUser) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&value.id)
            .map_err(|err| AppError::internal(format!("invalid user id: {err}")))?;
        let role = Role::from_str(&value.role)
            .map_err(|_| AppError::internal(format!("unknown role: {}", value.role)))?;
        let permission_overrides = value
            .permission_overrides
            .as_deref()
            .map(serde_json::from_str::<HashMap<String, bool>>)
            .transpose()
            .map_err(|err| AppError::internal(format!("invalid permission overrides: {err}")))?;

        Ok(User {
            id,
            name: value.name,
            email: value.email,
            role,
            department: value.department,
            is_active: value.is_active != 0,
            permission_overrides,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

pub const DB_USER_COLUMNS: &str = "id, name, email, password_hash, role, department, is_active, permission_overrides, created_at, updated_at, deleted_at";

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserCreateRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub department: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PermissionOverridesRequest {
    /// Capability name -> granted. Replaces the whole override map.
    pub overrides: HashMap<String, bool>,
}
