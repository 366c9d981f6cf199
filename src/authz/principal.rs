use std::collections::HashMap;
use std::str::FromStr;

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{evaluator, Role};
use crate::errors::AppError;
use crate::jwt::AuthUser;

/// The resolved acting user. Always passed explicitly into operations;
/// never read from ambient state.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    /// Legacy per-user capability overrides. Consulted only by
    /// `has_capability`; `require` uses the role table alone.
    pub overrides: HashMap<String, bool>,
}

impl Principal {
    /// Loads the principal for an authenticated user id. Deactivated or
    /// deleted users do not resolve; the caller sees a generic 401.
    pub async fn resolve(pool: &SqlitePool, auth: &AuthUser) -> Result<Self, AppError> {
        let row = sqlx::query(
            "SELECT id, email, role, is_active, permission_overrides FROM users WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(auth.user_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::unauthorized("authentication required"))?;

        let is_active: i64 = row.get("is_active");
        if is_active == 0 {
            return Err(AppError::unauthorized("authentication required"));
        }

        let role_str: String = row.get("role");
        let role = Role::from_str(&role_str)
            .map_err(|_| AppError::internal(format!("unknown role in database: {role_str}")))?;

        let overrides = row
            .get::<Option<String>, _>("permission_overrides")
            .and_then(|raw| serde_json::from_str::<HashMap<String, bool>>(&raw).ok())
            .unwrap_or_default();

        Ok(Principal {
            user_id: auth.user_id,
            email: row.get("email"),
            role,
            overrides,
        })
    }

    /// The request guard check. Deliberately generic message: denials never
    /// reveal which permission was missing.
    pub fn require(&self, permission: &str) -> Result<&Self, AppError> {
        if evaluator::has_permission(self.role, permission) {
            Ok(self)
        } else {
            Err(AppError::forbidden("insufficient permissions"))
        }
    }

    /// Coarse capability check: union of the role grant and the per-user
    /// override map. The override map can only widen, never revoke.
    pub fn has_capability(&self, capability: &str) -> bool {
        evaluator::has_permission(self.role, capability)
            || self.overrides.get(capability).copied().unwrap_or(false)
    }
}

/// Resolve-and-check in one step. Runs before the underlying operation.
pub async fn require_permission(
    pool: &SqlitePool,
    auth: &AuthUser,
    permission: &str,
) -> Result<Principal, AppError> {
    let principal = Principal::resolve(pool, auth).await?;
    principal.require(permission)?;
    Ok(principal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::permissions;

    fn principal(role: Role, overrides: &[(&str, bool)]) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            role,
            overrides: overrides
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    #[test]
    fn require_uses_role_table_only() {
        let p = principal(Role::Vendedor, &[(permissions::USERS_DELETE, true)]);
        // Override widens has_capability but never the strict guard.
        assert!(p.require(permissions::USERS_DELETE).is_err());
        assert!(p.has_capability(permissions::USERS_DELETE));
    }

    #[test]
    fn override_cannot_revoke_role_grant() {
        let p = principal(Role::Ceo, &[(permissions::PRODUCTS_VIEW, false)]);
        assert!(p.has_capability(permissions::PRODUCTS_VIEW));
    }

    #[test]
    fn denial_message_is_generic() {
        let p = principal(Role::Vendedor, &[]);
        let err = p.require(permissions::USERS_DELETE).unwrap_err();
        assert!(!err.to_string().contains("users.delete"));
    }
}
