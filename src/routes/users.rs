use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{permissions, require_permission};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::user::{
    DbUser, PermissionOverridesRequest, User, UserCreateRequest, UserUpdateRequest,
    DB_USER_COLUMNS,
};
use crate::routes::auth::fetch_user_by_id;
use crate::utils::{hash_password, utc_now};

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses((status = 200, description = "List users", body = [User]))
)]
pub async fn list_users(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<User>>> {
    require_permission(&state.pool, &auth, permissions::USERS_VIEW).await?;

    let users = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {DB_USER_COLUMNS} FROM users WHERE deleted_at IS NULL ORDER BY name",
    ))
    .fetch_all(&state.pool)
    .await?;

    let users: Vec<User> = users
        .into_iter()
        .map(User::try_from)
        .collect::<Result<_, _>>()?;

    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = UserCreateRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UserCreateRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let principal = require_permission(&state.pool, &auth, permissions::USERS_CREATE).await?;

    // Role assignment is bounded by the hierarchy, independent of the
    // create permission itself.
    if !principal.role.may_assign(payload.role) {
        return Err(AppError::forbidden("insufficient permissions"));
    }

    ensure_email_available(&state.pool, &payload.email, None).await?;
    let password_hash = hash_password(&payload.password)?;
    let now = utc_now();
    let user_id = Uuid::new_v4();

    sqlx::query(&format!(
        "INSERT INTO users ({DB_USER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, 1, NULL, ?, ?, NULL)",
    ))
    .bind(user_id.to_string())
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(password_hash)
    .bind(payload.role.as_str())
    .bind(&payload.department)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let user: User = fetch_user_by_id(&state.pool, user_id).await?.try_into()?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    responses((status = 200, description = "User detail", body = User))
)]
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<User>> {
    require_permission(&state.pool, &auth, permissions::USERS_VIEW).await?;

    let user: User = fetch_user_by_id(&state.pool, id).await?.try_into()?;
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UserUpdateRequest,
    responses((status = 200, description = "User updated", body = User))
)]
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserUpdateRequest>,
) -> AppResult<Json<User>> {
    let principal = require_permission(&state.pool, &auth, permissions::USERS_EDIT).await?;

    let mut user = fetch_user_by_id(&state.pool, id).await?;

    if let Some(name) = payload.name.as_ref() {
        user.name = name.clone();
    }
    if let Some(email) = payload.email.as_ref() {
        ensure_email_available(&state.pool, email, Some(id)).await?;
        user.email = email.clone();
    }
    if let Some(role) = payload.role {
        if !principal.role.may_assign(role) {
            return Err(AppError::forbidden("insufficient permissions"));
        }
        user.role = role.as_str().to_string();
    }
    if payload.department.is_some() {
        user.department = payload.department.clone();
    }
    if let Some(is_active) = payload.is_active {
        user.is_active = is_active as i64;
    }

    let now = utc_now();
    sqlx::query(
        "UPDATE users SET name = ?, email = ?, role = ?, department = ?, is_active = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.role)
    .bind(&user.department)
    .bind(user.is_active)
    .bind(now)
    .bind(&user.id)
    .execute(&state.pool)
    .await?;

    user.updated_at = now;
    Ok(Json(user.try_into()?))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    responses((status = 204, description = "User deactivated"))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let principal = require_permission(&state.pool, &auth, permissions::USERS_DELETE).await?;

    if principal.user_id == id {
        return Err(AppError::validation("cannot delete own account"));
    }

    // Soft deactivate: the row stays for movement/notification history.
    let now = utc_now();
    let affected = sqlx::query(
        "UPDATE users SET is_active = 0, deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(now)
    .bind(id.to_string())
    .execute(&state.pool)
    .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("user not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/users/{id}/permissions",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = PermissionOverridesRequest,
    responses((status = 200, description = "Override map replaced", body = User))
)]
pub async fn set_permission_overrides(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PermissionOverridesRequest>,
) -> AppResult<Json<User>> {
    require_permission(&state.pool, &auth, permissions::USERS_MANAGE_PERMISSIONS).await?;

    let user = fetch_user_by_id(&state.pool, id).await?;
    let overrides = serde_json::to_string(&payload.overrides)
        .map_err(|err| AppError::internal(format!("failed to encode overrides: {err}")))?;

    let now = utc_now();
    sqlx::query("UPDATE users SET permission_overrides = ?, updated_at = ? WHERE id = ?")
        .bind(&overrides)
        .bind(now)
        .bind(&user.id)
        .execute(&state.pool)
        .await?;

    let user: User = fetch_user_by_id(&state.pool, id).await?.try_into()?;
    Ok(Json(user))
}

async fn ensure_email_available(pool: &SqlitePool, email: &str, exclude: Option<Uuid>) -> AppResult<()> {
    let count: i64 = match exclude {
        Some(id) => {
            sqlx::query_scalar(
                "SELECT COUNT(1) FROM users WHERE email = ? AND id != ? AND deleted_at IS NULL",
            )
            .bind(email)
            .bind(id.to_string())
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE email = ? AND deleted_at IS NULL")
                .bind(email)
                .fetch_one(pool)
                .await?
        }
    };

    if count > 0 {
        return Err(AppError::conflict("email already in use"));
    }

    Ok(())
}
