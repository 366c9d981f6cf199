use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{permissions, require_permission};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::category::{
    Category, CategoryCreateRequest, CategoryUpdateRequest, DbCategory, DB_CATEGORY_COLUMNS,
};
use crate::utils::utc_now;

#[utoipa::path(
    get,
    path = "/categories",
    tag = "Categories",
    responses((status = 200, description = "List categories", body = [Category]))
)]
pub async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Category>>> {
    require_permission(&state.pool, &auth, permissions::CATEGORIES_VIEW).await?;

    let categories = sqlx::query_as::<_, DbCategory>(&format!(
        "SELECT {DB_CATEGORY_COLUMNS} FROM categories WHERE deleted_at IS NULL ORDER BY name",
    ))
    .fetch_all(&state.pool)
    .await?;

    let categories: Vec<Category> = categories
        .into_iter()
        .map(Category::try_from)
        .collect::<Result<_, _>>()?;

    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "/categories",
    tag = "Categories",
    request_body = CategoryCreateRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 409, description = "Category name already exists")
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CategoryCreateRequest>,
) -> AppResult<(StatusCode, Json<Category>)> {
    require_permission(&state.pool, &auth, permissions::CATEGORIES_CREATE).await?;

    if payload.name.trim().is_empty() {
        return Err(AppError::validation("name must not be empty"));
    }
    ensure_name_available(&state.pool, &payload.name, None).await?;

    let now = utc_now();
    let category_id = Uuid::new_v4();

    sqlx::query(&format!(
        "INSERT INTO categories ({DB_CATEGORY_COLUMNS}) VALUES (?, ?, ?, ?, ?, NULL)",
    ))
    .bind(category_id.to_string())
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let category: Category = fetch_category(&state.pool, category_id).await?.try_into()?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = "Categories",
    params(("id" = Uuid, Path, description = "Category id")),
    responses((status = 200, description = "Category detail", body = Category))
)]
pub async fn get_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Category>> {
    require_permission(&state.pool, &auth, permissions::CATEGORIES_VIEW).await?;

    let category: Category = fetch_category(&state.pool, id).await?.try_into()?;
    Ok(Json(category))
}

#[utoipa::path(
    put,
    path = "/categories/{id}",
    tag = "Categories",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = CategoryUpdateRequest,
    responses((status = 200, description = "Category updated", body = Category))
)]
pub async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryUpdateRequest>,
) -> AppResult<Json<Category>> {
    require_permission(&state.pool, &auth, permissions::CATEGORIES_EDIT).await?;

    let mut category = fetch_category(&state.pool, id).await?;

    if let Some(name) = payload.name.as_ref() {
        if name.trim().is_empty() {
            return Err(AppError::validation("name must not be empty"));
        }
        ensure_name_available(&state.pool, name, Some(id)).await?;
        category.name = name.clone();
    }
    if payload.description.is_some() {
        category.description = payload.description.clone();
    }

    let now = utc_now();
    sqlx::query("UPDATE categories SET name = ?, description = ?, updated_at = ? WHERE id = ?")
        .bind(&category.name)
        .bind(&category.description)
        .bind(now)
        .bind(&category.id)
        .execute(&state.pool)
        .await?;

    category.updated_at = now;
    Ok(Json(category.try_into()?))
}

#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "Categories",
    params(("id" = Uuid, Path, description = "Category id")),
    responses((status = 204, description = "Category soft deleted"))
)]
pub async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_permission(&state.pool, &auth, permissions::CATEGORIES_DELETE).await?;

    let now = utc_now();
    let affected = sqlx::query(
        "UPDATE categories SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(now)
    .bind(id.to_string())
    .execute(&state.pool)
    .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("category not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_name_available(
    pool: &SqlitePool,
    name: &str,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    let count: i64 = match exclude {
        Some(id) => {
            sqlx::query_scalar(
                "SELECT COUNT(1) FROM categories WHERE name = ? AND id != ? AND deleted_at IS NULL",
            )
            .bind(name)
            .bind(id.to_string())
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(1) FROM categories WHERE name = ? AND deleted_at IS NULL")
                .bind(name)
                .fetch_one(pool)
                .await?
        }
    };

    if count > 0 {
        return Err(AppError::conflict("category name already in use"));
    }

    Ok(())
}

async fn fetch_category(pool: &SqlitePool, id: Uuid) -> AppResult<DbCategory> {
    sqlx::query_as::<_, DbCategory>(&format!(
        "SELECT {DB_CATEGORY_COLUMNS} FROM categories WHERE id = ? AND deleted_at IS NULL",
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("category not found"))
}
