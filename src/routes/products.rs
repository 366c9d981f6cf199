use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{permissions, require_permission};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::product::{
    DbProduct, Product, ProductCreateRequest, ProductUpdateRequest, DB_PRODUCT_COLUMNS,
};
use crate::utils::utc_now;

#[utoipa::path(
    get,
    path = "/products",
    tag = "Products",
    responses((status = 200, description = "List products", body = [Product]))
)]
pub async fn list_products(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Product>>> {
    require_permission(&state.pool, &auth, permissions::PRODUCTS_VIEW).await?;

    let products = sqlx::query_as::<_, DbProduct>(&format!(
        "SELECT {DB_PRODUCT_COLUMNS} FROM products WHERE deleted_at IS NULL ORDER BY name",
    ))
    .fetch_all(&state.pool)
    .await?;

    let products: Vec<Product> = products
        .into_iter()
        .map(Product::try_from)
        .collect::<Result<_, _>>()?;

    Ok(Json(products))
}

#[utoipa::path(
    post,
    path = "/products",
    tag = "Products",
    request_body = ProductCreateRequest,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 409, description = "SKU already exists")
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ProductCreateRequest>,
) -> AppResult<(StatusCode, Json<Product>)> {
    require_permission(&state.pool, &auth, permissions::PRODUCTS_CREATE).await?;

    if payload.sku.trim().is_empty() || payload.name.trim().is_empty() {
        return Err(AppError::validation("sku and name must not be empty"));
    }
    if payload.price < 0.0 || payload.cost < 0.0 {
        return Err(AppError::validation("price and cost must not be negative"));
    }
    let stock = payload.stock.unwrap_or(0);
    let min_stock = payload.min_stock.unwrap_or(0);
    if stock < 0 || min_stock < 0 {
        return Err(AppError::validation("stock and min_stock must not be negative"));
    }
    ensure_sku_available(&state.pool, &payload.sku, None).await?;

    if let Some(category_id) = payload.category_id {
        ensure_category_exists(&state.pool, category_id).await?;
    }

    let now = utc_now();
    let product_id = Uuid::new_v4();

    sqlx::query(&format!(
        "INSERT INTO products ({DB_PRODUCT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, NULL)",
    ))
    .bind(product_id.to_string())
    .bind(&payload.sku)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(payload.cost)
    .bind(stock)
    .bind(min_stock)
    .bind(payload.category_id.map(|id| id.to_string()))
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let product: Product = fetch_product(&state.pool, product_id).await?.try_into()?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product id")),
    responses((status = 200, description = "Product detail", body = Product))
)]
pub async fn get_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    require_permission(&state.pool, &auth, permissions::PRODUCTS_VIEW).await?;

    let product: Product = fetch_product(&state.pool, id).await?.try_into()?;
    Ok(Json(product))
}

#[utoipa::path(
    put,
    path = "/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = ProductUpdateRequest,
    responses((status = 200, description = "Product updated", body = Product))
)]
pub async fn update_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductUpdateRequest>,
) -> AppResult<Json<Product>> {
    require_permission(&state.pool, &auth, permissions::PRODUCTS_EDIT).await?;

    let mut product = fetch_product(&state.pool, id).await?;

    if let Some(sku) = payload.sku.as_ref() {
        if sku.trim().is_empty() {
            return Err(AppError::validation("sku must not be empty"));
        }
        ensure_sku_available(&state.pool, sku, Some(id)).await?;
        product.sku = sku.clone();
    }
    if let Some(name) = payload.name.as_ref() {
        product.name = name.clone();
    }
    if payload.description.is_some() {
        product.description = payload.description.clone();
    }
    if let Some(price) = payload.price {
        if price < 0.0 {
            return Err(AppError::validation("price must not be negative"));
        }
        product.price = price;
    }
    if let Some(cost) = payload.cost {
        if cost < 0.0 {
            return Err(AppError::validation("cost must not be negative"));
        }
        product.cost = cost;
    }
    if let Some(min_stock) = payload.min_stock {
        if min_stock < 0 {
            return Err(AppError::validation("min_stock must not be negative"));
        }
        product.min_stock = min_stock;
    }
    if let Some(category_id) = payload.category_id {
        ensure_category_exists(&state.pool, category_id).await?;
        product.category_id = Some(category_id.to_string());
    }
    if let Some(is_active) = payload.is_active {
        product.is_active = is_active as i64;
    }

    // Stock is not touched here: stock changes flow only through
    // /movements so the movement log and the stock field stay reconciled.
    let now = utc_now();
    sqlx::query(
        "UPDATE products SET sku = ?, name = ?, description = ?, price = ?, cost = ?, min_stock = ?, category_id = ?, is_active = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&product.sku)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.cost)
    .bind(product.min_stock)
    .bind(&product.category_id)
    .bind(product.is_active)
    .bind(now)
    .bind(&product.id)
    .execute(&state.pool)
    .await?;

    product.updated_at = now;
    Ok(Json(product.try_into()?))
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product id")),
    responses((status = 204, description = "Product soft deleted"))
)]
pub async fn delete_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_permission(&state.pool, &auth, permissions::PRODUCTS_DELETE).await?;

    let now = utc_now();
    let affected = sqlx::query(
        "UPDATE products SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(now)
    .bind(id.to_string())
    .execute(&state.pool)
    .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("product not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_sku_available(pool: &SqlitePool, sku: &str, exclude: Option<Uuid>) -> AppResult<()> {
    let count: i64 = match exclude {
        Some(id) => {
            sqlx::query_scalar(
                "SELECT COUNT(1) FROM products WHERE sku = ? AND id != ? AND deleted_at IS NULL",
            )
            .bind(sku)
            .bind(id.to_string())
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(1) FROM products WHERE sku = ? AND deleted_at IS NULL")
                .bind(sku)
                .fetch_one(pool)
                .await?
        }
    };

    if count > 0 {
        return Err(AppError::conflict("SKU already in use"));
    }

    Ok(())
}

async fn ensure_category_exists(pool: &SqlitePool, category_id: Uuid) -> AppResult<()> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(1) FROM categories WHERE id = ? AND deleted_at IS NULL")
            .bind(category_id.to_string())
            .fetch_one(pool)
            .await?;

    if count == 0 {
        return Err(AppError::not_found("category not found"));
    }

    Ok(())
}

pub(crate) async fn fetch_product(pool: &SqlitePool, id: Uuid) -> AppResult<DbProduct> {
    sqlx::query_as::<_, DbProduct>(&format!(
        "SELECT {DB_PRODUCT_COLUMNS} FROM products WHERE id = ? AND deleted_at IS NULL",
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("product not found"))
}
