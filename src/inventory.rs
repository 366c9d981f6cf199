//! Stock mutation rule.
//!
//! The movement row and the product stock field are written in one
//! transaction; they can never diverge. The OUT precondition lives in the
//! UPDATE itself so two concurrent OUTs against borderline stock cannot
//! both pass a read-then-write check.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::authz::Principal;
use crate::errors::{AppError, AppResult};
use crate::models::movement::{
    MovementCreateRequest, MovementType, StockMovement, DB_MOVEMENT_COLUMNS,
};
use crate::models::product::{DbProduct, DB_PRODUCT_COLUMNS};
use crate::utils::utc_now;

pub async fn apply_movement(
    pool: &SqlitePool,
    principal: &Principal,
    req: &MovementCreateRequest,
) -> AppResult<StockMovement> {
    if req.quantity <= 0 {
        return Err(AppError::validation("quantity must be a positive integer"));
    }
    if req.reason.trim().is_empty() {
        return Err(AppError::validation("reason must not be empty"));
    }

    let mut tx = pool.begin().await?;

    let product = sqlx::query_as::<_, DbProduct>(&format!(
        "SELECT {DB_PRODUCT_COLUMNS} FROM products WHERE id = ? AND deleted_at IS NULL",
    ))
    .bind(req.product_id.to_string())
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("product not found"))?;

    let previous_stock = product.stock;
    let now = utc_now();

    let new_stock = match req.movement_type {
        MovementType::In => {
            sqlx::query("UPDATE products SET stock = stock + ?, updated_at = ? WHERE id = ?")
                .bind(req.quantity)
                .bind(now)
                .bind(&product.id)
                .execute(&mut *tx)
                .await?;
            previous_stock + req.quantity
        }
        MovementType::Out => {
            // Store-level guard: the decrement only happens if stock still
            // covers the quantity at update time.
            let affected = sqlx::query(
                "UPDATE products SET stock = stock - ?, updated_at = ? WHERE id = ? AND stock >= ?",
            )
            .bind(req.quantity)
            .bind(now)
            .bind(&product.id)
            .bind(req.quantity)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if affected == 0 {
                return Err(AppError::insufficient_stock(format!(
                    "stock {} does not cover requested quantity {}",
                    previous_stock, req.quantity
                )));
            }
            previous_stock - req.quantity
        }
        // ADJUSTMENT: quantity is the absolute target stock, not a delta.
        MovementType::Adjustment => {
            sqlx::query("UPDATE products SET stock = ?, updated_at = ? WHERE id = ?")
                .bind(req.quantity)
                .bind(now)
                .bind(&product.id)
                .execute(&mut *tx)
                .await?;
            req.quantity
        }
    };

    let movement_id = Uuid::new_v4();
    sqlx::query(&format!(
        "INSERT INTO stock_movements ({DB_MOVEMENT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    ))
    .bind(movement_id.to_string())
    .bind(&product.id)
    .bind(req.movement_type.as_str())
    .bind(req.quantity)
    .bind(previous_stock)
    .bind(new_stock)
    .bind(&req.reason)
    .bind(&req.reference)
    .bind(&req.notes)
    .bind(principal.user_id.to_string())
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(StockMovement {
        id: movement_id,
        product_id: req.product_id,
        movement_type: req.movement_type,
        quantity: req.quantity,
        previous_stock,
        new_stock,
        reason: req.reason.clone(),
        reference: req.reference.clone(),
        notes: req.notes.clone(),
        created_by: principal.user_id,
        created_at: now,
    })
}
