//! Alert condition checker.
//!
//! Classification is a pure function of (active, stock, min_stock); the
//! dispatcher is responsible for not re-emitting duplicates.

mod dispatcher;

pub use dispatcher::{
    cleanup_notifications, create_notification, dispatch_signal, mark_alert_read,
    mark_all_alerts_read, mark_all_notifications_read, mark_notification_read,
};

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::alert::AlertType;
use crate::models::product::{DbProduct, DB_PRODUCT_COLUMNS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    OutOfStock,
    LowStock,
}

impl SignalKind {
    pub fn alert_type(&self) -> AlertType {
        match self {
            SignalKind::OutOfStock => AlertType::Critical,
            SignalKind::LowStock => AlertType::Warning,
        }
    }
}

/// A detected threshold condition on one product.
#[derive(Debug, Clone)]
pub struct StockSignal {
    pub product_id: Uuid,
    pub sku: String,
    pub name: String,
    pub stock: i64,
    pub min_stock: i64,
    pub kind: SignalKind,
}

/// Pure classification. Inactive products never signal; zero stock wins
/// over the low-stock threshold.
pub fn evaluate(is_active: bool, stock: i64, min_stock: i64) -> Option<SignalKind> {
    if !is_active {
        return None;
    }
    if stock == 0 {
        return Some(SignalKind::OutOfStock);
    }
    if stock <= min_stock {
        return Some(SignalKind::LowStock);
    }
    None
}

fn signal_for(product: &DbProduct) -> Option<StockSignal> {
    let kind = evaluate(product.is_active != 0, product.stock, product.min_stock)?;
    let product_id = Uuid::parse_str(&product.id).ok()?;
    Some(StockSignal {
        product_id,
        sku: product.sku.clone(),
        name: product.name.clone(),
        stock: product.stock,
        min_stock: product.min_stock,
        kind,
    })
}

/// Classify a single product by id. Read-only; never mutates the product.
pub async fn check_product(pool: &SqlitePool, product_id: Uuid) -> AppResult<Option<StockSignal>> {
    let product = sqlx::query_as::<_, DbProduct>(&format!(
        "SELECT {DB_PRODUCT_COLUMNS} FROM products WHERE id = ? AND deleted_at IS NULL",
    ))
    .bind(product_id.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(product.as_ref().and_then(signal_for))
}

/// Classify every active product. Used by the cron sweep.
pub async fn sweep_all(pool: &SqlitePool) -> AppResult<Vec<StockSignal>> {
    let products = sqlx::query_as::<_, DbProduct>(&format!(
        "SELECT {DB_PRODUCT_COLUMNS} FROM products WHERE is_active = 1 AND deleted_at IS NULL",
    ))
    .fetch_all(pool)
    .await?;

    Ok(products.iter().filter_map(signal_for).collect())
}
