use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    pub cost: f64,
    pub stock: i64,
    pub min_stock: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbProduct {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub cost: f64,
    pub stock: i64,
    pub min_stock: i64,
    pub category_id: Option<String>,
    pub is_active: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbProduct> for Product {
    type Error = AppError;

    fn try_from(value: DbProduct) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&value.id)
            .map_err(|err| AppError::internal(format!("invalid product id: {err}")))?;
        let category_id = value
            .category_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|err| AppError::internal(format!("invalid category id: {err}")))?;

        Ok(Product {
            id,
            sku: value.sku,
            name: value.name,
            description: value.description,
            price: value.price,
            cost: value.cost,
            stock: value.stock,
            min_stock: value.min_stock,
            category_id,
            is_active: value.is_active != 0,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

pub const DB_PRODUCT_COLUMNS: &str = "id, sku, name, description, price, cost, stock, min_stock, category_id, is_active, created_at, updated_at, deleted_at";

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductCreateRequest {
    #[schema(example = "SKU-0001")]
    pub sku: String,
    #[schema(example = "Cafe molido 500g")]
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub cost: f64,
    /// Opening stock. Later changes go through movements only.
    pub stock: Option<i64>,
    pub min_stock: Option<i64>,
    pub category_id: Option<Uuid>,
}

/// Stock is deliberately absent here: the stock field is only writable
/// through the movement endpoint so the log and the field cannot diverge.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductUpdateRequest {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub cost: Option<f64>,
    pub min_stock: Option<i64>,
    pub category_id: Option<Uuid>,
    pub is_active: Option<bool>,
}
