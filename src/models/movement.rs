use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

/// IN and OUT carry a signed delta; ADJUSTMENT quantity is the absolute
/// target stock, never a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum MovementType {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
    #[serde(rename = "ADJUSTMENT")]
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
            MovementType::Adjustment => "ADJUSTMENT",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "IN" => Ok(MovementType::In),
            "OUT" => Ok(MovementType::Out),
            "ADJUSTMENT" => Ok(MovementType::Adjustment),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbStockMovement {
    pub id: String,
    pub product_id: String,
    pub movement_type: String,
    pub quantity: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub reason: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbStockMovement> for StockMovement {
    type Error = AppError;

    fn try_from(value: DbStockMovement) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&value.id)
            .map_err(|err| AppError::internal(format!("invalid movement id: {err}")))?;
        let product_id = Uuid::parse_str(&value.product_id)
            .map_err(|err| AppError::internal(format!("invalid product id: {err}")))?;
        let created_by = Uuid::parse_str(&value.created_by)
            .map_err(|err| AppError::internal(format!("invalid creator id: {err}")))?;
        let movement_type = MovementType::from_str(&value.movement_type)
            .map_err(|_| AppError::internal(format!("unknown movement type: {}", value.movement_type)))?;

        Ok(StockMovement {
            id,
            product_id,
            movement_type,
            quantity: value.quantity,
            previous_stock: value.previous_stock,
            new_stock: value.new_stock,
            reason: value.reason,
            reference: value.reference,
            notes: value.notes,
            created_by,
            created_at: value.created_at,
        })
    }
}

pub const DB_MOVEMENT_COLUMNS: &str = "id, product_id, movement_type, quantity, previous_stock, new_stock, reason, reference, notes, created_by, created_at";

#[derive(Debug, Deserialize, ToSchema)]
pub struct MovementCreateRequest {
    pub product_id: Uuid,
    pub movement_type: MovementType,
    /// Positive integer. For ADJUSTMENT this is the absolute target stock.
    pub quantity: i64,
    #[schema(example = "venta mostrador")]
    pub reason: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MovementListQuery {
    pub product_id: Option<Uuid>,
    pub movement_type: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
