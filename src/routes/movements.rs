use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::alerts;
use crate::app::AppState;
use crate::authz::{permissions, require_permission};
use crate::errors::AppResult;
use crate::inventory;
use crate::jwt::AuthUser;
use crate::models::movement::{
    DbStockMovement, MovementCreateRequest, MovementListQuery, MovementType, StockMovement,
    DB_MOVEMENT_COLUMNS,
};
use crate::models::{Page, PageQuery};

#[utoipa::path(
    get,
    path = "/movements",
    tag = "Movements",
    responses((status = 200, description = "List movements"))
)]
pub async fn list_movements(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<MovementListQuery>,
) -> AppResult<Json<Page<StockMovement>>> {
    require_permission(&state.pool, &auth, permissions::MOVEMENTS_VIEW).await?;

    let paging = PageQuery {
        page: query.page,
        limit: query.limit,
    };

    let mut where_clause = String::from("1 = 1");
    if query.product_id.is_some() {
        where_clause.push_str(" AND product_id = ?");
    }
    if query.movement_type.is_some() {
        where_clause.push_str(" AND movement_type = ?");
    }

    let count_sql = format!("SELECT COUNT(1) FROM stock_movements WHERE {where_clause}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(product_id) = query.product_id {
        count_query = count_query.bind(product_id.to_string());
    }
    if let Some(movement_type) = query.movement_type.as_ref() {
        count_query = count_query.bind(movement_type);
    }
    let total = count_query.fetch_one(&state.pool).await?;

    let list_sql = format!(
        "SELECT {DB_MOVEMENT_COLUMNS} FROM stock_movements WHERE {where_clause} ORDER BY created_at DESC LIMIT ? OFFSET ?",
    );
    let mut list_query = sqlx::query_as::<_, DbStockMovement>(&list_sql);
    if let Some(product_id) = query.product_id {
        list_query = list_query.bind(product_id.to_string());
    }
    if let Some(movement_type) = query.movement_type.as_ref() {
        list_query = list_query.bind(movement_type);
    }
    let rows = list_query
        .bind(paging.limit())
        .bind(paging.offset())
        .fetch_all(&state.pool)
        .await?;

    let items: Vec<StockMovement> = rows
        .into_iter()
        .map(StockMovement::try_from)
        .collect::<Result<_, _>>()?;

    Ok(Json(Page {
        items,
        total,
        page: paging.page(),
        limit: paging.limit(),
    }))
}

#[utoipa::path(
    post,
    path = "/movements",
    tag = "Movements",
    request_body = MovementCreateRequest,
    responses(
        (status = 201, description = "Movement recorded", body = StockMovement),
        (status = 409, description = "Insufficient stock for OUT movement"),
        (status = 400, description = "Invalid quantity")
    )
)]
pub async fn create_movement(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<MovementCreateRequest>,
) -> AppResult<(StatusCode, Json<StockMovement>)> {
    // Per-type gating on top of the base create permission.
    let type_permission = match payload.movement_type {
        MovementType::In => permissions::MOVEMENTS_CREATE_IN,
        MovementType::Out => permissions::MOVEMENTS_CREATE_OUT,
        MovementType::Adjustment => permissions::MOVEMENTS_CREATE,
    };
    let principal = require_permission(&state.pool, &auth, permissions::MOVEMENTS_CREATE).await?;
    principal.require(type_permission)?;

    let movement = inventory::apply_movement(&state.pool, &principal, &payload).await?;

    // Explicit post-condition of the stock mutation rule: re-check the
    // product against its threshold and dispatch on a fresh signal.
    if let Some(signal) = alerts::check_product(&state.pool, movement.product_id).await? {
        alerts::dispatch_signal(&state.pool, &state.config, state.mailer.as_ref(), &signal).await?;
    }

    Ok((StatusCode::CREATED, Json(movement)))
}
