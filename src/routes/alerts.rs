use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use crate::alerts as alert_service;
use crate::app::AppState;
use crate::authz::{permissions, require_permission};
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::models::alert::{Alert, AlertListQuery, DbAlert, DB_ALERT_COLUMNS};
use crate::models::notification::MarkAllResponse;
use crate::models::{Page, PageQuery};

#[utoipa::path(
    get,
    path = "/alerts",
    tag = "Alerts",
    responses((status = 200, description = "List alerts, paginated"))
)]
pub async fn list_alerts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<AlertListQuery>,
) -> AppResult<Json<Page<Alert>>> {
    require_permission(&state.pool, &auth, permissions::ALERTS_VIEW).await?;

    let paging = PageQuery {
        page: query.page,
        limit: query.limit,
    };

    let mut where_clause = String::from("1 = 1");
    if query.status.is_some() {
        where_clause.push_str(" AND status = ?");
    }
    if query.alert_type.is_some() {
        where_clause.push_str(" AND alert_type = ?");
    }
    if query.search.is_some() {
        where_clause.push_str(" AND (title LIKE ? OR message LIKE ?)");
    }

    let search_pattern = query.search.as_ref().map(|s| format!("%{s}%"));

    let count_sql = format!("SELECT COUNT(1) FROM alerts WHERE {where_clause}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(status) = query.status.as_ref() {
        count_query = count_query.bind(status);
    }
    if let Some(alert_type) = query.alert_type.as_ref() {
        count_query = count_query.bind(alert_type);
    }
    if let Some(pattern) = search_pattern.as_ref() {
        count_query = count_query.bind(pattern).bind(pattern);
    }
    let total = count_query.fetch_one(&state.pool).await?;

    let list_sql = format!(
        "SELECT {DB_ALERT_COLUMNS} FROM alerts WHERE {where_clause} ORDER BY created_at DESC LIMIT ? OFFSET ?",
    );
    let mut list_query = sqlx::query_as::<_, DbAlert>(&list_sql);
    if let Some(status) = query.status.as_ref() {
        list_query = list_query.bind(status);
    }
    if let Some(alert_type) = query.alert_type.as_ref() {
        list_query = list_query.bind(alert_type);
    }
    if let Some(pattern) = search_pattern.as_ref() {
        list_query = list_query.bind(pattern).bind(pattern);
    }
    let rows = list_query
        .bind(paging.limit())
        .bind(paging.offset())
        .fetch_all(&state.pool)
        .await?;

    let items: Vec<Alert> = rows
        .into_iter()
        .map(Alert::try_from)
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
    path = "/alerts/{id}/read",
    tag = "Alerts",
    params(("id" = Uuid, Path, description = "Alert id")),
    responses((status = 200, description = "Alert marked read", body = Alert))
)]
pub async fn mark_alert_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Alert>> {
    require_permission(&state.pool, &auth, permissions::ALERTS_RESOLVE).await?;

    let alert = alert_service::mark_alert_read(&state.pool, id).await?;
    Ok(Json(alert))
}

#[utoipa::path(
    post,
    path = "/alerts/read-all",
    tag = "Alerts",
    responses((status = 200, description = "All alerts marked read", body = MarkAllResponse))
)]
pub async fn mark_all_alerts_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<MarkAllResponse>> {
    require_permission(&state.pool, &auth, permissions::ALERTS_RESOLVE).await?;

    let count = alert_service::mark_all_alerts_read(&state.pool).await?;
    Ok(Json(MarkAllResponse { count }))
}
