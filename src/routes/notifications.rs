use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::alerts as alert_service;
use crate::app::AppState;
use crate::authz::{permissions, require_permission, Principal};
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::models::notification::{
    DbNotification, MarkAllResponse, Notification, NotificationCreateRequest,
    NotificationListQuery, DB_NOTIFICATION_COLUMNS,
};
use crate::models::{Page, PageQuery};

#[utoipa::path(
    get,
    path = "/notifications",
    tag = "Notifications",
    responses((status = 200, description = "List own notifications, paginated"))
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<NotificationListQuery>,
) -> AppResult<Json<Page<Notification>>> {
    let principal =
        require_permission(&state.pool, &auth, permissions::NOTIFICATIONS_VIEW).await?;

    let paging = PageQuery {
        page: query.page,
        limit: query.limit,
    };

    // Always scoped to the caller; there is no cross-user listing.
    let mut where_clause = String::from("user_id = ?");
    if query.status.is_some() {
        where_clause.push_str(" AND status = ?");
    }
    if query.notification_type.is_some() {
        where_clause.push_str(" AND notification_type = ?");
    }
    if query.search.is_some() {
        where_clause.push_str(" AND (title LIKE ? OR message LIKE ?)");
    }

    let search_pattern = query.search.as_ref().map(|s| format!("%{s}%"));
    let user_id = principal.user_id.to_string();

    let count_sql = format!("SELECT COUNT(1) FROM notifications WHERE {where_clause}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(&user_id);
    if let Some(status) = query.status.as_ref() {
        count_query = count_query.bind(status);
    }
    if let Some(notification_type) = query.notification_type.as_ref() {
        count_query = count_query.bind(notification_type);
    }
    if let Some(pattern) = search_pattern.as_ref() {
        count_query = count_query.bind(pattern).bind(pattern);
    }
    let total = count_query.fetch_one(&state.pool).await?;

    let list_sql = format!(
        "SELECT {DB_NOTIFICATION_COLUMNS} FROM notifications WHERE {where_clause} ORDER BY created_at DESC LIMIT ? OFFSET ?",
    );
    let mut list_query = sqlx::query_as::<_, DbNotification>(&list_sql).bind(&user_id);
    if let Some(status) = query.status.as_ref() {
        list_query = list_query.bind(status);
    }
    if let Some(notification_type) = query.notification_type.as_ref() {
        list_query = list_query.bind(notification_type);
    }
    if let Some(pattern) = search_pattern.as_ref() {
        list_query = list_query.bind(pattern).bind(pattern);
    }
    let rows = list_query
        .bind(paging.limit())
        .bind(paging.offset())
        .fetch_all(&state.pool)
        .await?;

    let items: Vec<Notification> = rows
        .into_iter()
        .map(Notification::try_from)
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
    path = "/notifications",
    tag = "Notifications",
    request_body = NotificationCreateRequest,
    responses((status = 201, description = "Notification created", body = Notification))
)]
pub async fn create_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<NotificationCreateRequest>,
) -> AppResult<(StatusCode, Json<Notification>)> {
    let principal: Principal =
        require_permission(&state.pool, &auth, permissions::NOTIFICATIONS_CREATE).await?;

    let notification = alert_service::create_notification(
        &state.pool,
        &state.config,
        state.mailer.as_ref(),
        &payload,
        Some(principal.user_id),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(notification)))
}

#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification marked read", body = Notification),
        (status = 404, description = "Not found in the caller's scope")
    )
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Notification>> {
    let principal =
        require_permission(&state.pool, &auth, permissions::NOTIFICATIONS_VIEW).await?;

    let notification =
        alert_service::mark_notification_read(&state.pool, id, principal.user_id).await?;
    Ok(Json(notification))
}

#[utoipa::path(
    post,
    path = "/notifications/read-all",
    tag = "Notifications",
    responses((status = 200, description = "Unread notifications marked read", body = MarkAllResponse))
)]
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<MarkAllResponse>> {
    let principal =
        require_permission(&state.pool, &auth, permissions::NOTIFICATIONS_VIEW).await?;

    let count =
        alert_service::mark_all_notifications_read(&state.pool, principal.user_id).await?;
    Ok(Json(MarkAllResponse { count }))
}
