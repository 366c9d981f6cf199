use std::sync::Arc;

use axum::http::Method;
use axum::routing::{delete, get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::mailer::{LogMailer, Mailer};
use crate::routes::{alerts, auth, categories, cron, health, movements, notifications, products, users};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<AppConfig>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            mailer,
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    create_app_with_mailer(pool, Arc::new(LogMailer)).await
}

/// Composition root used by `main` and, with a fake mailer, by tests.
pub async fn create_app_with_mailer(
    pool: SqlitePool,
    mailer: Arc<dyn Mailer>,
) -> Result<Router, AppError> {
    let config = AppConfig::from_env()?;
    let state = AppState::new(pool, config, mailer);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout));

    let product_routes = Router::new()
        .route("/", get(products::list_products))
        .route("/", post(products::create_product))
        .route("/:id", get(products::get_product))
        .route("/:id", put(products::update_product))
        .route("/:id", delete(products::delete_product));

    let category_routes = Router::new()
        .route("/", get(categories::list_categories))
        .route("/", post(categories::create_category))
        .route("/:id", get(categories::get_category))
        .route("/:id", put(categories::update_category))
        .route("/:id", delete(categories::delete_category));

    let movement_routes = Router::new()
        .route("/", get(movements::list_movements))
        .route("/", post(movements::create_movement));

    let alert_routes = Router::new()
        .route("/", get(alerts::list_alerts))
        .route("/read-all", post(alerts::mark_all_alerts_read))
        .route("/:id/read", post(alerts::mark_alert_read));

    let notification_routes = Router::new()
        .route("/", get(notifications::list_notifications))
        .route("/", post(notifications::create_notification))
        .route("/read-all", post(notifications::mark_all_notifications_read))
        .route("/:id/read", post(notifications::mark_notification_read));

    let user_routes = Router::new()
        .route("/", get(users::list_users))
        .route("/", post(users::create_user))
        .route("/:id", get(users::get_user))
        .route("/:id", put(users::update_user))
        .route("/:id", delete(users::delete_user))
        .route("/:id/permissions", put(users::set_permission_overrides));

    let router = Router::new()
        .route("/health", get(health::health))
        .route("/cron/run", post(cron::run_scheduled_tasks))
        .nest("/auth", auth_routes)
        .nest("/products", product_routes)
        .nest("/categories", category_routes)
        .nest("/movements", movement_routes)
        .nest("/alerts", alert_routes)
        .nest("/notifications", notification_routes)
        .nest("/users", user_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
