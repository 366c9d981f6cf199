mod alerts;
mod app;
mod authz;
mod config;
mod db;
mod errors;
mod inventory;
mod jwt;
mod mailer;
mod models;
mod routes;
mod utils;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::auth::register,
        routes::auth::login,
        routes::auth::me,
        routes::auth::logout,
        routes::products::list_products,
        routes::products::create_product,
        routes::products::get_product,
        routes::products::update_product,
        routes::products::delete_product,
        routes::categories::list_categories,
        routes::categories::create_category,
        routes::categories::get_category,
        routes::categories::update_category,
        routes::categories::delete_category,
        routes::movements::list_movements,
        routes::movements::create_movement,
        routes::alerts::list_alerts,
        routes::alerts::mark_alert_read,
        routes::alerts::mark_all_alerts_read,
        routes::notifications::list_notifications,
        routes::notifications::create_notification,
        routes::notifications::mark_notification_read,
        routes::notifications::mark_all_notifications_read,
        routes::users::list_users,
        routes::users::create_user,
        routes::users::get_user,
        routes::users::update_user,
        routes::users::delete_user,
        routes::users::set_permission_overrides,
        routes::cron::run_scheduled_tasks
    ),
    components(
        schemas(
            authz::Role,
            models::user::User,
            models::user::AuthResponse,
            models::user::LoginRequest,
            models::user::RegisterRequest,
            models::user::UserCreateRequest,
            models::user::UserUpdateRequest,
            models::user::PermissionOverridesRequest,
            models::category::Category,
            models::category::CategoryCreateRequest,
            models::category::CategoryUpdateRequest,
            models::product::Product,
            models::product::ProductCreateRequest,
            models::product::ProductUpdateRequest,
            models::movement::MovementType,
            models::movement::StockMovement,
            models::movement::MovementCreateRequest,
            models::alert::Alert,
            models::alert::AlertType,
            models::alert::AlertStatus,
            models::notification::Notification,
            models::notification::NotificationType,
            models::notification::NotificationStatus,
            models::notification::Priority,
            models::notification::NotificationCreateRequest,
            models::notification::MarkAllResponse,
            routes::cron::SweepResponse
        )
    ),
    tags(
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Product catalog"),
        (name = "Categories", description = "Product categories"),
        (name = "Movements", description = "Stock movement ledger"),
        (name = "Alerts", description = "Inventory alerts"),
        (name = "Notifications", description = "User notifications"),
        (name = "Users", description = "User administration"),
        (name = "Cron", description = "Scheduled tasks"),
        (name = "Health", description = "Service health")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    init_tracing();

    let pool = db::init().await?;
    let app = app::create_app(pool).await?;

    let app = app.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let port = std::env::var("APP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8000);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
