#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    // keeps the sqlite file alive for the duration of the test
    _dir: TempDir,
}

/// Temp sqlite database, migrations applied, router built the same way
/// `main` builds it.
pub async fn setup() -> Result<TestApp> {
    setup_with_mailer(std::sync::Arc::new(almacen::mailer::LogMailer)).await
}

/// Same as `setup` but with an injected mail transport.
pub async fn setup_with_mailer(
    mailer: std::sync::Arc<dyn almacen::mailer::Mailer>,
) -> Result<TestApp> {
    let dir = tempfile::tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test.db");

    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"),
    )
    .await?;
    migrator.run(&pool).await?;

    std::env::set_var("JWT_SECRET", "test-secret");
    let app = almacen::create_app_with_mailer(pool.clone(), mailer).await?;

    Ok(TestApp {
        app,
        pool,
        _dir: dir,
    })
}

/// Fire one request and decode the JSON body (Null when empty).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body_json: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body_json {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let response: Response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), 10_485_760).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .with_context(|| format!("non-JSON body: {}", String::from_utf8_lossy(&bytes)))?
    };

    Ok((status, value))
}

/// Bootstrap registration: the first user becomes CEO.
/// Returns (token, user_id).
pub async fn register_ceo(app: &Router) -> Result<(String, String)> {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "name": "Root Admin",
            "email": "root@example.com",
            "password": "password123"
        })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "register failed: {}", body);

    let token = body
        .get("token")
        .and_then(|v| v.as_str())
        .context("missing token")?
        .to_string();
    let user_id = body
        .get("user")
        .and_then(|u| u.get("id"))
        .and_then(|v| v.as_str())
        .context("missing user id")?
        .to_string();

    Ok((token, user_id))
}

/// Create a user with the given role through /users, then log them in.
/// Returns (token, user_id).
pub async fn create_and_login(
    app: &Router,
    admin_token: &str,
    email: &str,
    role: &str,
) -> Result<(String, String)> {
    let (status, body) = send(
        app,
        "POST",
        "/users",
        Some(admin_token),
        Some(json!({
            "name": email,
            "email": email,
            "password": "password123",
            "role": role
        })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "user create failed: {}", body);
    let user_id = body
        .get("id")
        .and_then(|v| v.as_str())
        .context("missing user id")?
        .to_string();

    let (status, body) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": "password123" })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "login failed: {}", body);
    let token = body
        .get("token")
        .and_then(|v| v.as_str())
        .context("missing token")?
        .to_string();

    Ok((token, user_id))
}

/// Create a product and return its id.
pub async fn create_product(
    app: &Router,
    token: &str,
    sku: &str,
    stock: i64,
    min_stock: i64,
) -> Result<String> {
    let (status, body) = send(
        app,
        "POST",
        "/products",
        Some(token),
        Some(json!({
            "sku": sku,
            "name": format!("Product {}", sku),
            "price": 10.0,
            "cost": 4.0,
            "stock": stock,
            "min_stock": min_stock
        })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "product create failed: {}", body);

    body.get("id")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .context("missing product id")
}

/// Record a stock movement, returning the raw (status, body) pair so
/// callers can assert on failures too.
pub async fn post_movement(
    app: &Router,
    token: &str,
    product_id: &str,
    movement_type: &str,
    quantity: i64,
) -> Result<(StatusCode, Value)> {
    send(
        app,
        "POST",
        "/movements",
        Some(token),
        Some(json!({
            "product_id": product_id,
            "movement_type": movement_type,
            "quantity": quantity,
            "reason": "test movement"
        })),
    )
    .await
}
