mod common;

use anyhow::Result;
use axum::http::StatusCode;

#[tokio::test]
async fn health_endpoint_reports_db_ok() -> Result<()> {
    let test = common::setup().await?;

    let (status, body) = common::send(&test.app, "GET", "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK, "health endpoint did not return 200");

    let db_ok = body.get("db_ok").and_then(|b| b.as_bool()).unwrap_or(false);
    assert!(db_ok, "expected db_ok: true, got: {}", body);

    Ok(())
}
