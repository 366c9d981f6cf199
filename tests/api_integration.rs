mod common;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn full_api_flow() -> Result<()> {
    let test = common::setup().await?;

    // -- bootstrap
    let (token, _user_id) = common::register_ceo(&test.app).await?;

    // -- category
    let (status, body) = common::send(
        &test.app,
        "POST",
        "/categories",
        Some(&token),
        Some(json!({ "name": "Bebidas", "description": "Liquids" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "category create failed: {}", body);
    let category_id = body
        .get("id")
        .and_then(|v| v.as_str())
        .context("missing category id")?
        .to_string();

    // Duplicate category name is a conflict.
    let (status, _) = common::send(
        &test.app,
        "POST",
        "/categories",
        Some(&token),
        Some(json!({ "name": "Bebidas" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // -- product in the category
    let (status, body) = common::send(
        &test.app,
        "POST",
        "/products",
        Some(&token),
        Some(json!({
            "sku": "BEB-001",
            "name": "Agua mineral 1L",
            "price": 1.5,
            "cost": 0.6,
            "stock": 10,
            "min_stock": 4,
            "category_id": category_id
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "product create failed: {}", body);
    let product_id = body
        .get("id")
        .and_then(|v| v.as_str())
        .context("missing product id")?
        .to_string();

    // Duplicate SKU is a conflict.
    let (status, _) = common::send(
        &test.app,
        "POST",
        "/products",
        Some(&token),
        Some(json!({ "sku": "BEB-001", "name": "Other", "price": 1.0, "cost": 0.5 })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // -- receive and sell stock
    let (status, _) = common::post_movement(&test.app, &token, &product_id, "IN", 2).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = common::post_movement(&test.app, &token, &product_id, "OUT", 8).await?;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    assert_eq!(body.get("new_stock").and_then(|v| v.as_i64()), Some(4));

    // 4 <= min_stock 4: the sale left a WARNING alert behind.
    let (status, body) = common::send(
        &test.app,
        "GET",
        "/alerts?status=UNREAD",
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.get("total").and_then(|v| v.as_i64()), Some(1));
    let items = body.get("items").and_then(|v| v.as_array()).unwrap();
    assert_eq!(
        items[0].get("alert_type").and_then(|v| v.as_str()),
        Some("WARNING")
    );

    // ...and a stock notification in the inbox.
    let (status, body) = common::send(
        &test.app,
        "GET",
        "/notifications?notification_type=STOCK_ALERT",
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.get("total").and_then(|v| v.as_i64()), Some(1));

    // -- resolve the alert
    let (status, body) =
        common::send(&test.app, "POST", "/alerts/read-all", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.get("count").and_then(|v| v.as_u64()), Some(1));

    // -- movement ledger
    let (status, body) = common::send(
        &test.app,
        "GET",
        &format!("/movements?product_id={}", product_id),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.get("total").and_then(|v| v.as_i64()), Some(2));

    // -- soft delete the product
    let (status, _) = common::send(
        &test.app,
        "DELETE",
        &format!("/products/{}", product_id),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = common::send(
        &test.app,
        "GET",
        &format!("/products/{}", product_id),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // History outlives the product row.
    let (status, body) = common::send(
        &test.app,
        "GET",
        &format!("/movements?product_id={}", product_id),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.get("total").and_then(|v| v.as_i64()), Some(2));

    // -- category cleanup
    let (status, _) = common::send(
        &test.app,
        "DELETE",
        &format!("/categories/{}", category_id),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    Ok(())
}

#[tokio::test]
async fn unique_index_race_maps_to_conflict() -> Result<()> {
    let test = common::setup().await?;

    let insert = "INSERT INTO categories (id, name, description, created_at, updated_at, deleted_at) \
                  VALUES (?, 'Bebidas', NULL, ?, ?, NULL)";
    let now = chrono::Utc::now();
    sqlx::query(insert)
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(now)
        .bind(now)
        .execute(&test.pool)
        .await?;

    // Two creates racing past the availability pre-check end up here: the
    // second insert trips the unique index at the store level.
    let err = sqlx::query(insert)
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(now)
        .bind(now)
        .execute(&test.pool)
        .await
        .unwrap_err();

    let app_err = almacen::errors::AppError::from(err);
    assert!(
        matches!(app_err, almacen::errors::AppError::Conflict(_)),
        "expected Conflict, got: {app_err}"
    );

    Ok(())
}
