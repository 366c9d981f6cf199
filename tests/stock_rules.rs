mod common;

use anyhow::Result;
use axum::http::StatusCode;

async fn product_stock(test: &common::TestApp, token: &str, product_id: &str) -> Result<i64> {
    let (status, body) = common::send(
        &test.app,
        "GET",
        &format!("/products/{}", product_id),
        Some(token),
        None,
    )
    .await?;
    anyhow::ensure!(status == StatusCode::OK, "product fetch failed: {}", body);
    body.get("stock")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| anyhow::anyhow!("missing stock in {}", body))
}

#[tokio::test]
async fn in_and_out_move_stock_with_snapshots() -> Result<()> {
    let test = common::setup().await?;
    let (token, _) = common::register_ceo(&test.app).await?;
    let product_id = common::create_product(&test.app, &token, "SKU-0001", 10, 2).await?;

    let (status, body) = common::post_movement(&test.app, &token, &product_id, "IN", 5).await?;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    assert_eq!(body.get("previous_stock").and_then(|v| v.as_i64()), Some(10));
    assert_eq!(body.get("new_stock").and_then(|v| v.as_i64()), Some(15));

    let (status, body) = common::post_movement(&test.app, &token, &product_id, "OUT", 3).await?;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    assert_eq!(body.get("previous_stock").and_then(|v| v.as_i64()), Some(15));
    assert_eq!(body.get("new_stock").and_then(|v| v.as_i64()), Some(12));

    assert_eq!(product_stock(&test, &token, &product_id).await?, 12);

    Ok(())
}

#[tokio::test]
async fn out_exceeding_stock_is_rejected_without_side_effects() -> Result<()> {
    let test = common::setup().await?;
    let (token, _) = common::register_ceo(&test.app).await?;
    let product_id = common::create_product(&test.app, &token, "SKU-0002", 4, 0).await?;

    let (status, body) = common::post_movement(&test.app, &token, &product_id, "OUT", 5).await?;
    assert_eq!(status, StatusCode::CONFLICT, "body: {}", body);
    assert_eq!(
        body.get("error").and_then(|v| v.as_str()),
        Some("insufficient_stock")
    );

    // Stock untouched, no movement row recorded.
    assert_eq!(product_stock(&test, &token, &product_id).await?, 4);
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(1) FROM stock_movements WHERE product_id = ?")
            .bind(&product_id)
            .fetch_one(&test.pool)
            .await?;
    assert_eq!(count, 0);

    // Draining exactly to zero is allowed.
    let (status, _) = common::post_movement(&test.app, &token, &product_id, "OUT", 4).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product_stock(&test, &token, &product_id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn adjustment_sets_absolute_stock() -> Result<()> {
    let test = common::setup().await?;
    let (token, _) = common::register_ceo(&test.app).await?;
    let product_id = common::create_product(&test.app, &token, "SKU-0003", 10, 2).await?;

    // Quantity is the target stock, not a delta.
    let (status, body) =
        common::post_movement(&test.app, &token, &product_id, "ADJUSTMENT", 3).await?;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    assert_eq!(body.get("previous_stock").and_then(|v| v.as_i64()), Some(10));
    assert_eq!(body.get("new_stock").and_then(|v| v.as_i64()), Some(3));
    assert_eq!(product_stock(&test, &token, &product_id).await?, 3);

    let (status, body) =
        common::post_movement(&test.app, &token, &product_id, "ADJUSTMENT", 40).await?;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    assert_eq!(body.get("new_stock").and_then(|v| v.as_i64()), Some(40));
    assert_eq!(product_stock(&test, &token, &product_id).await?, 40);

    Ok(())
}

#[tokio::test]
async fn non_positive_quantities_are_rejected() -> Result<()> {
    let test = common::setup().await?;
    let (token, _) = common::register_ceo(&test.app).await?;
    let product_id = common::create_product(&test.app, &token, "SKU-0004", 10, 2).await?;

    for quantity in [0, -5] {
        let (status, _) =
            common::post_movement(&test.app, &token, &product_id, "IN", quantity).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "quantity: {}", quantity);
    }

    assert_eq!(product_stock(&test, &token, &product_id).await?, 10);

    Ok(())
}

#[tokio::test]
async fn product_update_never_writes_stock() -> Result<()> {
    let test = common::setup().await?;
    let (token, _) = common::register_ceo(&test.app).await?;
    let product_id = common::create_product(&test.app, &token, "SKU-0005", 7, 2).await?;

    // A stock field in the update payload is ignored; the field is only
    // writable through the movement endpoint.
    let (status, body) = common::send(
        &test.app,
        "PUT",
        &format!("/products/{}", product_id),
        Some(&token),
        Some(serde_json::json!({ "name": "Renamed", "stock": 999 })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body.get("name").and_then(|v| v.as_str()), Some("Renamed"));
    assert_eq!(body.get("stock").and_then(|v| v.as_i64()), Some(7));

    Ok(())
}

#[tokio::test]
async fn negative_price_or_cost_is_rejected() -> Result<()> {
    let test = common::setup().await?;
    let (token, _) = common::register_ceo(&test.app).await?;

    let (status, _) = common::send(
        &test.app,
        "POST",
        "/products",
        Some(&token),
        Some(serde_json::json!({
            "sku": "SKU-NEG",
            "name": "Bad price",
            "price": -1.0,
            "cost": 0.5
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let product_id = common::create_product(&test.app, &token, "SKU-NEG", 5, 0).await?;

    let (status, _) = common::send(
        &test.app,
        "PUT",
        &format!("/products/{}", product_id),
        Some(&token),
        Some(serde_json::json!({ "cost": -2.0 })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn movement_list_filters_by_product_and_type() -> Result<()> {
    let test = common::setup().await?;
    let (token, _) = common::register_ceo(&test.app).await?;
    let first = common::create_product(&test.app, &token, "SKU-0006", 20, 2).await?;
    let second = common::create_product(&test.app, &token, "SKU-0007", 20, 2).await?;

    common::post_movement(&test.app, &token, &first, "IN", 5).await?;
    common::post_movement(&test.app, &token, &first, "OUT", 2).await?;
    common::post_movement(&test.app, &token, &second, "OUT", 1).await?;

    let (status, body) = common::send(
        &test.app,
        "GET",
        &format!("/movements?product_id={}", first),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.get("total").and_then(|v| v.as_i64()), Some(2));

    let (status, body) = common::send(
        &test.app,
        "GET",
        &format!("/movements?product_id={}&movement_type=OUT", first),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.get("total").and_then(|v| v.as_i64()), Some(1));
    let items = body.get("items").and_then(|v| v.as_array()).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].get("movement_type").and_then(|v| v.as_str()),
        Some("OUT")
    );

    Ok(())
}
