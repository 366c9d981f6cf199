mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn vendedor_cannot_delete_users() -> Result<()> {
    let test = common::setup().await?;
    let (ceo_token, ceo_id) = common::register_ceo(&test.app).await?;
    let (vend_token, _) =
        common::create_and_login(&test.app, &ceo_token, "vendedor@example.com", "VENDEDOR").await?;

    let (status, _) = common::send(
        &test.app,
        "DELETE",
        &format!("/users/{}", ceo_id),
        Some(&vend_token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The target must be untouched.
    let (status, body) = common::send(&test.app, "GET", "/auth/me", Some(&ceo_token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.get("is_active").and_then(|v| v.as_bool()), Some(true));

    Ok(())
}

#[tokio::test]
async fn vendedor_cannot_list_users() -> Result<()> {
    let test = common::setup().await?;
    let (ceo_token, _) = common::register_ceo(&test.app).await?;
    let (vend_token, _) =
        common::create_and_login(&test.app, &ceo_token, "vendedor@example.com", "VENDEDOR").await?;

    let (status, _) = common::send(&test.app, "GET", "/users", Some(&vend_token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn movement_types_are_gated_per_role() -> Result<()> {
    let test = common::setup().await?;
    let (ceo_token, _) = common::register_ceo(&test.app).await?;
    let (vend_token, _) =
        common::create_and_login(&test.app, &ceo_token, "vendedor@example.com", "VENDEDOR").await?;
    let product_id = common::create_product(&test.app, &ceo_token, "SKU-GATE", 100, 5).await?;

    // VENDEDOR may register sales (OUT) but not receive stock (IN).
    let (status, _) = common::post_movement(&test.app, &vend_token, &product_id, "OUT", 1).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = common::post_movement(&test.app, &vend_token, &product_id, "IN", 1).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // MANAGER holds the full movement set.
    let (mgr_token, _) =
        common::create_and_login(&test.app, &ceo_token, "manager@example.com", "MANAGER").await?;
    let (status, _) = common::post_movement(&test.app, &mgr_token, &product_id, "IN", 10).await?;
    assert_eq!(status, StatusCode::CREATED);

    Ok(())
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() -> Result<()> {
    let test = common::setup().await?;
    common::register_ceo(&test.app).await?;

    for uri in ["/products", "/categories", "/movements", "/alerts", "/users"] {
        let (status, _) = common::send(&test.app, "GET", uri, None, None).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "uri: {}", uri);
    }

    Ok(())
}

#[tokio::test]
async fn admin_cannot_assign_ceo_role() -> Result<()> {
    let test = common::setup().await?;
    let (ceo_token, _) = common::register_ceo(&test.app).await?;
    let (admin_token, _) =
        common::create_and_login(&test.app, &ceo_token, "admin@example.com", "ADMIN").await?;

    let (status, _) = common::send(
        &test.app,
        "POST",
        "/users",
        Some(&admin_token),
        Some(json!({
            "name": "Pretender",
            "email": "pretender@example.com",
            "password": "password123",
            "role": "CEO"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Within its bounds the assignment works.
    let (status, _) = common::send(
        &test.app,
        "POST",
        "/users",
        Some(&admin_token),
        Some(json!({
            "name": "Clerk",
            "email": "clerk@example.com",
            "password": "password123",
            "role": "VENDEDOR"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    Ok(())
}

#[tokio::test]
async fn only_ceo_manages_permission_overrides() -> Result<()> {
    let test = common::setup().await?;
    let (ceo_token, _) = common::register_ceo(&test.app).await?;
    let (admin_token, _) =
        common::create_and_login(&test.app, &ceo_token, "admin@example.com", "ADMIN").await?;
    let (vend_token, vend_id) =
        common::create_and_login(&test.app, &ceo_token, "vendedor@example.com", "VENDEDOR").await?;

    let overrides = json!({ "overrides": { "reports.view": true } });

    let (status, _) = common::send(
        &test.app,
        "PUT",
        &format!("/users/{}/permissions", vend_id),
        Some(&admin_token),
        Some(overrides.clone()),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = common::send(
        &test.app,
        "PUT",
        &format!("/users/{}/permissions", vend_id),
        Some(&ceo_token),
        Some(overrides),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body.get("permission_overrides")
            .and_then(|m| m.get("reports.view"))
            .and_then(|v| v.as_bool()),
        Some(true)
    );

    // Overrides widen dashboard-style checks but never the strict route
    // guard: the role table still denies users.view.
    let (status, _) = common::send(&test.app, "GET", "/users", Some(&vend_token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn user_cannot_delete_own_account() -> Result<()> {
    let test = common::setup().await?;
    let (ceo_token, ceo_id) = common::register_ceo(&test.app).await?;

    let (status, _) = common::send(
        &test.app,
        "DELETE",
        &format!("/users/{}", ceo_id),
        Some(&ceo_token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}
