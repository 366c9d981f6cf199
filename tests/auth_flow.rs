mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn first_registration_bootstraps_ceo_then_closes() -> Result<()> {
    let test = common::setup().await?;

    let (token, _) = common::register_ceo(&test.app).await?;

    let (status, body) = common::send(&test.app, "GET", "/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.get("role").and_then(|v| v.as_str()), Some("CEO"));

    // Second registration must be rejected; users are created via /users now.
    let (status, _) = common::send(
        &test.app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "name": "Second",
            "email": "second@example.com",
            "password": "password123"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn login_rejects_wrong_password() -> Result<()> {
    let test = common::setup().await?;
    common::register_ceo(&test.app).await?;

    let (status, _) = common::send(
        &test.app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "root@example.com", "password": "not-the-password" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn deactivated_user_cannot_login_or_act() -> Result<()> {
    let test = common::setup().await?;
    let (ceo_token, _) = common::register_ceo(&test.app).await?;
    let (vend_token, vend_id) =
        common::create_and_login(&test.app, &ceo_token, "vendedor@example.com", "VENDEDOR").await?;

    let (status, _) = common::send(
        &test.app,
        "PUT",
        &format!("/users/{}", vend_id),
        Some(&ceo_token),
        Some(json!({ "is_active": false })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::send(
        &test.app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "vendedor@example.com", "password": "password123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // An existing token must stop resolving to a principal as well.
    let (status, _) = common::send(&test.app, "GET", "/products", Some(&vend_token), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn me_requires_token() -> Result<()> {
    let test = common::setup().await?;
    common::register_ceo(&test.app).await?;

    let (status, _) = common::send(&test.app, "GET", "/auth/me", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::send(&test.app, "GET", "/auth/me", Some("garbage-token"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() -> Result<()> {
    let test = common::setup().await?;
    let (ceo_token, _) = common::register_ceo(&test.app).await?;
    common::create_and_login(&test.app, &ceo_token, "dup@example.com", "MANAGER").await?;

    let (status, body) = common::send(
        &test.app,
        "POST",
        "/users",
        Some(&ceo_token),
        Some(json!({
            "name": "Dup",
            "email": "dup@example.com",
            "password": "password123",
            "role": "VENDEDOR"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT, "body: {}", body);

    Ok(())
}
