mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_vec, test_app};
use feedback_backend::auth::Role;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct MeResponse {
    email: String,
    role: String,
    created_at: String,
}

#[tokio::test]
async fn login_and_me_roundtrip() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = test_app().await? else {
        return Ok(());
    };

    let password = "s3cret";
    app.insert_user("Alice", "alice@example.com", password, Role::Admin, None, None)
        .await?;

    let token = app.login_token("alice@example.com", password).await?;

    let response = app.get("/api/auth/me", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_vec(response.into_body()).await?;
    let user: MeResponse = serde_json::from_slice(&body)?;

    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.role, "ADMIN");
    // Timestamps go out in RFC 3339 like every other endpoint.
    assert!(chrono::DateTime::parse_from_rfc3339(&user.created_at).is_ok());

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn login_rejects_wrong_password_and_unknown_email() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = test_app().await? else {
        return Ok(());
    };

    app.insert_user("Bob", "bob@example.com", "right", Role::Colaborador, None, None)
        .await?;

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({"email": "bob@example.com", "password": "wrong"}),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({"email": "ghost@example.com", "password": "whatever"}),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn deactivated_account_cannot_login() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = test_app().await? else {
        return Ok(());
    };

    app.insert_user("Admin", "admin@example.com", "pw", Role::Admin, None, None)
        .await?;
    let target = app
        .insert_user("Carol", "carol@example.com", "pw", Role::Colaborador, None, None)
        .await?;

    let admin_token = app.login_token("admin@example.com", "pw").await?;
    let response = app
        .put_json(
            &format!("/api/users/{target}"),
            &json!({"active": false}),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({"email": "carol@example.com", "password": "pw"}),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn me_requires_bearer_token() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = test_app().await? else {
        return Ok(());
    };

    let response = app.get("/api/auth/me", None).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.get("/api/auth/me", Some("not-a-token")).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await?;
    Ok(())
}
