mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_vec, test_app, TestApp};
use feedback_backend::auth::Role;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Deserialize)]
struct FeedbackBody {
    id: Uuid,
    employee_name: Option<String>,
    status: String,
    acknowledged: bool,
    acknowledged_at: Option<String>,
    next_feedback_date: Option<String>,
}

async fn seed_org(app: &TestApp) -> Result<(Uuid, Uuid, Uuid)> {
    let team_id = app.insert_team("Platform", 30).await?;
    let gestor_id = app
        .insert_user("Gina", "gina@example.com", "pw", Role::Gestor, Some(team_id), None)
        .await?;
    let colaborador_id = app
        .insert_user(
            "Caio",
            "caio@example.com",
            "pw",
            Role::Colaborador,
            Some(team_id),
            Some(gestor_id),
        )
        .await?;
    Ok((team_id, gestor_id, colaborador_id))
}

async fn create_feedback(app: &TestApp, token: &str, employee_id: Uuid) -> Result<FeedbackBody> {
    let response = app
        .post_json(
            "/api/feedbacks",
            &json!({
                "employee_id": employee_id,
                "feedback_type": "1:1",
                "context": "Sprint retro",
                "impact": "Unblocked the release",
                "expectation": "Keep sharing findings early",
                "strengths": ["clarity"],
                "improvements": ["delegation"],
            }),
            Some(token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(serde_json::from_slice(
        &body_to_vec(response.into_body()).await?,
    )?)
}

#[tokio::test]
async fn create_uses_team_cadence_and_notifies_employee() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = test_app().await? else {
        return Ok(());
    };
    let (_, _, colaborador_id) = seed_org(&app).await?;
    let gestor_token = app.login_token("gina@example.com", "pw").await?;

    let feedback = create_feedback(&app, &gestor_token, colaborador_id).await?;
    assert_eq!(feedback.status, "Awaiting acknowledgment");
    assert!(!feedback.acknowledged);
    assert_eq!(feedback.employee_name.as_deref(), Some("Caio"));
    // Omitted due date falls back to the team's 30-day cadence.
    assert!(feedback.next_feedback_date.is_some());

    let colaborador_token = app.login_token("caio@example.com", "pw").await?;
    let response = app.get("/api/notifications", Some(&colaborador_token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let notifications: Vec<serde_json::Value> =
        serde_json::from_slice(&body_to_vec(response.into_body()).await?)?;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["kind"], "new_feedback");

    // The outbound email is fired on a background task.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let sent = app.mailer().sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "caio@example.com");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn colaborador_cannot_create_or_read_others_feedback() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = test_app().await? else {
        return Ok(());
    };
    let (team_id, gestor_id, colaborador_id) = seed_org(&app).await?;
    app.insert_user(
        "Otto",
        "otto@example.com",
        "pw",
        Role::Colaborador,
        Some(team_id),
        Some(gestor_id),
    )
    .await?;

    let gestor_token = app.login_token("gina@example.com", "pw").await?;
    let feedback = create_feedback(&app, &gestor_token, colaborador_id).await?;

    let otto_token = app.login_token("otto@example.com", "pw").await?;
    let response = app
        .post_json(
            "/api/feedbacks",
            &json!({
                "employee_id": colaborador_id,
                "feedback_type": "Praise",
                "context": "x",
                "impact": "x",
                "expectation": "x",
            }),
            Some(&otto_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .get(&format!("/api/feedbacks/{}", feedback.id), Some(&otto_token))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Listing only ever returns Otto's own records.
    let response = app.get("/api/feedbacks", Some(&otto_token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let listed: Vec<FeedbackBody> =
        serde_json::from_slice(&body_to_vec(response.into_body()).await?)?;
    assert!(listed.is_empty());

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn only_designated_employee_acknowledges() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = test_app().await? else {
        return Ok(());
    };
    let (_, _, colaborador_id) = seed_org(&app).await?;
    let gestor_token = app.login_token("gina@example.com", "pw").await?;
    let feedback = create_feedback(&app, &gestor_token, colaborador_id).await?;

    // The authoring manager is not the designated employee.
    let response = app
        .post_json(
            &format!("/api/feedbacks/{}/acknowledge", feedback.id),
            &json!({}),
            Some(&gestor_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let colaborador_token = app.login_token("caio@example.com", "pw").await?;
    let response = app
        .post_json(
            &format!("/api/feedbacks/{}/acknowledge", feedback.id),
            &json!({}),
            Some(&colaborador_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let acked: FeedbackBody = serde_json::from_slice(&body_to_vec(response.into_body()).await?)?;
    assert!(acked.acknowledged);
    assert!(acked.acknowledged_at.is_some());
    assert_eq!(acked.status, "On track");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn invalid_feedback_type_rejected() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = test_app().await? else {
        return Ok(());
    };
    let (_, _, colaborador_id) = seed_org(&app).await?;
    let gestor_token = app.login_token("gina@example.com", "pw").await?;

    let response = app
        .post_json(
            "/api/feedbacks",
            &json!({
                "employee_id": colaborador_id,
                "feedback_type": "Vibes",
                "context": "x",
                "impact": "x",
                "expectation": "x",
            }),
            Some(&gestor_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn admin_delete_cascades_plans_items_and_checkins() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = test_app().await? else {
        return Ok(());
    };
    let (_, _, colaborador_id) = seed_org(&app).await?;
    app.insert_user("Root", "root@example.com", "pw", Role::Admin, None, None)
        .await?;

    let gestor_token = app.login_token("gina@example.com", "pw").await?;
    let feedback = create_feedback(&app, &gestor_token, colaborador_id).await?;

    let response = app
        .post_json(
            "/api/action-plans",
            &json!({
                "feedback_id": feedback.id,
                "objective": "Improve delegation",
                "deadline": "2030-01-01T00:00:00Z",
                "responsible": "Employee",
            }),
            Some(&gestor_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let plan: serde_json::Value = serde_json::from_slice(&body_to_vec(response.into_body()).await?)?;
    let plan_id = plan["id"].as_str().unwrap().to_string();

    let response = app
        .post_json(
            "/api/action-plan-items",
            &json!({"plan_id": plan_id, "description": "Run a pairing session"}),
            Some(&gestor_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let response = app
        .post_json(
            "/api/checkins",
            &json!({"plan_id": plan_id, "progress_rating": "Good", "comment": "going well"}),
            Some(&gestor_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    // Managers cannot delete; admins can.
    let response = app
        .delete(&format!("/api/feedbacks/{}", feedback.id), Some(&gestor_token))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin_token = app.login_token("root@example.com", "pw").await?;
    let response = app
        .delete(&format!("/api/feedbacks/{}", feedback.id), Some(&admin_token))
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .get(&format!("/api/action-plans/{plan_id}"), Some(&admin_token))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app
        .get(&format!("/api/checkins?plan_id={plan_id}"), Some(&admin_token))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let checkins: Vec<serde_json::Value> =
        serde_json::from_slice(&body_to_vec(response.into_body()).await?)?;
    assert!(checkins.is_empty());

    // Deleting again reports the record as gone.
    let response = app
        .delete(&format!("/api/feedbacks/{}", feedback.id), Some(&admin_token))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.cleanup().await?;
    Ok(())
}
