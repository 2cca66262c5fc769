use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use feedback_backend::{
    auth::{password::hash_password, Role},
    config::AppConfig,
    db,
    models::{NewActionPlan, NewActionPlanItem, NewCheckIn, NewFeedback, NewTeam, NewUser},
    schema::{action_plan_items, action_plans, checkins, feedbacks, teams, users},
    status::{FeedbackStatus, PlanStatus},
};

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;
    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
    let mut conn = pool.get().context("failed to get database connection")?;

    let existing: i64 = users::table.count().get_result(&mut conn)?;
    if existing > 0 {
        println!("Database already contains {existing} users, nothing to seed.");
        return Ok(());
    }

    let team_id = Uuid::new_v4();
    diesel::insert_into(teams::table)
        .values(&NewTeam {
            id: team_id,
            name: "Platform".to_string(),
            company: "Bee It".to_string(),
            feedback_cadence_days: 30,
            description: Some("Demo team".to_string()),
        })
        .execute(&mut conn)?;

    let admin_id = insert_user(&mut conn, "Alice Admin", "admin@example.com", Role::Admin, None, None)?;
    let gestor_id = insert_user(
        &mut conn,
        "Gabriel Gestor",
        "gestor@example.com",
        Role::Gestor,
        Some(team_id),
        None,
    )?;
    let colaborador_id = insert_user(
        &mut conn,
        "Carla Colaboradora",
        "colaborador@example.com",
        Role::Colaborador,
        Some(team_id),
        Some(gestor_id),
    )?;

    let feedback_id = Uuid::new_v4();
    diesel::insert_into(feedbacks::table)
        .values(&NewFeedback {
            id: feedback_id,
            employee_id: colaborador_id,
            manager_id: gestor_id,
            feedback_date: Utc::now().naive_utc(),
            feedback_type: "1:1".to_string(),
            context: "Quarterly review of the onboarding project".to_string(),
            impact: "Shipped the onboarding flow ahead of schedule".to_string(),
            expectation: "Keep pairing with the newer team members".to_string(),
            strengths: vec!["ownership".to_string(), "clarity".to_string()],
            improvements: vec!["delegation".to_string()],
            next_feedback_date: Some((Utc::now() + Duration::days(30)).naive_utc()),
            status: FeedbackStatus::AwaitingAcknowledgment.as_str().to_string(),
            acknowledged: false,
            confidential: false,
        })
        .execute(&mut conn)?;

    // One item of two done, so the seeded plan shows derived progress.
    let plan_id = Uuid::new_v4();
    diesel::insert_into(action_plans::table)
        .values(&NewActionPlan {
            id: plan_id,
            feedback_id,
            objective: "Hand off two recurring tasks to the team".to_string(),
            deadline: (Utc::now() + Duration::days(45)).naive_utc(),
            responsible: "Employee".to_string(),
            status: PlanStatus::InProgress.as_str().to_string(),
            progress: 50,
        })
        .execute(&mut conn)?;
    diesel::insert_into(action_plan_items::table)
        .values(&vec![
            NewActionPlanItem {
                id: Uuid::new_v4(),
                plan_id,
                description: "Pick the tasks and write a short runbook".to_string(),
                item_deadline: Some((Utc::now() + Duration::days(14)).naive_utc()),
                completed: true,
            },
            NewActionPlanItem {
                id: Uuid::new_v4(),
                plan_id,
                description: "Shadow the handover for one sprint".to_string(),
                item_deadline: Some((Utc::now() + Duration::days(30)).naive_utc()),
                completed: false,
            },
        ])
        .execute(&mut conn)?;
    diesel::insert_into(checkins::table)
        .values(&NewCheckIn {
            id: Uuid::new_v4(),
            plan_id,
            checkin_date: Utc::now().naive_utc(),
            progress_rating: "Good".to_string(),
            comment: "Runbook reviewed, handover scheduled".to_string(),
            recorded_by: gestor_id,
        })
        .execute(&mut conn)?;

    println!("Seeded demo data:");
    println!("  admin:       admin@example.com / password ({admin_id})");
    println!("  gestor:      gestor@example.com / password ({gestor_id})");
    println!("  colaborador: colaborador@example.com / password ({colaborador_id})");
    Ok(())
}

fn insert_user(
    conn: &mut PgConnection,
    name: &str,
    email: &str,
    role: Role,
    team_id: Option<Uuid>,
    manager_id: Option<Uuid>,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    diesel::insert_into(users::table)
        .values(&NewUser {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password("password")?,
            role: role.as_str().to_string(),
            team_id,
            manager_id,
            active: true,
        })
        .execute(conn)
        .with_context(|| format!("failed to insert user {email}"))?;
    Ok(id)
}
