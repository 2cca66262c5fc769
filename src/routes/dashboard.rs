use std::collections::{HashMap, HashSet};

use axum::{extract::State, Json};
use chrono::{Duration, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, Role};
use crate::error::{AppError, AppResult};
use crate::models::Feedback;
use crate::schema::{action_plans, feedbacks, teams, users};
use crate::state::AppState;
use crate::status::{self, FeedbackStatus, PlanStatus};

use super::feedbacks::{load_user_names, to_feedback_response, FeedbackResponse, FEEDBACK_TYPES};

const RECENT_LIMIT: i64 = 5;
const STALE_WINDOW_DAYS: i64 = 90;

#[derive(Serialize)]
pub struct GestorDashboard {
    pub total_members: usize,
    pub overdue_feedbacks: usize,
    pub due_within_7_days: usize,
    pub due_within_30_days: usize,
    pub members_without_recent_feedback: usize,
    pub awaiting_acknowledgment: usize,
    pub overdue_plans: i64,
    pub recent_feedbacks: Vec<FeedbackResponse>,
}

#[derive(Serialize)]
pub struct ColaboradorDashboard {
    pub total_feedbacks: usize,
    pub pending_acknowledgment: usize,
    pub active_plans: i64,
    pub overdue_plans: i64,
    pub next_feedback_date: Option<String>,
    pub recent_feedbacks: Vec<FeedbackResponse>,
}

#[derive(Serialize)]
pub struct AdminDashboard {
    pub total_admins: i64,
    pub total_gestores: i64,
    pub total_colaboradores: i64,
    pub total_teams: i64,
    pub total_feedbacks: usize,
    pub overdue_feedbacks: usize,
    pub awaiting_acknowledgment: usize,
    pub total_plans: i64,
    pub overdue_plans: i64,
    pub completed_plans: i64,
    pub feedbacks_by_type: HashMap<String, usize>,
}

fn derived_status(feedback: &Feedback, now: NaiveDateTime) -> FeedbackStatus {
    status::feedback_status(feedback.acknowledged, feedback.next_feedback_date, now)
}

fn due_within(feedback: &Feedback, now: NaiveDateTime, days: i64) -> bool {
    match feedback.next_feedback_date {
        Some(due) => due >= now && due <= now + Duration::days(days),
        None => false,
    }
}

fn overdue_plan_count(conn: &mut PgConnection, now: NaiveDateTime) -> AppResult<i64> {
    let count = action_plans::table
        .filter(action_plans::deadline.lt(now))
        .filter(action_plans::status.ne(PlanStatus::Completed.as_str()))
        .count()
        .get_result(conn)?;
    Ok(count)
}

pub async fn gestor_dashboard(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> AppResult<Json<GestorDashboard>> {
    let mut conn = state.db()?;

    // Administrators get the org-wide view over every collaborator.
    let member_ids: Vec<Uuid> = match caller.role {
        Role::Gestor => users::table
            .filter(users::manager_id.eq(caller.id))
            .select(users::id)
            .load(&mut conn)?,
        Role::Admin => users::table
            .filter(users::role.eq(Role::Colaborador.as_str()))
            .select(users::id)
            .load(&mut conn)?,
        Role::Colaborador => {
            return Err(AppError::forbidden(
                "manager or administrator access required",
            ));
        }
    };

    let now = Utc::now().naive_utc();
    let rows: Vec<Feedback> = feedbacks::table
        .filter(feedbacks::employee_id.eq_any(&member_ids))
        .order(feedbacks::feedback_date.desc())
        .load(&mut conn)?;

    let overdue_feedbacks = rows
        .iter()
        .filter(|feedback| derived_status(feedback, now) == FeedbackStatus::Overdue)
        .count();
    // Disjoint from the overdue bucket: past-due unacknowledged feedback
    // derives to Overdue, not Awaiting.
    let awaiting_acknowledgment = rows
        .iter()
        .filter(|feedback| {
            derived_status(feedback, now) == FeedbackStatus::AwaitingAcknowledgment
        })
        .count();
    let due_within_7_days = rows
        .iter()
        .filter(|feedback| due_within(feedback, now, 7))
        .count();
    let due_within_30_days = rows
        .iter()
        .filter(|feedback| due_within(feedback, now, 30))
        .count();

    // Single distinct query instead of one probe per member.
    let cutoff = now - Duration::days(STALE_WINDOW_DAYS);
    let recently_covered: HashSet<Uuid> = feedbacks::table
        .filter(feedbacks::employee_id.eq_any(&member_ids))
        .filter(feedbacks::feedback_date.ge(cutoff))
        .select(feedbacks::employee_id)
        .distinct()
        .load::<Uuid>(&mut conn)?
        .into_iter()
        .collect();
    let members_without_recent_feedback = member_ids
        .iter()
        .filter(|id| !recently_covered.contains(id))
        .count();

    let overdue_plans = overdue_plan_count(&mut conn, now)?;

    let recent: Vec<Feedback> = rows.into_iter().take(RECENT_LIMIT as usize).collect();
    let ids: HashSet<Uuid> = recent
        .iter()
        .flat_map(|feedback| [feedback.employee_id, feedback.manager_id])
        .collect();
    let names = load_user_names(&mut conn, &ids)?;
    let recent_feedbacks = recent
        .into_iter()
        .map(|feedback| to_feedback_response(feedback, &names))
        .collect();

    Ok(Json(GestorDashboard {
        total_members: member_ids.len(),
        overdue_feedbacks,
        due_within_7_days,
        due_within_30_days,
        members_without_recent_feedback,
        awaiting_acknowledgment,
        overdue_plans,
        recent_feedbacks,
    }))
}

pub async fn colaborador_dashboard(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> AppResult<Json<ColaboradorDashboard>> {
    let mut conn = state.db()?;
    let now = Utc::now().naive_utc();

    let rows: Vec<Feedback> = feedbacks::table
        .filter(feedbacks::employee_id.eq(caller.id))
        .order(feedbacks::feedback_date.desc())
        .load(&mut conn)?;

    let pending_acknowledgment = rows
        .iter()
        .filter(|feedback| !feedback.acknowledged)
        .count();
    let next_feedback_date = rows
        .first()
        .and_then(|feedback| feedback.next_feedback_date)
        .map(super::to_iso);

    let own_feedback_ids: Vec<Uuid> = rows.iter().map(|feedback| feedback.id).collect();
    let active_plans: i64 = action_plans::table
        .filter(action_plans::feedback_id.eq_any(&own_feedback_ids))
        .filter(action_plans::deadline.ge(now))
        .filter(action_plans::status.ne(PlanStatus::Completed.as_str()))
        .count()
        .get_result(&mut conn)?;
    let overdue_plans: i64 = action_plans::table
        .filter(action_plans::feedback_id.eq_any(&own_feedback_ids))
        .filter(action_plans::deadline.lt(now))
        .filter(action_plans::status.ne(PlanStatus::Completed.as_str()))
        .count()
        .get_result(&mut conn)?;

    let total_feedbacks = rows.len();
    let recent: Vec<Feedback> = rows.into_iter().take(RECENT_LIMIT as usize).collect();
    let ids: HashSet<Uuid> = recent
        .iter()
        .flat_map(|feedback| [feedback.employee_id, feedback.manager_id])
        .collect();
    let names = load_user_names(&mut conn, &ids)?;
    let recent_feedbacks = recent
        .into_iter()
        .map(|feedback| to_feedback_response(feedback, &names))
        .collect();

    Ok(Json(ColaboradorDashboard {
        total_feedbacks,
        pending_acknowledgment,
        active_plans,
        overdue_plans,
        next_feedback_date,
        recent_feedbacks,
    }))
}

pub async fn admin_dashboard(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> AppResult<Json<AdminDashboard>> {
    match caller.role {
        Role::Admin => {}
        Role::Gestor | Role::Colaborador => {
            return Err(AppError::forbidden("administrator access required"));
        }
    }

    let mut conn = state.db()?;
    let now = Utc::now().naive_utc();

    let count_role = |conn: &mut PgConnection, role: Role| -> AppResult<i64> {
        let count = users::table
            .filter(users::role.eq(role.as_str()))
            .count()
            .get_result(conn)?;
        Ok(count)
    };
    let total_admins = count_role(&mut conn, Role::Admin)?;
    let total_gestores = count_role(&mut conn, Role::Gestor)?;
    let total_colaboradores = count_role(&mut conn, Role::Colaborador)?;
    let total_teams: i64 = teams::table.count().get_result(&mut conn)?;

    let rows: Vec<Feedback> = feedbacks::table.load(&mut conn)?;
    let overdue_feedbacks = rows
        .iter()
        .filter(|feedback| derived_status(feedback, now) == FeedbackStatus::Overdue)
        .count();
    let awaiting_acknowledgment = rows
        .iter()
        .filter(|feedback| {
            derived_status(feedback, now) == FeedbackStatus::AwaitingAcknowledgment
        })
        .count();
    let mut feedbacks_by_type: HashMap<String, usize> = FEEDBACK_TYPES
        .iter()
        .map(|kind| ((*kind).to_string(), 0))
        .collect();
    for feedback in &rows {
        if let Some(count) = feedbacks_by_type.get_mut(&feedback.feedback_type) {
            *count += 1;
        }
    }

    let total_plans: i64 = action_plans::table.count().get_result(&mut conn)?;
    let overdue_plans = overdue_plan_count(&mut conn, now)?;
    let completed_plans: i64 = action_plans::table
        .filter(action_plans::status.eq(PlanStatus::Completed.as_str()))
        .count()
        .get_result(&mut conn)?;

    Ok(Json(AdminDashboard {
        total_admins,
        total_gestores,
        total_colaboradores,
        total_teams,
        total_feedbacks: rows.len(),
        overdue_feedbacks,
        awaiting_acknowledgment,
        total_plans,
        overdue_plans,
        completed_plans,
        feedbacks_by_type,
    }))
}
