use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, Role};
use crate::error::{AppError, AppResult};
use crate::models::{ActionPlan, Feedback, NewActionPlan};
use crate::notify;
use crate::schema::{action_plan_items, action_plans, feedbacks};
use crate::state::AppState;
use crate::status::{self, PlanStatus};
use crate::utils::json::double_option;

use super::feedbacks::cascade_delete_plans;
use super::to_iso;

pub const RESPONSIBLE_PARTIES: &[&str] = &["Employee", "Manager", "Both"];

#[derive(Deserialize)]
pub struct CreateActionPlanRequest {
    pub feedback_id: Uuid,
    pub objective: String,
    pub deadline: DateTime<Utc>,
    pub responsible: String,
}

#[derive(Deserialize)]
pub struct UpdateActionPlanRequest {
    pub objective: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub deadline: Option<Option<DateTime<Utc>>>,
    pub responsible: Option<String>,
}

#[derive(Deserialize)]
pub struct ActionPlanListQuery {
    pub feedback_id: Option<Uuid>,
    pub status: Option<String>,
    pub responsible: Option<String>,
}

#[derive(Serialize)]
pub struct ActionPlanResponse {
    pub id: Uuid,
    pub feedback_id: Uuid,
    pub objective: String,
    pub deadline: String,
    pub responsible: String,
    pub status: String,
    pub progress: i32,
    pub created_at: String,
}

impl From<ActionPlan> for ActionPlanResponse {
    fn from(plan: ActionPlan) -> Self {
        Self {
            id: plan.id,
            feedback_id: plan.feedback_id,
            objective: plan.objective,
            deadline: to_iso(plan.deadline),
            responsible: plan.responsible,
            status: plan.status,
            progress: plan.progress,
            created_at: to_iso(plan.created_at),
        }
    }
}

fn validate_responsible(value: &str) -> AppResult<()> {
    if RESPONSIBLE_PARTIES.contains(&value) {
        Ok(())
    } else {
        Err(AppError::bad_request(format!(
            "invalid responsible party '{value}'. Allowed values: {}",
            RESPONSIBLE_PARTIES.join(", ")
        )))
    }
}

/// Re-derives progress and status from the plan's items and persists the
/// result when it differs from the stored row. Item routes call this after
/// every mutation.
pub(crate) fn recompute_plan(conn: &mut PgConnection, plan_id: Uuid) -> AppResult<ActionPlan> {
    let plan: ActionPlan = action_plans::table
        .find(plan_id)
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("action plan not found"))?;

    let rows: Vec<bool> = action_plan_items::table
        .filter(action_plan_items::plan_id.eq(plan_id))
        .select(action_plan_items::completed)
        .load(conn)?;
    let total = rows.len();
    let completed = rows.iter().filter(|done| **done).count();

    let progress = status::plan_progress(completed, total);
    let current = PlanStatus::parse(&plan.status).unwrap_or(PlanStatus::NotStarted);
    let now = Utc::now().naive_utc();
    let derived = status::plan_status(progress, current, plan.deadline, now);

    if progress != plan.progress || derived.as_str() != plan.status {
        diesel::update(action_plans::table.find(plan_id))
            .set((
                action_plans::progress.eq(progress),
                action_plans::status.eq(derived.as_str()),
            ))
            .execute(conn)?;
    }
    Ok(action_plans::table.find(plan_id).first(conn)?)
}

pub async fn create_action_plan(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Json(payload): Json<CreateActionPlanRequest>,
) -> AppResult<Json<ActionPlanResponse>> {
    match caller.role {
        Role::Admin | Role::Gestor => {}
        Role::Colaborador => {
            return Err(AppError::forbidden(
                "manager or administrator access required",
            ));
        }
    }
    validate_responsible(&payload.responsible)?;
    if payload.objective.trim().is_empty() {
        return Err(AppError::bad_request("objective must not be empty"));
    }

    let mut conn = state.db()?;

    let feedback: Feedback = feedbacks::table
        .find(payload.feedback_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("feedback not found"))?;

    let new_plan = NewActionPlan {
        id: Uuid::new_v4(),
        feedback_id: feedback.id,
        objective: payload.objective,
        deadline: payload.deadline.naive_utc(),
        responsible: payload.responsible,
        status: PlanStatus::NotStarted.as_str().to_string(),
        progress: 0,
    };

    diesel::insert_into(action_plans::table)
        .values(&new_plan)
        .execute(&mut conn)?;

    notify::record_notification(
        &mut conn,
        feedback.employee_id,
        notify::KIND_NEW_ACTION_PLAN,
        "New action plan",
        "An action plan was created for one of your feedbacks",
    );

    let plan: ActionPlan = action_plans::table.find(new_plan.id).first(&mut conn)?;
    Ok(Json(plan.into()))
}

pub async fn list_action_plans(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Query(params): Query<ActionPlanListQuery>,
) -> AppResult<Json<Vec<ActionPlanResponse>>> {
    if let Some(status_param) = params.status.as_deref() {
        if PlanStatus::parse(status_param).is_none() {
            return Err(AppError::bad_request(format!(
                "invalid plan status '{status_param}'"
            )));
        }
    }
    if let Some(responsible) = params.responsible.as_deref() {
        validate_responsible(responsible)?;
    }

    let mut conn = state.db()?;
    let mut query = action_plans::table.into_boxed();

    // Collaborators only see plans attached to their own feedbacks.
    if let Role::Colaborador = caller.role {
        let own_feedback_ids: Vec<Uuid> = feedbacks::table
            .filter(feedbacks::employee_id.eq(caller.id))
            .select(feedbacks::id)
            .load(&mut conn)?;
        query = query.filter(action_plans::feedback_id.eq_any(own_feedback_ids));
    }

    if let Some(feedback_id) = params.feedback_id {
        query = query.filter(action_plans::feedback_id.eq(feedback_id));
    }
    if let Some(responsible) = params.responsible {
        query = query.filter(action_plans::responsible.eq(responsible));
    }

    let rows: Vec<ActionPlan> = query
        .order(action_plans::deadline.asc())
        .load(&mut conn)?;

    // Statuses are derived lazily, so refresh before any status filter runs.
    let mut refreshed = Vec::with_capacity(rows.len());
    for plan in rows {
        refreshed.push(recompute_plan(&mut conn, plan.id)?);
    }
    if let Some(status_param) = params.status {
        refreshed.retain(|plan| plan.status == status_param);
    }

    Ok(Json(refreshed.into_iter().map(Into::into).collect()))
}

pub async fn get_action_plan(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(plan_id): Path<Uuid>,
) -> AppResult<Json<ActionPlanResponse>> {
    let mut conn = state.db()?;
    let plan = recompute_plan(&mut conn, plan_id)?;

    if let Role::Colaborador = caller.role {
        let feedback: Feedback = feedbacks::table.find(plan.feedback_id).first(&mut conn)?;
        if feedback.employee_id != caller.id {
            return Err(AppError::forbidden("access denied"));
        }
    }

    Ok(Json(plan.into()))
}

pub async fn update_action_plan(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(plan_id): Path<Uuid>,
    Json(payload): Json<UpdateActionPlanRequest>,
) -> AppResult<Json<ActionPlanResponse>> {
    match caller.role {
        Role::Admin | Role::Gestor => {}
        Role::Colaborador => {
            return Err(AppError::forbidden(
                "manager or administrator access required",
            ));
        }
    }

    if payload.objective.is_none() && payload.deadline.is_none() && payload.responsible.is_none() {
        return Err(AppError::bad_request("no fields to update"));
    }
    if let Some(responsible) = payload.responsible.as_deref() {
        validate_responsible(responsible)?;
    }
    // The deadline column is NOT NULL; explicit null is rejected rather than
    // silently ignored.
    let deadline = match payload.deadline {
        Some(Some(date)) => Some(date.naive_utc()),
        Some(None) => {
            return Err(AppError::bad_request("deadline must not be null"));
        }
        None => None,
    };

    let mut conn = state.db()?;

    let exists: Option<Uuid> = action_plans::table
        .find(plan_id)
        .select(action_plans::id)
        .first(&mut conn)
        .optional()?;
    if exists.is_none() {
        return Err(AppError::not_found("action plan not found"));
    }

    #[derive(AsChangeset)]
    #[diesel(table_name = action_plans)]
    struct PlanChangeset {
        objective: Option<String>,
        deadline: Option<chrono::NaiveDateTime>,
        responsible: Option<String>,
    }

    diesel::update(action_plans::table.find(plan_id))
        .set(&PlanChangeset {
            objective: payload.objective,
            deadline,
            responsible: payload.responsible,
        })
        .execute(&mut conn)?;

    // A moved deadline can flip the plan in or out of overdue.
    let plan = recompute_plan(&mut conn, plan_id)?;
    Ok(Json(plan.into()))
}

pub async fn delete_action_plan(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(plan_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    match caller.role {
        Role::Admin | Role::Gestor => {}
        Role::Colaborador => {
            return Err(AppError::forbidden(
                "manager or administrator access required",
            ));
        }
    }

    let mut conn = state.db()?;

    let exists: Option<Uuid> = action_plans::table
        .find(plan_id)
        .select(action_plans::id)
        .first(&mut conn)
        .optional()?;
    if exists.is_none() {
        return Err(AppError::not_found("action plan not found"));
    }

    cascade_delete_plans(&mut conn, &[plan_id])?;
    Ok(StatusCode::NO_CONTENT)
}
