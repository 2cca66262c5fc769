use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, Role};
use crate::error::{AppError, AppResult};
use crate::models::{Feedback, NewFeedback, Team, User};
use crate::notify;
use crate::schema::{action_plan_items, action_plans, checkins, feedbacks, teams, users};
use crate::state::AppState;
use crate::status::{self, FeedbackStatus};
use crate::utils::json::double_option;

use super::to_iso;

pub const FEEDBACK_TYPES: &[&str] = &[
    "1:1",
    "Performance review",
    "Coaching",
    "Course correction",
    "Praise",
];

#[derive(Deserialize)]
pub struct CreateFeedbackRequest {
    pub employee_id: Uuid,
    pub feedback_type: String,
    pub context: String,
    pub impact: String,
    pub expectation: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    pub next_feedback_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub confidential: bool,
}

#[derive(Deserialize)]
pub struct UpdateFeedbackRequest {
    pub feedback_type: Option<String>,
    pub context: Option<String>,
    pub impact: Option<String>,
    pub expectation: Option<String>,
    pub strengths: Option<Vec<String>>,
    pub improvements: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub next_feedback_date: Option<Option<DateTime<Utc>>>,
    pub status: Option<String>,
    pub confidential: Option<bool>,
}

impl UpdateFeedbackRequest {
    fn is_empty(&self) -> bool {
        self.feedback_type.is_none()
            && self.context.is_none()
            && self.impact.is_none()
            && self.expectation.is_none()
            && self.strengths.is_none()
            && self.improvements.is_none()
            && self.next_feedback_date.is_none()
            && self.status.is_none()
            && self.confidential.is_none()
    }
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = feedbacks)]
struct FeedbackChangeset {
    feedback_type: Option<String>,
    context: Option<String>,
    impact: Option<String>,
    expectation: Option<String>,
    strengths: Option<Vec<String>>,
    improvements: Option<Vec<String>>,
    next_feedback_date: Option<Option<chrono::NaiveDateTime>>,
    status: Option<String>,
    confidential: Option<bool>,
}

#[derive(Deserialize)]
pub struct FeedbackListQuery {
    pub employee_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub feedback_type: Option<String>,
    pub status: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub has_plan: Option<bool>,
}

#[derive(Clone, Serialize)]
pub struct FeedbackResponse {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: Option<String>,
    pub manager_id: Uuid,
    pub manager_name: Option<String>,
    pub feedback_date: String,
    pub feedback_type: String,
    pub context: String,
    pub impact: String,
    pub expectation: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub next_feedback_date: Option<String>,
    pub status: String,
    pub acknowledged: bool,
    pub acknowledged_at: Option<String>,
    pub confidential: bool,
    pub created_at: String,
}

pub(crate) fn to_feedback_response(
    feedback: Feedback,
    names: &HashMap<Uuid, String>,
) -> FeedbackResponse {
    FeedbackResponse {
        employee_name: names.get(&feedback.employee_id).cloned(),
        manager_name: names.get(&feedback.manager_id).cloned(),
        id: feedback.id,
        employee_id: feedback.employee_id,
        manager_id: feedback.manager_id,
        feedback_date: to_iso(feedback.feedback_date),
        feedback_type: feedback.feedback_type,
        context: feedback.context,
        impact: feedback.impact,
        expectation: feedback.expectation,
        strengths: feedback.strengths,
        improvements: feedback.improvements,
        next_feedback_date: feedback.next_feedback_date.map(to_iso),
        status: feedback.status,
        acknowledged: feedback.acknowledged,
        acknowledged_at: feedback.acknowledged_at.map(to_iso),
        confidential: feedback.confidential,
        created_at: to_iso(feedback.created_at),
    }
}

/// Batch name lookup used to join human-readable names onto id references.
pub(crate) fn load_user_names(
    conn: &mut PgConnection,
    ids: &HashSet<Uuid>,
) -> QueryResult<HashMap<Uuid, String>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, String)> = users::table
        .filter(users::id.eq_any(ids))
        .select((users::id, users::name))
        .load(conn)?;
    Ok(rows.into_iter().collect())
}

fn require_gestor_or_admin(user: &AuthenticatedUser) -> AppResult<()> {
    match user.role {
        Role::Admin | Role::Gestor => Ok(()),
        Role::Colaborador => Err(AppError::forbidden("manager or administrator access required")),
    }
}

fn validate_feedback_type(value: &str) -> AppResult<()> {
    if FEEDBACK_TYPES.contains(&value) {
        Ok(())
    } else {
        Err(AppError::bad_request(format!(
            "invalid feedback type '{value}'. Allowed types: {}",
            FEEDBACK_TYPES.join(", ")
        )))
    }
}

/// Re-derives the stored status from the current record. Runs inside the
/// request that touched the feedback.
fn refresh_feedback_status(conn: &mut PgConnection, feedback: &Feedback) -> AppResult<Feedback> {
    let now = Utc::now().naive_utc();
    let derived = status::feedback_status(feedback.acknowledged, feedback.next_feedback_date, now);
    if feedback.status != derived.as_str() {
        diesel::update(feedbacks::table.find(feedback.id))
            .set(feedbacks::status.eq(derived.as_str()))
            .execute(conn)?;
    }
    Ok(feedbacks::table.find(feedback.id).first(conn)?)
}

pub async fn create_feedback(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Json(payload): Json<CreateFeedbackRequest>,
) -> AppResult<Json<FeedbackResponse>> {
    require_gestor_or_admin(&caller)?;
    validate_feedback_type(&payload.feedback_type)?;

    let mut conn = state.db()?;

    let employee: User = users::table
        .find(payload.employee_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("employee not found"))?;

    // Fall back to the employee's team cadence when the caller omits the
    // next-feedback date.
    let next_feedback_date = match payload.next_feedback_date {
        Some(date) => Some(date.naive_utc()),
        None => match employee.team_id {
            Some(team_id) => {
                let team: Option<Team> =
                    teams::table.find(team_id).first(&mut conn).optional()?;
                team.map(|team| {
                    (Utc::now() + Duration::days(i64::from(team.feedback_cadence_days)))
                        .naive_utc()
                })
            }
            None => None,
        },
    };

    let new_feedback = NewFeedback {
        id: Uuid::new_v4(),
        employee_id: employee.id,
        manager_id: caller.id,
        feedback_date: Utc::now().naive_utc(),
        feedback_type: payload.feedback_type.clone(),
        context: payload.context,
        impact: payload.impact,
        expectation: payload.expectation,
        strengths: payload.strengths,
        improvements: payload.improvements,
        next_feedback_date,
        status: FeedbackStatus::AwaitingAcknowledgment.as_str().to_string(),
        acknowledged: false,
        confidential: payload.confidential,
    };

    diesel::insert_into(feedbacks::table)
        .values(&new_feedback)
        .execute(&mut conn)?;

    let feedback: Feedback = feedbacks::table.find(new_feedback.id).first(&mut conn)?;

    notify::record_notification(
        &mut conn,
        employee.id,
        notify::KIND_NEW_FEEDBACK,
        "New feedback received",
        &format!("You received a new {} feedback", payload.feedback_type),
    );
    let (subject, body) = notify::new_feedback_email(
        &employee.name,
        &caller.name,
        &payload.feedback_type,
        &to_iso(feedback.feedback_date),
    );
    notify::send_email(&state, employee.email.clone(), subject, body);

    let names = HashMap::from([(employee.id, employee.name), (caller.id, caller.name)]);
    Ok(Json(to_feedback_response(feedback, &names)))
}

pub async fn list_feedbacks(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Query(params): Query<FeedbackListQuery>,
) -> AppResult<Json<Vec<FeedbackResponse>>> {
    if let Some(feedback_type) = params.feedback_type.as_deref() {
        validate_feedback_type(feedback_type)?;
    }
    if let Some(status_param) = params.status.as_deref() {
        if FeedbackStatus::parse(status_param).is_none() {
            return Err(AppError::bad_request(format!(
                "invalid feedback status '{status_param}'"
            )));
        }
    }

    let mut conn = state.db()?;
    let mut query = feedbacks::table.into_boxed();

    // Mandatory role scope, ANDed with whatever explicit filters follow.
    match caller.role {
        Role::Colaborador => {
            query = query.filter(feedbacks::employee_id.eq(caller.id));
        }
        Role::Gestor => {
            if params.employee_id.is_none() && params.manager_id.is_none() {
                let mut member_ids: Vec<Uuid> = users::table
                    .filter(users::manager_id.eq(caller.id))
                    .select(users::id)
                    .load(&mut conn)?;
                member_ids.push(caller.id);
                query = query.filter(
                    feedbacks::manager_id
                        .eq(caller.id)
                        .or(feedbacks::employee_id.eq_any(member_ids)),
                );
            }
        }
        Role::Admin => {}
    }

    if let Some(employee_id) = params.employee_id {
        query = query.filter(feedbacks::employee_id.eq(employee_id));
    }
    if let Some(manager_id) = params.manager_id {
        query = query.filter(feedbacks::manager_id.eq(manager_id));
    }
    if let Some(team_id) = params.team_id {
        let team_member_ids: Vec<Uuid> = users::table
            .filter(users::team_id.eq(team_id))
            .select(users::id)
            .load(&mut conn)?;
        query = query.filter(feedbacks::employee_id.eq_any(team_member_ids));
    }
    if let Some(feedback_type) = params.feedback_type {
        query = query.filter(feedbacks::feedback_type.eq(feedback_type));
    }
    if let Some(status_param) = params.status {
        query = query.filter(feedbacks::status.eq(status_param));
    }
    if let Some(date_from) = params.date_from {
        query = query.filter(feedbacks::feedback_date.ge(date_from.naive_utc()));
    }
    if let Some(date_to) = params.date_to {
        query = query.filter(feedbacks::feedback_date.le(date_to.naive_utc()));
    }

    let mut rows: Vec<Feedback> = query
        .order(feedbacks::feedback_date.desc())
        .load(&mut conn)?;

    if let Some(has_plan) = params.has_plan {
        let with_plan: HashSet<Uuid> = action_plans::table
            .select(action_plans::feedback_id)
            .distinct()
            .load::<Uuid>(&mut conn)?
            .into_iter()
            .collect();
        rows.retain(|feedback| with_plan.contains(&feedback.id) == has_plan);
    }

    let ids: HashSet<Uuid> = rows
        .iter()
        .flat_map(|feedback| [feedback.employee_id, feedback.manager_id])
        .collect();
    let names = load_user_names(&mut conn, &ids)?;

    Ok(Json(
        rows.into_iter()
            .map(|feedback| to_feedback_response(feedback, &names))
            .collect(),
    ))
}

pub async fn get_feedback(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(feedback_id): Path<Uuid>,
) -> AppResult<Json<FeedbackResponse>> {
    let mut conn = state.db()?;

    let feedback: Feedback = feedbacks::table
        .find(feedback_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("feedback not found"))?;

    match caller.role {
        Role::Colaborador if feedback.employee_id != caller.id => {
            return Err(AppError::forbidden("access denied"));
        }
        Role::Colaborador | Role::Gestor | Role::Admin => {}
    }

    let ids = HashSet::from([feedback.employee_id, feedback.manager_id]);
    let names = load_user_names(&mut conn, &ids)?;
    Ok(Json(to_feedback_response(feedback, &names)))
}

pub async fn update_feedback(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(feedback_id): Path<Uuid>,
    Json(payload): Json<UpdateFeedbackRequest>,
) -> AppResult<Json<FeedbackResponse>> {
    require_gestor_or_admin(&caller)?;

    if payload.is_empty() {
        return Err(AppError::bad_request("no fields to update"));
    }
    if let Some(feedback_type) = payload.feedback_type.as_deref() {
        validate_feedback_type(feedback_type)?;
    }
    if let Some(status_param) = payload.status.as_deref() {
        if FeedbackStatus::parse(status_param).is_none() {
            return Err(AppError::bad_request(format!(
                "invalid feedback status '{status_param}'"
            )));
        }
    }

    let mut conn = state.db()?;

    let feedback: Feedback = feedbacks::table
        .find(feedback_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("feedback not found"))?;

    // Only the authoring manager or an administrator may edit.
    match caller.role {
        Role::Admin => {}
        Role::Gestor if feedback.manager_id == caller.id => {}
        Role::Gestor | Role::Colaborador => {
            return Err(AppError::forbidden("access denied"));
        }
    }

    let changeset = FeedbackChangeset {
        feedback_type: payload.feedback_type,
        context: payload.context,
        impact: payload.impact,
        expectation: payload.expectation,
        strengths: payload.strengths,
        improvements: payload.improvements,
        next_feedback_date: payload
            .next_feedback_date
            .map(|opt| opt.map(|date| date.naive_utc())),
        status: payload.status,
        confidential: payload.confidential,
    };

    diesel::update(feedbacks::table.find(feedback_id))
        .set(&changeset)
        .execute(&mut conn)?;

    // Any client-supplied status is transient: derivation wins.
    let merged: Feedback = feedbacks::table.find(feedback_id).first(&mut conn)?;
    let refreshed = refresh_feedback_status(&mut conn, &merged)?;

    let ids = HashSet::from([refreshed.employee_id, refreshed.manager_id]);
    let names = load_user_names(&mut conn, &ids)?;
    Ok(Json(to_feedback_response(refreshed, &names)))
}

pub async fn acknowledge_feedback(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(feedback_id): Path<Uuid>,
) -> AppResult<Json<FeedbackResponse>> {
    let mut conn = state.db()?;

    let feedback: Feedback = feedbacks::table
        .find(feedback_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("feedback not found"))?;

    if feedback.employee_id != caller.id {
        return Err(AppError::forbidden(
            "only the designated employee may acknowledge",
        ));
    }

    diesel::update(feedbacks::table.find(feedback_id))
        .set((
            feedbacks::acknowledged.eq(true),
            feedbacks::acknowledged_at.eq(Utc::now().naive_utc()),
            feedbacks::status.eq(FeedbackStatus::OnTrack.as_str()),
        ))
        .execute(&mut conn)?;

    let updated: Feedback = feedbacks::table.find(feedback_id).first(&mut conn)?;
    let ids = HashSet::from([updated.employee_id, updated.manager_id]);
    let names = load_user_names(&mut conn, &ids)?;
    Ok(Json(to_feedback_response(updated, &names)))
}

/// Removes the items and check-ins of each plan, then the plans themselves.
/// Sequential and untransacted: a failure partway leaves earlier deletions
/// in place.
pub(crate) fn cascade_delete_plans(conn: &mut PgConnection, plan_ids: &[Uuid]) -> AppResult<()> {
    if plan_ids.is_empty() {
        return Ok(());
    }
    diesel::delete(action_plan_items::table.filter(action_plan_items::plan_id.eq_any(plan_ids)))
        .execute(conn)?;
    diesel::delete(checkins::table.filter(checkins::plan_id.eq_any(plan_ids))).execute(conn)?;
    diesel::delete(action_plans::table.filter(action_plans::id.eq_any(plan_ids)))
        .execute(conn)?;
    Ok(())
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(feedback_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    match caller.role {
        Role::Admin => {}
        Role::Gestor | Role::Colaborador => {
            return Err(AppError::forbidden("administrator access required"));
        }
    }

    let mut conn = state.db()?;

    let exists: Option<Uuid> = feedbacks::table
        .find(feedback_id)
        .select(feedbacks::id)
        .first(&mut conn)
        .optional()?;
    if exists.is_none() {
        return Err(AppError::not_found("feedback not found"));
    }

    let plan_ids: Vec<Uuid> = action_plans::table
        .filter(action_plans::feedback_id.eq(feedback_id))
        .select(action_plans::id)
        .load(&mut conn)?;
    cascade_delete_plans(&mut conn, &plan_ids)?;

    diesel::delete(feedbacks::table.find(feedback_id)).execute(&mut conn)?;
    Ok(StatusCode::NO_CONTENT)
}
