use std::collections::HashSet;

use axum::{
    extract::{Query, State},
    Json,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{CheckIn, NewCheckIn};
use crate::schema::{action_plans, checkins};
use crate::state::AppState;

use super::feedbacks::load_user_names;
use super::to_iso;

pub const PROGRESS_RATINGS: &[&str] = &["Poor", "Fair", "Good"];

#[derive(Deserialize)]
pub struct CreateCheckInRequest {
    pub plan_id: Uuid,
    pub progress_rating: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Deserialize)]
pub struct CheckInListQuery {
    pub plan_id: Uuid,
}

#[derive(Serialize)]
pub struct CheckInResponse {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub checkin_date: String,
    pub progress_rating: String,
    pub comment: String,
    pub recorded_by: Uuid,
    pub recorded_by_name: Option<String>,
}

fn to_checkin_response(
    checkin: CheckIn,
    names: &std::collections::HashMap<Uuid, String>,
) -> CheckInResponse {
    CheckInResponse {
        recorded_by_name: names.get(&checkin.recorded_by).cloned(),
        id: checkin.id,
        plan_id: checkin.plan_id,
        checkin_date: to_iso(checkin.checkin_date),
        progress_rating: checkin.progress_rating,
        comment: checkin.comment,
        recorded_by: checkin.recorded_by,
    }
}

pub async fn create_checkin(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Json(payload): Json<CreateCheckInRequest>,
) -> AppResult<Json<CheckInResponse>> {
    if !PROGRESS_RATINGS.contains(&payload.progress_rating.as_str()) {
        return Err(AppError::bad_request(format!(
            "invalid progress rating '{}'. Allowed ratings: {}",
            payload.progress_rating,
            PROGRESS_RATINGS.join(", ")
        )));
    }

    let mut conn = state.db()?;

    let plan_exists: Option<Uuid> = action_plans::table
        .find(payload.plan_id)
        .select(action_plans::id)
        .first(&mut conn)
        .optional()?;
    if plan_exists.is_none() {
        return Err(AppError::not_found("action plan not found"));
    }

    let new_checkin = NewCheckIn {
        id: Uuid::new_v4(),
        plan_id: payload.plan_id,
        checkin_date: chrono::Utc::now().naive_utc(),
        progress_rating: payload.progress_rating,
        comment: payload.comment,
        recorded_by: caller.id,
    };
    diesel::insert_into(checkins::table)
        .values(&new_checkin)
        .execute(&mut conn)?;

    let checkin: CheckIn = checkins::table.find(new_checkin.id).first(&mut conn)?;
    let names = std::collections::HashMap::from([(caller.id, caller.name)]);
    Ok(Json(to_checkin_response(checkin, &names)))
}

pub async fn list_checkins(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    Query(params): Query<CheckInListQuery>,
) -> AppResult<Json<Vec<CheckInResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<CheckIn> = checkins::table
        .filter(checkins::plan_id.eq(params.plan_id))
        .order(checkins::checkin_date.desc())
        .load(&mut conn)?;

    let ids: HashSet<Uuid> = rows.iter().map(|checkin| checkin.recorded_by).collect();
    let names = load_user_names(&mut conn, &ids)?;

    Ok(Json(
        rows.into_iter()
            .map(|checkin| to_checkin_response(checkin, &names))
            .collect(),
    ))
}
