use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, Role};
use crate::error::{AppError, AppResult};
use crate::models::{NewTeam, Team};
use crate::schema::teams;
use crate::state::AppState;
use crate::utils::json::double_option;

use super::to_iso;

#[derive(Serialize)]
pub struct TeamResponse {
    pub id: Uuid,
    pub name: String,
    pub company: String,
    pub feedback_cadence_days: i32,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<Team> for TeamResponse {
    fn from(team: Team) -> Self {
        Self {
            id: team.id,
            name: team.name,
            company: team.company,
            feedback_cadence_days: team.feedback_cadence_days,
            description: team.description,
            created_at: to_iso(team.created_at),
        }
    }
}

#[derive(Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    pub company: String,
    #[serde(default = "default_cadence_days")]
    pub feedback_cadence_days: i32,
    pub description: Option<String>,
}

fn default_cadence_days() -> i32 {
    30
}

#[derive(Deserialize)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub company: Option<String>,
    pub feedback_cadence_days: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = teams)]
struct TeamChangeset {
    name: Option<String>,
    company: Option<String>,
    feedback_cadence_days: Option<i32>,
    description: Option<Option<String>>,
}

fn require_admin(user: &AuthenticatedUser) -> AppResult<()> {
    match user.role {
        Role::Admin => Ok(()),
        Role::Gestor | Role::Colaborador => {
            Err(AppError::forbidden("administrator access required"))
        }
    }
}

pub async fn create_team(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Json(payload): Json<CreateTeamRequest>,
) -> AppResult<Json<TeamResponse>> {
    require_admin(&caller)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    if payload.feedback_cadence_days <= 0 {
        return Err(AppError::bad_request(
            "feedback_cadence_days must be positive",
        ));
    }

    let mut conn = state.db()?;
    let new_team = NewTeam {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        company: payload.company,
        feedback_cadence_days: payload.feedback_cadence_days,
        description: payload.description,
    };

    diesel::insert_into(teams::table)
        .values(&new_team)
        .execute(&mut conn)?;

    let team: Team = teams::table.find(new_team.id).first(&mut conn)?;
    Ok(Json(team.into()))
}

pub async fn list_teams(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
) -> AppResult<Json<Vec<TeamResponse>>> {
    let mut conn = state.db()?;
    let rows: Vec<Team> = teams::table.order(teams::name.asc()).load(&mut conn)?;
    Ok(Json(rows.into_iter().map(TeamResponse::from).collect()))
}

pub async fn get_team(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    Path(team_id): Path<Uuid>,
) -> AppResult<Json<TeamResponse>> {
    let mut conn = state.db()?;
    let team: Team = teams::table
        .find(team_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("team not found"))?;
    Ok(Json(team.into()))
}

pub async fn update_team(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(team_id): Path<Uuid>,
    Json(payload): Json<UpdateTeamRequest>,
) -> AppResult<Json<TeamResponse>> {
    require_admin(&caller)?;

    if payload.name.is_none()
        && payload.company.is_none()
        && payload.feedback_cadence_days.is_none()
        && payload.description.is_none()
    {
        return Err(AppError::bad_request("no fields to update"));
    }
    if matches!(payload.feedback_cadence_days, Some(days) if days <= 0) {
        return Err(AppError::bad_request(
            "feedback_cadence_days must be positive",
        ));
    }

    let mut conn = state.db()?;
    let changeset = TeamChangeset {
        name: payload.name,
        company: payload.company,
        feedback_cadence_days: payload.feedback_cadence_days,
        description: payload.description,
    };

    let updated = diesel::update(teams::table.find(team_id))
        .set(&changeset)
        .execute(&mut conn)?;
    if updated == 0 {
        return Err(AppError::not_found("team not found"));
    }

    let team: Team = teams::table.find(team_id).first(&mut conn)?;
    Ok(Json(team.into()))
}

pub async fn delete_team(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(team_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&caller)?;

    let mut conn = state.db()?;
    let deleted = diesel::delete(teams::table.find(team_id)).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found("team not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
