use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{password, AuthenticatedUser, Role};
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, User};
use crate::schema::users;
use crate::state::AppState;
use crate::utils::json::double_option;

use super::to_iso;

#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub team_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub active: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            team_id: user.team_id,
            manager_id: user.manager_id,
            active: user.active,
            created_at: to_iso(user.created_at),
        }
    }
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
    pub team_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_role() -> String {
    Role::Colaborador.as_str().to_string()
}

fn default_active() -> bool {
    true
}

#[derive(Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub team_id: Option<Uuid>,
    pub active: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub team_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub manager_id: Option<Option<Uuid>>,
    pub active: Option<bool>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = users)]
struct UserChangeset {
    name: Option<String>,
    email: Option<String>,
    role: Option<String>,
    team_id: Option<Option<Uuid>>,
    manager_id: Option<Option<Uuid>>,
    active: Option<bool>,
}

fn require_admin(user: &AuthenticatedUser) -> AppResult<()> {
    match user.role {
        Role::Admin => Ok(()),
        Role::Gestor | Role::Colaborador => {
            Err(AppError::forbidden("administrator access required"))
        }
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&caller)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    if Role::parse(&payload.role).is_none() {
        return Err(AppError::bad_request(format!(
            "invalid role '{}'",
            payload.role
        )));
    }

    let mut conn = state.db()?;
    let new_user = NewUser {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_lowercase(),
        password_hash: password::hash_password(&payload.password)?,
        role: payload.role,
        team_id: payload.team_id,
        manager_id: payload.manager_id,
        active: payload.active,
    };

    match diesel::insert_into(users::table)
        .values(&new_user)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            return Err(AppError::bad_request("email already registered"));
        }
        Err(err) => return Err(AppError::from(err)),
    }

    let user: User = users::table.find(new_user.id).first(&mut conn)?;
    Ok(Json(user.into()))
}

pub async fn list_users(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    Query(params): Query<UserListQuery>,
) -> AppResult<Json<Vec<UserResponse>>> {
    let mut conn = state.db()?;

    let mut query = users::table.into_boxed();
    if let Some(role) = params.role.as_deref() {
        if Role::parse(role).is_none() {
            return Err(AppError::bad_request(format!("invalid role '{role}'")));
        }
        query = query.filter(users::role.eq(role.to_string()));
    }
    if let Some(team_id) = params.team_id {
        query = query.filter(users::team_id.eq(team_id));
    }
    if let Some(active) = params.active {
        query = query.filter(users::active.eq(active));
    }

    let rows: Vec<User> = query.order(users::name.asc()).load(&mut conn)?;
    Ok(Json(rows.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let mut conn = state.db()?;
    let user: User = users::table
        .find(user_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("user not found"))?;
    Ok(Json(user.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&caller)?;

    if payload.name.is_none()
        && payload.email.is_none()
        && payload.role.is_none()
        && payload.team_id.is_none()
        && payload.manager_id.is_none()
        && payload.active.is_none()
    {
        return Err(AppError::bad_request("no fields to update"));
    }
    if let Some(role) = payload.role.as_deref() {
        if Role::parse(role).is_none() {
            return Err(AppError::bad_request(format!("invalid role '{role}'")));
        }
    }

    let mut conn = state.db()?;
    let changeset = UserChangeset {
        name: payload.name,
        email: payload.email.map(|email| email.trim().to_lowercase()),
        role: payload.role,
        team_id: payload.team_id,
        manager_id: payload.manager_id,
        active: payload.active,
    };

    let updated = match diesel::update(users::table.find(user_id))
        .set(&changeset)
        .execute(&mut conn)
    {
        Ok(count) => count,
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            return Err(AppError::bad_request("email already registered"));
        }
        Err(err) => return Err(AppError::from(err)),
    };
    if updated == 0 {
        return Err(AppError::not_found("user not found"));
    }

    let user: User = users::table.find(user_id).first(&mut conn)?;
    Ok(Json(user.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&caller)?;

    let mut conn = state.db()?;
    let deleted = match diesel::delete(users::table.find(user_id)).execute(&mut conn) {
        Ok(count) => count,
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)) => {
            return Err(AppError::bad_request(
                "user is still referenced by feedbacks or check-ins",
            ));
        }
        Err(err) => return Err(AppError::from(err)),
    };
    if deleted == 0 {
        return Err(AppError::not_found("user not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
