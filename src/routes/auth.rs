use axum::{extract::State, Json};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    auth::{password, AuthenticatedUser},
    error::{AppError, AppResult},
    models::User,
    schema::users,
    state::AppState,
};

use super::to_iso;
use super::users::UserResponse;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let mut conn = state.db()?;

    let user: User = users::table
        .filter(users::email.eq(payload.email.trim().to_lowercase()))
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::invalid_credentials)?;

    let valid = password::verify_password(&payload.password, &user.password_hash)
        .map_err(|_| AppError::invalid_credentials())?;
    if !valid {
        return Err(AppError::invalid_credentials());
    }

    if !user.active {
        return Err(AppError::forbidden("account deactivated"));
    }

    let access_token = state
        .jwt
        .generate_token(user.id, &user.email, &user.role)
        .map_err(AppError::from)?;

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: state.config.jwt_expiry_hours * 3600,
        user: user.into(),
    }))
}

pub async fn me(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(UserResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role.as_str().to_string(),
        team_id: user.team_id,
        manager_id: user.manager_id,
        active: user.active,
        created_at: to_iso(user.created_at),
    })
}
