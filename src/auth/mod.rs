pub mod jwt;
pub mod password;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, models::User, schema::users, state::AppState};

/// Closed role set. Access-control sites match on this exhaustively; the
/// wire and storage representation stays the uppercase string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "GESTOR")]
    Gestor,
    #[serde(rename = "COLABORADOR")]
    Colaborador,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Gestor => "GESTOR",
            Role::Colaborador => "COLABORADOR",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ADMIN" => Some(Role::Admin),
            "GESTOR" => Some(Role::Gestor),
            "COLABORADOR" => Some(Role::Colaborador),
            _ => None,
        }
    }
}

/// The verified caller: token claims resolved against the users table on
/// every request, so a deleted account is rejected even with a live token.
/// Never carries the password hash.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub team_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

impl AuthenticatedUser {
    pub fn from_user(user: User) -> Result<Self, AppError> {
        let role = Role::parse(&user.role)
            .ok_or_else(|| AppError::internal(format!("unknown role '{}' stored", user.role)))?;
        Ok(Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role,
            team_id: user.team_id,
            manager_id: user.manager_id,
            active: user.active,
            created_at: user.created_at,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::unauthorized())?;

        let claims = state
            .jwt
            .verify_token(bearer.token())
            .map_err(|_| AppError::unauthorized())?;

        let mut conn = state.db()?;
        let user: User = users::table
            .find(claims.sub)
            .first(&mut conn)
            .optional()?
            .ok_or_else(AppError::unauthorized)?;

        AuthenticatedUser::from_user(user)
    }
}
