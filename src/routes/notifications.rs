use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::Notification;
use crate::schema::notifications;
use crate::state::AppState;

use super::to_iso;

const LIST_LIMIT: i64 = 50;

#[derive(Serialize)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: String,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            read: notification.read,
            created_at: to_iso(notification.created_at),
        }
    }
}

pub async fn list_notifications(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> AppResult<Json<Vec<NotificationResponse>>> {
    let mut conn = state.db()?;
    let rows: Vec<Notification> = notifications::table
        .filter(notifications::user_id.eq(caller.id))
        .order(notifications::created_at.desc())
        .limit(LIST_LIMIT)
        .load(&mut conn)?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

pub async fn mark_read(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(notification_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    let updated = diesel::update(
        notifications::table
            .find(notification_id)
            .filter(notifications::user_id.eq(caller.id)),
    )
    .set(notifications::read.eq(true))
    .execute(&mut conn)?;

    if updated == 0 {
        return Err(AppError::not_found("notification not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;
    diesel::update(notifications::table.filter(notifications::user_id.eq(caller.id)))
        .set(notifications::read.eq(true))
        .execute(&mut conn)?;
    Ok(StatusCode::NO_CONTENT)
}
