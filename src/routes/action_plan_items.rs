use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{ActionPlanItem, NewActionPlanItem};
use crate::schema::{action_plan_items, action_plans};
use crate::state::AppState;
use crate::utils::json::double_option;

use super::action_plans::recompute_plan;
use super::to_iso;

#[derive(Deserialize)]
pub struct CreateItemRequest {
    pub plan_id: Uuid,
    pub description: String,
    pub item_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub item_deadline: Option<Option<DateTime<Utc>>>,
    pub completed: Option<bool>,
}

#[derive(Deserialize)]
pub struct ItemListQuery {
    pub plan_id: Uuid,
}

#[derive(Serialize)]
pub struct ItemResponse {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub description: String,
    pub item_deadline: Option<String>,
    pub completed: bool,
}

impl From<ActionPlanItem> for ItemResponse {
    fn from(item: ActionPlanItem) -> Self {
        Self {
            id: item.id,
            plan_id: item.plan_id,
            description: item.description,
            item_deadline: item.item_deadline.map(to_iso),
            completed: item.completed,
        }
    }
}

pub async fn create_item(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    Json(payload): Json<CreateItemRequest>,
) -> AppResult<Json<ItemResponse>> {
    if payload.description.trim().is_empty() {
        return Err(AppError::bad_request("description must not be empty"));
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

    let new_item = NewActionPlanItem {
        id: Uuid::new_v4(),
        plan_id: payload.plan_id,
        description: payload.description,
        item_deadline: payload.item_deadline.map(|date| date.naive_utc()),
        completed: payload.completed,
    };
    diesel::insert_into(action_plan_items::table)
        .values(&new_item)
        .execute(&mut conn)?;

    recompute_plan(&mut conn, payload.plan_id)?;

    let item: ActionPlanItem = action_plan_items::table.find(new_item.id).first(&mut conn)?;
    Ok(Json(item.into()))
}

pub async fn list_items(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    Query(params): Query<ItemListQuery>,
) -> AppResult<Json<Vec<ItemResponse>>> {
    let mut conn = state.db()?;
    let rows: Vec<ActionPlanItem> = action_plan_items::table
        .filter(action_plan_items::plan_id.eq(params.plan_id))
        .order(action_plan_items::item_deadline.asc())
        .load(&mut conn)?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

pub async fn update_item(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateItemRequest>,
) -> AppResult<Json<ItemResponse>> {
    if payload.description.is_none()
        && payload.item_deadline.is_none()
        && payload.completed.is_none()
    {
        return Err(AppError::bad_request("no fields to update"));
    }

    let mut conn = state.db()?;

    let item: ActionPlanItem = action_plan_items::table
        .find(item_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("action plan item not found"))?;

    #[derive(AsChangeset)]
    #[diesel(table_name = action_plan_items)]
    struct ItemChangeset {
        description: Option<String>,
        item_deadline: Option<Option<chrono::NaiveDateTime>>,
        completed: Option<bool>,
    }

    diesel::update(action_plan_items::table.find(item_id))
        .set(&ItemChangeset {
            description: payload.description,
            item_deadline: payload
                .item_deadline
                .map(|opt| opt.map(|date| date.naive_utc())),
            completed: payload.completed,
        })
        .execute(&mut conn)?;

    // Toggling completion shifts the parent plan's progress.
    recompute_plan(&mut conn, item.plan_id)?;

    let updated: ActionPlanItem = action_plan_items::table.find(item_id).first(&mut conn)?;
    Ok(Json(updated.into()))
}

pub async fn delete_item(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    let item: ActionPlanItem = action_plan_items::table
        .find(item_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("action plan item not found"))?;

    diesel::delete(action_plan_items::table.find(item_id)).execute(&mut conn)?;
    recompute_plan(&mut conn, item.plan_id)?;
    Ok(StatusCode::NO_CONTENT)
}
