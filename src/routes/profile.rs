use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, State},
    Json,
};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, Role};
use crate::error::{AppError, AppResult};
use crate::models::{ActionPlan, Feedback, Team, User};
use crate::schema::{action_plans, feedbacks, teams, users};
use crate::state::AppState;

use super::action_plans::ActionPlanResponse;
use super::feedbacks::{load_user_names, to_feedback_response, FeedbackResponse};
use super::teams::TeamResponse;
use super::users::UserResponse;

const TOP_THEMES: usize = 5;

#[derive(Serialize)]
pub struct ThemeCount {
    pub theme: String,
    pub count: usize,
}

#[derive(Serialize)]
pub struct CollaboratorProfile {
    pub user: UserResponse,
    pub team: Option<TeamResponse>,
    pub manager: Option<UserResponse>,
    pub feedbacks: Vec<FeedbackResponse>,
    pub top_strengths: Vec<ThemeCount>,
    pub top_improvements: Vec<ThemeCount>,
    pub action_plans: Vec<ActionPlanResponse>,
    pub latest_feedback: Option<FeedbackResponse>,
    pub next_feedback_date: Option<String>,
}

/// Ranks recurring themes by frequency; equal counts keep the order in which
/// the theme first appeared across the history.
fn top_recurring(entries: impl Iterator<Item = String>, limit: usize) -> Vec<ThemeCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();
    for entry in entries {
        let theme = entry.trim().to_string();
        if theme.is_empty() {
            continue;
        }
        match counts.get_mut(&theme) {
            Some(count) => *count += 1,
            None => {
                counts.insert(theme.clone(), 1);
                first_seen.push(theme);
            }
        }
    }

    let order: HashMap<&str, usize> = first_seen
        .iter()
        .enumerate()
        .map(|(position, theme)| (theme.as_str(), position))
        .collect();
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| order[a.0.as_str()].cmp(&order[b.0.as_str()]))
    });

    ranked
        .into_iter()
        .take(limit)
        .map(|(theme, count)| ThemeCount { theme, count })
        .collect()
}

pub async fn collaborator_profile(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<CollaboratorProfile>> {
    match caller.role {
        Role::Admin | Role::Gestor => {}
        Role::Colaborador if caller.id == user_id => {}
        Role::Colaborador => {
            return Err(AppError::forbidden("access denied"));
        }
    }

    let mut conn = state.db()?;

    let user: User = users::table
        .find(user_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    let team: Option<Team> = match user.team_id {
        Some(team_id) => teams::table.find(team_id).first(&mut conn).optional()?,
        None => None,
    };
    let manager: Option<User> = match user.manager_id {
        Some(manager_id) => users::table.find(manager_id).first(&mut conn).optional()?,
        None => None,
    };

    let history: Vec<Feedback> = feedbacks::table
        .filter(feedbacks::employee_id.eq(user_id))
        .order(feedbacks::feedback_date.desc())
        .load(&mut conn)?;

    let top_strengths = top_recurring(
        history
            .iter()
            .flat_map(|feedback| feedback.strengths.iter().cloned()),
        TOP_THEMES,
    );
    let top_improvements = top_recurring(
        history
            .iter()
            .flat_map(|feedback| feedback.improvements.iter().cloned()),
        TOP_THEMES,
    );

    let feedback_ids: Vec<Uuid> = history.iter().map(|feedback| feedback.id).collect();
    let plans: Vec<ActionPlan> = action_plans::table
        .filter(action_plans::feedback_id.eq_any(&feedback_ids))
        .order(action_plans::deadline.asc())
        .load(&mut conn)?;

    let ids: HashSet<Uuid> = history
        .iter()
        .flat_map(|feedback| [feedback.employee_id, feedback.manager_id])
        .collect();
    let names = load_user_names(&mut conn, &ids)?;

    let responses: Vec<FeedbackResponse> = history
        .into_iter()
        .map(|feedback| to_feedback_response(feedback, &names))
        .collect();
    let next_feedback_date = responses
        .first()
        .and_then(|feedback| feedback.next_feedback_date.clone());
    let latest_feedback = responses.first().cloned();

    Ok(Json(CollaboratorProfile {
        user: user.into(),
        team: team.map(Into::into),
        manager: manager.map(Into::into),
        feedbacks: responses,
        top_strengths,
        top_improvements,
        action_plans: plans.into_iter().map(Into::into).collect(),
        latest_feedback,
        next_feedback_date,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn themes(values: &[&str]) -> impl Iterator<Item = String> {
        values
            .iter()
            .map(|value| (*value).to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn ranks_by_frequency() {
        let ranked = top_recurring(
            themes(&["clarity", "ownership", "clarity", "clarity", "ownership"]),
            5,
        );
        assert_eq!(ranked[0].theme, "clarity");
        assert_eq!(ranked[0].count, 3);
        assert_eq!(ranked[1].theme, "ownership");
        assert_eq!(ranked[1].count, 2);
    }

    #[test]
    fn ties_break_by_first_appearance() {
        let ranked = top_recurring(themes(&["listening", "pacing", "pacing", "listening"]), 5);
        assert_eq!(ranked[0].theme, "listening");
        assert_eq!(ranked[1].theme, "pacing");
    }

    #[test]
    fn truncates_to_limit_and_skips_blanks() {
        let ranked = top_recurring(themes(&["a", "", "b", "c", "  ", "d"]), 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].theme, "a");
        assert_eq!(ranked[1].theme, "b");
    }
}
