use axum::http::HeaderValue;
use axum::{
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::state::AppState;

pub mod action_plan_items;
pub mod action_plans;
pub mod auth;
pub mod checkins;
pub mod dashboard;
pub mod feedbacks;
pub mod health;
pub mod notifications;
pub mod profile;
pub mod teams;
pub mod users;

pub(crate) fn to_iso(dt: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc).to_rfc3339()
}

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/me", get(auth::me));

    let users_routes = Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route(
            "/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        );

    let teams_routes = Router::new()
        .route("/", get(teams::list_teams).post(teams::create_team))
        .route(
            "/:id",
            get(teams::get_team)
                .put(teams::update_team)
                .delete(teams::delete_team),
        );

    let feedbacks_routes = Router::new()
        .route(
            "/",
            get(feedbacks::list_feedbacks).post(feedbacks::create_feedback),
        )
        .route(
            "/:id",
            get(feedbacks::get_feedback)
                .put(feedbacks::update_feedback)
                .delete(feedbacks::delete_feedback),
        )
        .route("/:id/acknowledge", post(feedbacks::acknowledge_feedback));

    let action_plans_routes = Router::new()
        .route(
            "/",
            get(action_plans::list_action_plans).post(action_plans::create_action_plan),
        )
        .route(
            "/:id",
            get(action_plans::get_action_plan)
                .put(action_plans::update_action_plan)
                .delete(action_plans::delete_action_plan),
        );

    let action_plan_items_routes = Router::new()
        .route(
            "/",
            get(action_plan_items::list_items).post(action_plan_items::create_item),
        )
        .route(
            "/:id",
            put(action_plan_items::update_item).delete(action_plan_items::delete_item),
        );

    let checkins_routes = Router::new().route(
        "/",
        get(checkins::list_checkins).post(checkins::create_checkin),
    );

    let notifications_routes = Router::new()
        .route("/", get(notifications::list_notifications))
        .route("/read-all", put(notifications::mark_all_read))
        .route("/:id/read", put(notifications::mark_read));

    let dashboard_routes = Router::new()
        .route("/admin", get(dashboard::admin_dashboard))
        .route("/gestor", get(dashboard::gestor_dashboard))
        .route("/colaborador", get(dashboard::colaborador_dashboard));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/users", users_routes)
        .nest("/api/teams", teams_routes)
        .nest("/api/feedbacks", feedbacks_routes)
        .nest("/api/action-plans", action_plans_routes)
        .nest("/api/action-plan-items", action_plan_items_routes)
        .nest("/api/checkins", checkins_routes)
        .nest("/api/notifications", notifications_routes)
        .nest("/api/dashboard", dashboard_routes)
        .route(
            "/api/collaborator-profile/:id",
            get(profile::collaborator_profile),
        )
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
}
