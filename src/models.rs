use chrono::NaiveDateTime;
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub team_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub team_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub active: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = teams)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub company: String,
    pub feedback_cadence_days: i32,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = teams)]
pub struct NewTeam {
    pub id: Uuid,
    pub name: String,
    pub company: String,
    pub feedback_cadence_days: i32,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = feedbacks)]
pub struct Feedback {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub manager_id: Uuid,
    pub feedback_date: NaiveDateTime,
    pub feedback_type: String,
    pub context: String,
    pub impact: String,
    pub expectation: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub next_feedback_date: Option<NaiveDateTime>,
    pub status: String,
    pub acknowledged: bool,
    pub acknowledged_at: Option<NaiveDateTime>,
    pub confidential: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = feedbacks)]
pub struct NewFeedback {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub manager_id: Uuid,
    pub feedback_date: NaiveDateTime,
    pub feedback_type: String,
    pub context: String,
    pub impact: String,
    pub expectation: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub next_feedback_date: Option<NaiveDateTime>,
    pub status: String,
    pub acknowledged: bool,
    pub confidential: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = action_plans)]
#[diesel(belongs_to(Feedback))]
pub struct ActionPlan {
    pub id: Uuid,
    pub feedback_id: Uuid,
    pub objective: String,
    pub deadline: NaiveDateTime,
    pub responsible: String,
    pub status: String,
    pub progress: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = action_plans)]
pub struct NewActionPlan {
    pub id: Uuid,
    pub feedback_id: Uuid,
    pub objective: String,
    pub deadline: NaiveDateTime,
    pub responsible: String,
    pub status: String,
    pub progress: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = action_plan_items)]
#[diesel(belongs_to(ActionPlan, foreign_key = plan_id))]
pub struct ActionPlanItem {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub description: String,
    pub item_deadline: Option<NaiveDateTime>,
    pub completed: bool,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = action_plan_items)]
pub struct NewActionPlanItem {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub description: String,
    pub item_deadline: Option<NaiveDateTime>,
    pub completed: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = checkins)]
#[diesel(belongs_to(ActionPlan, foreign_key = plan_id))]
pub struct CheckIn {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub checkin_date: NaiveDateTime,
    pub progress_rating: String,
    pub comment: String,
    pub recorded_by: Uuid,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = checkins)]
pub struct NewCheckIn {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub checkin_date: NaiveDateTime,
    pub progress_rating: String,
    pub comment: String,
    pub recorded_by: Uuid,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = notifications)]
#[diesel(belongs_to(User))]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub read: bool,
}
