//! Notification side effects: a feed row per event, plus a best-effort
//! email. Neither is allowed to fail the request that triggered it.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use tracing::warn;
use uuid::Uuid;

use crate::models::NewNotification;
use crate::schema::notifications;
use crate::state::AppState;

pub const KIND_NEW_FEEDBACK: &str = "new_feedback";
pub const KIND_NEW_ACTION_PLAN: &str = "new_action_plan";

pub fn record_notification(
    conn: &mut PgConnection,
    user_id: Uuid,
    kind: &str,
    title: &str,
    message: &str,
) {
    let row = NewNotification {
        id: Uuid::new_v4(),
        user_id,
        kind: kind.to_string(),
        title: title.to_string(),
        message: message.to_string(),
        read: false,
    };

    if let Err(err) = diesel::insert_into(notifications::table)
        .values(&row)
        .execute(conn)
    {
        warn!(%user_id, kind, "failed to record notification: {err}");
    }
}

/// Spawns the delivery off the request path; the caller never observes a
/// mail failure.
pub fn send_email(state: &AppState, recipient: String, subject: String, html_body: String) {
    let mailer = state.mailer.clone();
    tokio::spawn(async move {
        if let Err(err) = mailer.send(&recipient, &subject, &html_body).await {
            warn!(recipient, subject, "failed to send email: {err}");
        }
    });
}

pub fn new_feedback_email(
    employee_name: &str,
    manager_name: &str,
    feedback_type: &str,
    feedback_date: &str,
) -> (String, String) {
    let subject = format!("New feedback recorded - {feedback_type}");
    let body = format!(
        r#"<html>
<body style="margin: 0; padding: 20px; font-family: Arial, sans-serif;">
  <div style="max-width: 600px; margin: 0 auto; border-radius: 8px; overflow: hidden;">
    {header}
    <div style="padding: 30px;">
      <h2 style="margin-top: 0;">Hello, {employee_name}!</h2>
      <p>A new feedback has been recorded for you:</p>
      <div style="padding: 20px; border-left: 4px solid #F59E0B; margin: 20px 0;">
        <p style="margin: 5px 0;"><strong>Type:</strong> {feedback_type}</p>
        <p style="margin: 5px 0;"><strong>Manager:</strong> {manager_name}</p>
        <p style="margin: 5px 0;"><strong>Date:</strong> {feedback_date}</p>
      </div>
      <p>Sign in to read the full feedback and acknowledge it.</p>
    </div>
    {footer}
  </div>
</body>
</html>"#,
        header = email_header(),
        footer = email_footer(),
    );
    (subject, body)
}

fn email_header() -> &'static str {
    r#"<div style="background-color: #0F172A; padding: 20px; text-align: center;">
  <h1 style="color: #F59E0B; margin: 0;">Feedback Hub</h1>
</div>"#
}

fn email_footer() -> &'static str {
    r#"<div style="background-color: #1E293B; padding: 15px; text-align: center;">
  <p style="color: #94A3B8; font-size: 12px; margin: 0;">
    This email was sent automatically. Please do not reply.
  </p>
</div>"#
}
