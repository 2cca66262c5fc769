//! Derived-status rules for feedbacks and action plans.
//!
//! Both derivations are pure functions of the current record; they are
//! re-evaluated inside the request that touched the record (and on plan
//! reads), never by a background scheduler. A stored status can therefore
//! be stale until the next touch.

use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackStatus {
    OnTrack,
    AwaitingAcknowledgment,
    Overdue,
}

impl FeedbackStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackStatus::OnTrack => "On track",
            FeedbackStatus::AwaitingAcknowledgment => "Awaiting acknowledgment",
            FeedbackStatus::Overdue => "Overdue",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "On track" => Some(FeedbackStatus::OnTrack),
            "Awaiting acknowledgment" => Some(FeedbackStatus::AwaitingAcknowledgment),
            "Overdue" => Some(FeedbackStatus::Overdue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStatus {
    NotStarted,
    InProgress,
    Completed,
    Overdue,
}

impl PlanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanStatus::NotStarted => "Not started",
            PlanStatus::InProgress => "In progress",
            PlanStatus::Completed => "Completed",
            PlanStatus::Overdue => "Overdue",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Not started" => Some(PlanStatus::NotStarted),
            "In progress" => Some(PlanStatus::InProgress),
            "Completed" => Some(PlanStatus::Completed),
            "Overdue" => Some(PlanStatus::Overdue),
            _ => None,
        }
    }
}

/// Acknowledged feedback is always on track. Unacknowledged feedback is
/// overdue once its next-feedback date has passed, otherwise it waits for
/// the employee's acknowledgment (including when no next date is set).
pub fn feedback_status(
    acknowledged: bool,
    next_feedback_date: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> FeedbackStatus {
    if acknowledged {
        return FeedbackStatus::OnTrack;
    }
    match next_feedback_date {
        Some(next) if next < now => FeedbackStatus::Overdue,
        _ => FeedbackStatus::AwaitingAcknowledgment,
    }
}

/// Completion percentage of a plan's checklist. A plan without items has
/// made no progress.
pub fn plan_progress(completed: usize, total: usize) -> i32 {
    if total == 0 {
        return 0;
    }
    (100.0 * completed as f64 / total as f64).round() as i32
}

/// Progress drives the status; a blown deadline escalates anything short of
/// completion to Overdue. Completed pins the status regardless of deadline.
/// At zero progress the current status is kept as the baseline, so a plan
/// that was already advanced does not silently regress.
pub fn plan_status(
    progress: i32,
    current: PlanStatus,
    deadline: NaiveDateTime,
    now: NaiveDateTime,
) -> PlanStatus {
    let derived = if progress >= 100 {
        PlanStatus::Completed
    } else if progress > 0 {
        PlanStatus::InProgress
    } else {
        current
    };

    if derived != PlanStatus::Completed && deadline < now {
        return PlanStatus::Overdue;
    }
    derived
}
