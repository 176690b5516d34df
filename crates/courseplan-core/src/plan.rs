use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::course::Course;
use crate::user::UserId;

/// Identifier assigned to a plan by the store.
pub type PlanId = i64;

/// Review lifecycle of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Rejected,
    AwaitingStudentChanges,
    AwaitingReview,
    AwaitingFinalReview,
    Accepted,
}

impl PlanStatus {
    pub const ALL: [PlanStatus; 5] = [
        PlanStatus::Rejected,
        PlanStatus::AwaitingStudentChanges,
        PlanStatus::AwaitingReview,
        PlanStatus::AwaitingFinalReview,
        PlanStatus::Accepted,
    ];

    /// Stored status code (0..=4).
    pub fn code(self) -> i16 {
        match self {
            PlanStatus::Rejected => 0,
            PlanStatus::AwaitingStudentChanges => 1,
            PlanStatus::AwaitingReview => 2,
            PlanStatus::AwaitingFinalReview => 3,
            PlanStatus::Accepted => 4,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            PlanStatus::Rejected => "Rejected",
            PlanStatus::AwaitingStudentChanges => "Awaiting Student Changes",
            PlanStatus::AwaitingReview => "Awaiting Review",
            PlanStatus::AwaitingFinalReview => "Awaiting Final Review",
            PlanStatus::Accepted => "Accepted",
        }
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Plan row without its course selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanHeader {
    pub plan_id: PlanId,
    pub student_id: UserId,
    pub plan_name: String,
    pub status: PlanStatus,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// A plan with its selected courses embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(flatten)]
    pub header: PlanHeader,
    pub courses: Vec<Course>,
}

impl Plan {
    /// Selected course codes in stored order.
    pub fn course_codes(&self) -> Vec<&str> {
        self.courses
            .iter()
            .map(|course| course.course_code.as_str())
            .collect()
    }

    pub fn total_credits(&self) -> i64 {
        self.courses.iter().map(|course| i64::from(course.credits)).sum()
    }
}

/// Listing entry: plan header joined with the owning student's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    #[serde(flatten)]
    pub header: PlanHeader,
    pub first_name: String,
    pub last_name: String,
}

/// Owner and status of an existing plan, read before an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanState {
    pub owner: UserId,
    pub status: PlanStatus,
}

impl PlanState {
    /// Course changes on a plan outside `AwaitingReview` append a reset review.
    pub fn needs_review_reset(&self) -> bool {
        self.status != PlanStatus::AwaitingReview
    }
}

/// Column a plan listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Created,
    #[default]
    LastUpdated,
}

/// Append-only review history row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub review_id: i64,
    pub plan_id: PlanId,
    pub user_id: UserId,
    pub status: PlanStatus,
    pub time: DateTime<Utc>,
}

/// What an activity entry carries besides the shared envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityKind {
    Comment { comment_id: i64, text: String },
    Review { review_id: i64, status: PlanStatus },
}

/// One entry in a plan's merged comment/review stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(flatten)]
    pub kind: ActivityKind,
    pub plan_id: PlanId,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip() {
        for status in PlanStatus::ALL {
            assert_eq!(PlanStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(PlanStatus::from_code(5), None);
        assert_eq!(PlanStatus::from_code(-1), None);
    }

    #[test]
    fn only_awaiting_review_skips_reset() {
        for status in PlanStatus::ALL {
            let state = PlanState { owner: 1, status };
            assert_eq!(
                state.needs_review_reset(),
                status != PlanStatus::AwaitingReview
            );
        }
    }
}
