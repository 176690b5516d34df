use serde::{Deserialize, Serialize};

use crate::{CREDITS_MIN, PLAN_NAME_MAX, PLAN_NAME_MIN};

/// Business rule a plan submission or update failed.
///
/// Variants are declared in the order the constraint engine checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    UnknownUser,
    NotAStudent,
    InvalidName,
    EmptyPlan,
    DuplicateCourse,
    InvalidCourse,
    RequiredCourseSelected,
    RestrictedCourseSelected,
    InsufficientCredits,
}

impl Violation {
    /// Stable machine-readable tag.
    pub fn code(self) -> &'static str {
        match self {
            Violation::UnknownUser => "unknown_user",
            Violation::NotAStudent => "not_a_student",
            Violation::InvalidName => "invalid_name",
            Violation::EmptyPlan => "empty_plan",
            Violation::DuplicateCourse => "duplicate_course",
            Violation::InvalidCourse => "invalid_course",
            Violation::RequiredCourseSelected => "required_course_selected",
            Violation::RestrictedCourseSelected => "restricted_course_selected",
            Violation::InsufficientCredits => "insufficient_credits",
        }
    }

    /// Message shown to the submitting user.
    pub fn message(self) -> String {
        match self {
            Violation::UnknownUser => "Invalid ONID. Unable to submit plan.".to_string(),
            Violation::NotAStudent => "Only students can submit plans.".to_string(),
            Violation::InvalidName => format!(
                "The plan name must be between {PLAN_NAME_MIN} and {PLAN_NAME_MAX} characters long."
            ),
            Violation::EmptyPlan => "No courses selected.".to_string(),
            Violation::DuplicateCourse => "A course was selected more than once.".to_string(),
            Violation::InvalidCourse => "At least one selected course is invalid.".to_string(),
            Violation::RequiredCourseSelected => "A required course was selected.".to_string(),
            Violation::RestrictedCourseSelected => {
                "A graduate or professional/technical course was selected.".to_string()
            }
            Violation::InsufficientCredits => {
                format!("Less than {CREDITS_MIN} credits selected.")
            }
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}
