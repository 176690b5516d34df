//! Ordered business rules for plan submissions and updates.
//!
//! Checks run one after another and stop at the first failure, so a request
//! breaking several rules is always reported under the earliest one:
//!
//! 1. the user exists
//! 2. the user is a student
//! 3. the plan name is 5 to 50 characters
//! 4. at least one course is selected
//! 5. no course is selected twice
//! 6. every course exists in the catalog
//! 7. no required or graduate-level course is selected
//! 8. the courses add up to at least 32 credits

use std::collections::HashSet;
use std::sync::Arc;

use courseplan_core::{
    Error, PlanState, Result, User, UserId, Violation, CREDITS_MIN, PLAN_NAME_MAX, PLAN_NAME_MIN,
};
use courseplan_store::{CourseCatalog, IdentityDirectory, PlanRepository};

use crate::model::PlanPatch;

/// Engine verdict; `Valid` carries what the checks learned along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict<T = ()> {
    Valid(T),
    Violated(Violation),
}

impl<T> Verdict<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid(_))
    }

    pub fn violation(&self) -> Option<Violation> {
        match self {
            Verdict::Valid(_) => None,
            Verdict::Violated(violation) => Some(*violation),
        }
    }
}

/// Short-circuits on the first `Some(violation)`.
macro_rules! check {
    ($violation:expr) => {
        if let Some(violation) = $violation {
            return Ok(Verdict::Violated(violation));
        }
    };
}

#[derive(Clone)]
pub struct ConstraintEngine {
    identity: Arc<dyn IdentityDirectory>,
    catalog: Arc<dyn CourseCatalog>,
    plans: Arc<dyn PlanRepository>,
}

impl ConstraintEngine {
    pub fn new(
        identity: Arc<dyn IdentityDirectory>,
        catalog: Arc<dyn CourseCatalog>,
        plans: Arc<dyn PlanRepository>,
    ) -> Self {
        Self {
            identity,
            catalog,
            plans,
        }
    }

    /// Run every rule against a new plan. A valid verdict carries the
    /// resolved student id.
    pub async fn check_submission(
        &self,
        user_id: &str,
        plan_name: &str,
        courses: &[String],
    ) -> Result<Verdict<UserId>> {
        let Some(user) = self.lookup_user(user_id).await? else {
            return Ok(Verdict::Violated(Violation::UnknownUser));
        };
        if !user.is_student() {
            return Ok(Verdict::Violated(Violation::NotAStudent));
        }
        check!(plan_name_violation(plan_name));
        check!(self.course_violation(courses).await?);

        tracing::debug!(event = "constraints_passed", user_id = user.user_id);
        Ok(Verdict::Valid(user.user_id))
    }

    /// Check the fields a patch carries. Identity checks do not apply; the
    /// plan's current owner and status come back with a valid verdict.
    ///
    /// Fails with [`Error::NotFound`] when the plan does not exist.
    pub async fn check_update(&self, patch: &PlanPatch) -> Result<Verdict<PlanState>> {
        let state = self
            .plans
            .plan_state(patch.plan_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("plan {}", patch.plan_id)))?;

        if let Some(plan_name) = &patch.plan_name {
            check!(plan_name_violation(plan_name));
        }
        if let Some(courses) = &patch.courses {
            check!(self.course_violation(courses).await?);
        }

        tracing::debug!(
            event = "constraints_passed",
            plan_id = patch.plan_id,
            status = %state.status,
            review_reset = patch.courses.is_some() && state.needs_review_reset(),
        );
        Ok(Verdict::Valid(state))
    }

    /// Empty, non-numeric and non-positive ids never match a user.
    async fn lookup_user(&self, user_id: &str) -> Result<Option<User>> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Ok(None);
        }
        match user_id.parse::<UserId>() {
            Ok(id) if id > 0 => self.identity.find_user(id).await,
            _ => Ok(None),
        }
    }

    /// Rules 4 to 8 over a compacted course list.
    async fn course_violation(&self, courses: &[String]) -> Result<Option<Violation>> {
        if courses.is_empty() {
            return Ok(Some(Violation::EmptyPlan));
        }
        if has_duplicates(courses) {
            return Ok(Some(Violation::DuplicateCourse));
        }
        if self.catalog.count_existing(courses).await? != courses.len() as i64 {
            return Ok(Some(Violation::InvalidCourse));
        }
        let restrictions = self.catalog.restrictions_of(courses).await?;
        if let Some(violation) = restriction_violation(&restrictions) {
            return Ok(Some(violation));
        }
        if self.catalog.credit_sum_of(courses).await? < CREDITS_MIN {
            return Ok(Some(Violation::InsufficientCredits));
        }
        Ok(None)
    }
}

fn plan_name_violation(plan_name: &str) -> Option<Violation> {
    let len = plan_name.chars().count();
    (!(PLAN_NAME_MIN..=PLAN_NAME_MAX).contains(&len)).then_some(Violation::InvalidName)
}

fn has_duplicates(courses: &[String]) -> bool {
    let mut seen = HashSet::with_capacity(courses.len());
    courses.iter().any(|code| !seen.insert(code.as_str()))
}

/// `restrictions` is ordered ascending, so the first entry is the lowest
/// nonzero level.
fn restriction_violation(restrictions: &[(String, i16)]) -> Option<Violation> {
    restrictions.first().map(|(_, level)| {
        if *level == 1 {
            Violation::RequiredCourseSelected
        } else {
            Violation::RestrictedCourseSelected
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn duplicates_use_exact_equality() {
        assert!(has_duplicates(&codes(&["CS 161", "CS 161"])));
        assert!(!has_duplicates(&codes(&["CS 161", "cs 161"])));
        assert!(!has_duplicates(&codes(&["CS 161"])));
    }

    #[test]
    fn name_bounds_count_characters() {
        assert_eq!(plan_name_violation("Plan"), Some(Violation::InvalidName));
        assert_eq!(plan_name_violation("Pläne"), None);
        assert_eq!(plan_name_violation(&"x".repeat(50)), None);
        assert_eq!(
            plan_name_violation(&"x".repeat(51)),
            Some(Violation::InvalidName)
        );
    }

    #[test]
    fn lowest_restriction_decides() {
        let restrictions = vec![("CS 201".to_string(), 1), ("CS 535".to_string(), 2)];
        assert_eq!(
            restriction_violation(&restrictions),
            Some(Violation::RequiredCourseSelected)
        );
        assert_eq!(
            restriction_violation(&restrictions[1..]),
            Some(Violation::RestrictedCourseSelected)
        );
        assert_eq!(restriction_violation(&[]), None);
    }
}
