//! Multi-statement plan writes.
//!
//! Creating a plan takes two statements: the header insert and the
//! selected-course insert. If the second fails, the header is deleted again
//! before the error is returned. The two statements and the compensating
//! delete do not share a transaction, so a crash between them can leave a
//! header with no courses behind.

use std::sync::Arc;

use courseplan_core::{Error, PlanId, Result, UserId};

use crate::adapter::PlanRepository;

/// Fields of a plan that an update replaces; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanUpdate {
    pub plan_id: PlanId,
    pub plan_name: Option<String>,
    /// Replaces the whole selection when present.
    pub courses: Option<Vec<String>>,
}

/// Write side of plan persistence.
#[derive(Clone)]
pub struct PlanStore {
    repo: Arc<dyn PlanRepository>,
}

impl PlanStore {
    pub fn new(repo: Arc<dyn PlanRepository>) -> Self {
        Self { repo }
    }

    /// Insert a plan in `AwaitingReview` together with its courses.
    ///
    /// Either both writes are visible afterwards or neither is.
    pub async fn create(
        &self,
        student_id: UserId,
        plan_name: &str,
        courses: &[String],
    ) -> Result<PlanId> {
        let plan_id = self.repo.insert_plan(student_id, plan_name).await?;

        if let Err(err) = self.repo.insert_selected_courses(plan_id, courses).await {
            tracing::warn!(event = "course_insert_failed", plan_id, error = %err);
            match self.repo.delete_plan(plan_id).await {
                Ok(_) => tracing::info!(event = "plan_compensated", plan_id),
                Err(cleanup) => {
                    tracing::error!(event = "plan_compensation_failed", plan_id, error = %cleanup)
                }
            }
            return Err(Error::Db(format!(
                "saving courses for plan {plan_id} failed: {err}"
            )));
        }

        tracing::info!(event = "plan_created", plan_id, student_id, courses = courses.len());
        Ok(plan_id)
    }

    /// Apply a rename and/or a course replacement.
    ///
    /// Replacing courses moves the plan back to `AwaitingReview`; when it was
    /// in any other status a review row recording the reset is appended.
    /// Returns the number of rows touched across all statements.
    pub async fn update(&self, update: &PlanUpdate) -> Result<u64> {
        let plan_id = update.plan_id;
        let mut updated_rows = 0;

        if let Some(plan_name) = &update.plan_name {
            updated_rows += self.repo.rename_plan(plan_id, plan_name).await?;
        }

        if let Some(courses) = &update.courses {
            let state = self
                .repo
                .plan_state(plan_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("plan {plan_id}")))?;

            if state.needs_review_reset() {
                updated_rows += self.repo.reset_review_status(plan_id, state.owner).await?;
                tracing::info!(
                    event = "review_status_reset",
                    plan_id,
                    previous = %state.status,
                );
            } else {
                updated_rows += self.repo.touch_plan(plan_id).await?;
            }

            updated_rows += self.repo.clear_selected_courses(plan_id).await?;
            updated_rows += self.repo.insert_selected_courses(plan_id, courses).await?;
        }

        tracing::info!(event = "plan_updated", plan_id, updated_rows);
        Ok(updated_rows)
    }

    /// Delete a plan; zero affected rows means it did not exist.
    pub async fn delete(&self, plan_id: PlanId) -> Result<u64> {
        let deleted = self.repo.delete_plan(plan_id).await?;
        tracing::info!(event = "plan_deleted", plan_id, deleted);
        Ok(deleted)
    }
}
