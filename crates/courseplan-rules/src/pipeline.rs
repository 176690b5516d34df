use std::sync::Arc;

use serde_json::Value;

use courseplan_core::{
    plan_patch_schema, plan_submission_schema, sanitize_record, validate_record, Activity, Error,
    Plan, PlanId, Result, Review, SchemaViolations, ValidationMode, Violation,
};
use courseplan_store::{
    CourseCatalog, IdentityDirectory, PlanQueryService, PlanRepository, PlanStore, PlanUpdate,
};

use crate::engine::{ConstraintEngine, Verdict};
use crate::errors::{Outcome, Rejection};
use crate::model::{PlanPatch, PlanSubmission};

/// Request pipeline: structural validation, business rules, then storage.
///
/// Storage faults come back as `Err`; everything the client caused comes back
/// as `Ok(Outcome::Rejected(..))`.
#[derive(Clone)]
pub struct PlanService {
    engine: ConstraintEngine,
    store: PlanStore,
    queries: PlanQueryService,
}

impl PlanService {
    pub fn new(
        identity: Arc<dyn IdentityDirectory>,
        catalog: Arc<dyn CourseCatalog>,
        plans: Arc<dyn PlanRepository>,
    ) -> Self {
        Self {
            engine: ConstraintEngine::new(identity, catalog, plans.clone()),
            store: PlanStore::new(plans.clone()),
            queries: PlanQueryService::new(plans),
        }
    }

    /// Wire every collaborator to one backend.
    pub fn with_backend<B>(backend: Arc<B>) -> Self
    where
        B: IdentityDirectory + CourseCatalog + PlanRepository + 'static,
    {
        Self::new(backend.clone(), backend.clone(), backend)
    }

    pub fn engine(&self) -> &ConstraintEngine {
        &self.engine
    }

    pub fn queries(&self) -> &PlanQueryService {
        &self.queries
    }

    /// Create a plan from a submission record.
    pub async fn submit(&self, record: &Value) -> Result<Outcome<PlanId>> {
        let schema = plan_submission_schema();
        for mode in [ValidationMode::Strict, ValidationMode::Partial] {
            if let Err(violations) = validate_record(record, &schema, mode) {
                return Ok(input_rejected(violations));
            }
        }
        let submission = PlanSubmission::from_record(&sanitize_record(record, &schema));
        tracing::info!(
            event = "plan_submitted",
            student_id = %submission.student_id,
            courses = submission.courses.len(),
        );

        let verdict = self
            .engine
            .check_submission(
                &submission.student_id,
                &submission.plan_name,
                &submission.courses,
            )
            .await?;
        let student_id = match verdict {
            Verdict::Valid(student_id) => student_id,
            Verdict::Violated(violation) => return Ok(constraint_rejected(violation)),
        };

        let plan_id = self
            .store
            .create(student_id, &submission.plan_name, &submission.courses)
            .await?;
        Ok(Outcome::Accepted(plan_id))
    }

    /// Apply a patch record; accepted outcomes carry the affected-row count.
    pub async fn revise(&self, record: &Value) -> Result<Outcome<u64>> {
        let schema = plan_patch_schema();
        for mode in [ValidationMode::Strict, ValidationMode::Partial] {
            if let Err(violations) = validate_record(record, &schema, mode) {
                return Ok(input_rejected(violations));
            }
        }
        let Some(patch) = PlanPatch::from_record(&sanitize_record(record, &schema)) else {
            return Ok(Outcome::Rejected(Rejection::Input(
                SchemaViolations::from_message("Constraint violated: Invalid plan ID"),
            )));
        };

        let state = match self.engine.check_update(&patch).await {
            Ok(Verdict::Valid(state)) => state,
            Ok(Verdict::Violated(violation)) => return Ok(constraint_rejected(violation)),
            Err(Error::NotFound(_)) => {
                return Ok(Outcome::Rejected(Rejection::NotFound(patch.plan_id)));
            }
            Err(err) => return Err(err),
        };
        tracing::debug!(
            event = "plan_patch_checked",
            plan_id = patch.plan_id,
            status = %state.status,
        );

        let updated = self
            .store
            .update(&PlanUpdate {
                plan_id: patch.plan_id,
                plan_name: patch.plan_name,
                courses: patch.courses,
            })
            .await?;
        Ok(Outcome::Accepted(updated))
    }

    /// Delete a plan; an unknown id is rejected as not found.
    pub async fn remove(&self, plan_id: PlanId) -> Result<Outcome<u64>> {
        match self.store.delete(plan_id).await? {
            0 => Ok(Outcome::Rejected(Rejection::NotFound(plan_id))),
            deleted => Ok(Outcome::Accepted(deleted)),
        }
    }

    pub async fn plan(&self, plan_id: PlanId) -> Result<Outcome<Plan>> {
        found(plan_id, self.queries.get(plan_id).await)
    }

    pub async fn activity(&self, plan_id: PlanId) -> Result<Outcome<Vec<Activity>>> {
        found(plan_id, self.queries.activity(plan_id).await)
    }

    pub async fn history(&self, plan_id: PlanId) -> Result<Outcome<Vec<Review>>> {
        found(plan_id, self.queries.history(plan_id).await)
    }
}

/// Turn a missing plan into a rejection; other errors stay faults.
fn found<T>(plan_id: PlanId, result: Result<T>) -> Result<Outcome<T>> {
    match result {
        Ok(value) => Ok(Outcome::Accepted(value)),
        Err(Error::NotFound(_)) => Ok(Outcome::Rejected(Rejection::NotFound(plan_id))),
        Err(err) => Err(err),
    }
}

fn input_rejected<T>(violations: SchemaViolations) -> Outcome<T> {
    tracing::warn!(event = "input_rejected", reason = %violations);
    Outcome::Rejected(Rejection::Input(violations))
}

fn constraint_rejected<T>(violation: Violation) -> Outcome<T> {
    tracing::warn!(event = "constraint_violated", code = violation.code());
    Outcome::Rejected(Rejection::Constraint(violation))
}
