use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::model::{PlanPatch, PlanSubmission};

/// Emit the JSON Schema of a plan submission.
pub fn plan_submission_json_schema() -> RootSchema {
    schema_for!(PlanSubmission)
}

/// Emit the JSON Schema of a plan patch.
pub fn plan_patch_json_schema() -> RootSchema {
    schema_for!(PlanPatch)
}
