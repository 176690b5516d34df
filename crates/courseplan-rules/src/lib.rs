//! Plan submission rules and the request pipeline.
//!
//! A request record is validated structurally, checked against the ordered
//! business rules, and only then written through the plan store.

pub mod engine;
pub mod errors;
pub mod model;
pub mod pipeline;
pub mod schema;

pub use engine::{ConstraintEngine, Verdict};
pub use errors::{Outcome, Rejection};
pub use model::{PlanPatch, PlanSubmission};
pub use pipeline::PlanService;
pub use schema::{plan_patch_json_schema, plan_submission_json_schema};
