//! Core contracts and helpers for courseplan.
//!
//! This crate defines the plan and catalog types, the record schema
//! validator, and the violation taxonomy shared by the store, rules and CLI
//! crates. Nothing here performs I/O.

pub mod course;
pub mod error;
pub mod plan;
pub mod redaction;
pub mod schema;
pub mod user;
pub mod validation;
pub mod violation;

pub use course::{compact_course_slots, Course, Restriction, MAX_COURSE_SLOTS};
pub use error::{Error, Result};
pub use plan::{
    Activity, ActivityKind, Plan, PlanHeader, PlanId, PlanState, PlanStatus, PlanSummary, Review,
    SortField,
};
pub use redaction::redact_database_url;
pub use schema::{
    plan_patch_schema, plan_schema, plan_submission_schema, FieldKind, FieldSpec, RecordSchema,
    COURSE_SLOT_FIELDS,
};
pub use user::{Role, User, UserId};
pub use validation::{
    integer_value, sanitize_record, scalar_text, validate_record, Record, SchemaViolations,
    ValidationMode,
};
pub use violation::Violation;

/// Inclusive bounds on a plan name, counted in characters.
pub const PLAN_NAME_MIN: usize = 5;
pub const PLAN_NAME_MAX: usize = 50;

/// Minimum credit sum a plan must reach.
pub const CREDITS_MIN: i64 = 32;
