//! Declarative record schemas consumed by the validator.

use crate::course::MAX_COURSE_SLOTS;
use crate::{PLAN_NAME_MAX, PLAN_NAME_MIN};

/// Shape and bounds of a single field. All bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Integer value; `max: None` leaves the upper end open.
    Integer { min: i64, max: Option<i64> },
    /// String value whose length in characters lies in `[min_len, max_len]`.
    String { min_len: usize, max_len: usize },
    /// Strict ISO-8601 date or date-time.
    Timestamp,
    /// Flat list of nullable strings, at most `max_items` long.
    StringList { max_items: usize },
}

/// One field of a record schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub kind: FieldKind,
    /// Human-readable message reported when the field is invalid.
    pub message: String,
}

/// Ordered set of fields; order decides the order of reported violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    pub name: &'static str,
    fields: Vec<FieldSpec>,
}

impl RecordSchema {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Append a field, replacing any earlier field with the same name.
    pub fn field(
        mut self,
        name: &'static str,
        required: bool,
        kind: FieldKind,
        message: impl Into<String>,
    ) -> Self {
        self.fields.retain(|field| field.name != name);
        self.fields.push(FieldSpec {
            name,
            required,
            kind,
            message: message.into(),
        });
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

fn plan_name_kind() -> FieldKind {
    FieldKind::String {
        min_len: PLAN_NAME_MIN,
        max_len: PLAN_NAME_MAX,
    }
}

fn plan_name_message() -> String {
    format!(
        "Constraint violated: Invalid plan name\n\
         The plan name must be a string between {PLAN_NAME_MIN} and {PLAN_NAME_MAX} characters long."
    )
}

fn courses_message() -> String {
    format!(
        "Constraint violated: Invalid course list\n\
         Courses must be a list of at most {MAX_COURSE_SLOTS} course codes."
    )
}

/// Schema of a stored plan.
pub fn plan_schema() -> RecordSchema {
    RecordSchema::new("plan")
        .field(
            "status",
            false,
            FieldKind::Integer {
                min: 0,
                max: Some(4),
            },
            "Constraint violated: Invalid plan status\n\
             Plan status must be 0 (Rejected), 1 (Awaiting Student Changes), \
             2 (Awaiting Review), 3 (Awaiting Final Review), or 4 (Accepted).",
        )
        .field("planName", true, plan_name_kind(), plan_name_message())
        .field(
            "studentId",
            true,
            FieldKind::Integer { min: 1, max: None },
            "Constraint violated: Invalid user ID\n\
             The user ID associated with this plan must be an integer at least 1.",
        )
        .field(
            "lastUpdated",
            false,
            FieldKind::Timestamp,
            "Constraint violated: Invalid plan timestamp\n\
             The plan timestamp must be in ISO 8601 format.",
        )
}

/// Plan schema plus the course inputs a submission may carry: either a
/// `courses` list or the form's `course1`..`course12` slots.
pub fn plan_submission_schema() -> RecordSchema {
    let mut schema = plan_schema().field(
        "courses",
        false,
        FieldKind::StringList {
            max_items: MAX_COURSE_SLOTS,
        },
        courses_message(),
    );
    for slot in COURSE_SLOT_FIELDS {
        schema = schema.field(
            slot,
            false,
            FieldKind::String {
                min_len: 0,
                max_len: 20,
            },
            format!("Constraint violated: Invalid course in slot \"{slot}\""),
        );
    }
    RecordSchema {
        name: "plan_submission",
        ..schema
    }
}

/// Schema of a partial plan update.
pub fn plan_patch_schema() -> RecordSchema {
    RecordSchema::new("plan_patch")
        .field(
            "planId",
            true,
            FieldKind::Integer { min: 1, max: None },
            "Constraint violated: Invalid plan ID\n\
             The plan ID must be an integer at least 1.",
        )
        .field("planName", false, plan_name_kind(), plan_name_message())
        .field(
            "courses",
            false,
            FieldKind::StringList {
                max_items: MAX_COURSE_SLOTS,
            },
            courses_message(),
        )
}

/// Form field names of the twelve course slots.
pub const COURSE_SLOT_FIELDS: [&str; MAX_COURSE_SLOTS] = [
    "course1", "course2", "course3", "course4", "course5", "course6", "course7", "course8",
    "course9", "course10", "course11", "course12",
];
