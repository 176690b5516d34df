use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use courseplan_core::{
    compact_course_slots, integer_value, scalar_text, PlanId, Record, COURSE_SLOT_FIELDS,
};

/// A new plan as submitted by a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanSubmission {
    /// Submitting user's id, as entered.
    pub student_id: String,
    pub plan_name: String,
    /// Course codes with empty slots removed, in submitted order.
    #[serde(default)]
    pub courses: Vec<String>,
}

impl PlanSubmission {
    /// Build from a sanitized submission record.
    ///
    /// Courses come from the `courses` list when present, otherwise from the
    /// `course1`..`course12` slots. A `courses` value that is not a list
    /// yields no courses; validation rejects that shape before this runs.
    pub fn from_record(record: &Record) -> Self {
        let courses = match record.get("courses") {
            Some(Value::Array(items)) => compact_course_slots(items.iter().map(Value::as_str)),
            Some(_) => Vec::new(),
            None => compact_course_slots(
                COURSE_SLOT_FIELDS
                    .iter()
                    .map(|slot| record.get(*slot).and_then(scalar_text)),
            ),
        };

        Self {
            student_id: id_text(record, "studentId").unwrap_or_default(),
            plan_name: record
                .get("planName")
                .and_then(scalar_text)
                .unwrap_or_default(),
            courses,
        }
    }
}

/// A partial update to an existing plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanPatch {
    pub plan_id: PlanId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_name: Option<String>,
    /// `None` leaves the selection alone. A list that is empty after
    /// compaction also counts as "not provided".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courses: Option<Vec<String>>,
}

impl PlanPatch {
    /// Build from a sanitized patch record; `None` when `planId` is unusable.
    pub fn from_record(record: &Record) -> Option<Self> {
        let plan_id = integer_value(record.get("planId")?)?;

        let courses = record
            .get("courses")
            .and_then(Value::as_array)
            .map(|items| compact_course_slots(items.iter().map(Value::as_str)))
            .filter(|courses| !courses.is_empty());

        Some(Self {
            plan_id,
            plan_name: record.get("planName").and_then(scalar_text),
            courses,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.plan_name.is_none() && self.courses.is_none()
    }
}

/// Ids read the way the validator reads integers, so `1.0` and `"1"` both
/// become `"1"`. Anything else is kept as entered.
fn id_text(record: &Record, key: &str) -> Option<String> {
    let value = record.get(key)?;
    integer_value(value)
        .map(|id| id.to_string())
        .or_else(|| scalar_text(value))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn submission_reads_course_list() {
        let submission = PlanSubmission::from_record(&record(json!({
            "studentId": 12,
            "planName": "Systems Track",
            "courses": ["CS 161", null, "", "CS 162"]
        })));
        assert_eq!(submission.student_id, "12");
        assert_eq!(submission.courses, vec!["CS 161", "CS 162"]);
    }

    #[test]
    fn submission_falls_back_to_slots() {
        let submission = PlanSubmission::from_record(&record(json!({
            "studentId": "12",
            "planName": "Systems Track",
            "course1": "CS 161",
            "course2": "",
            "course7": "MTH 251"
        })));
        assert_eq!(submission.courses, vec!["CS 161", "MTH 251"]);
    }

    #[test]
    fn empty_patch_course_list_means_not_provided() {
        let patch = PlanPatch::from_record(&record(json!({ "planId": 5, "courses": [] })))
            .expect("plan id present");
        assert_eq!(patch.plan_id, 5);
        assert_eq!(patch.courses, None);
        assert!(patch.is_empty());

        let patch =
            PlanPatch::from_record(&record(json!({ "planId": "5", "courses": [null, " "] })))
                .expect("plan id present");
        assert_eq!(patch.courses, None);
    }

    #[test]
    fn integral_float_ids_read_as_integers() {
        let submission = PlanSubmission::from_record(&record(json!({
            "studentId": 1.0,
            "planName": "Systems Track",
            "courses": ["CS 161"]
        })));
        assert_eq!(submission.student_id, "1");

        let patch = PlanPatch::from_record(&record(json!({ "planId": 5.0 })))
            .expect("integral plan id");
        assert_eq!(patch.plan_id, 5);
    }

    #[test]
    fn malformed_course_list_does_not_fall_back_to_slots() {
        let submission = PlanSubmission::from_record(&record(json!({
            "studentId": "12",
            "planName": "Systems Track",
            "courses": 42,
            "course1": "CS 161"
        })));
        assert!(submission.courses.is_empty());
    }

    #[test]
    fn patch_requires_plan_id() {
        assert!(PlanPatch::from_record(&record(json!({ "planName": "Renamed" }))).is_none());
    }
}
