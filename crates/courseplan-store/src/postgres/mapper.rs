use courseplan_core::{
    Activity, ActivityKind, Course, Error, PlanHeader, PlanState, PlanStatus, PlanSummary,
    Restriction, Result, Role, User,
};

use super::queries::{RawActivity, RawCourse, RawPlan, RawPlanState, RawPlanSummary, RawUser};

fn status_from_code(code: i16) -> Result<PlanStatus> {
    PlanStatus::from_code(code)
        .ok_or_else(|| Error::InvalidRecord(format!("unknown plan status code {code}")))
}

pub fn map_user(raw: RawUser) -> Result<User> {
    let role = Role::from_code(raw.role)
        .ok_or_else(|| Error::InvalidRecord(format!("unknown role code {}", raw.role)))?;
    Ok(User {
        user_id: raw.user_id,
        first_name: raw.first_name,
        last_name: raw.last_name,
        role,
    })
}

pub fn map_plan(raw: RawPlan) -> Result<PlanHeader> {
    Ok(PlanHeader {
        plan_id: raw.plan_id,
        student_id: raw.student_id,
        plan_name: raw.plan_name,
        status: status_from_code(raw.status)?,
        created: raw.created,
        last_updated: raw.last_updated,
    })
}

pub fn map_plans(raw: Vec<RawPlan>) -> Result<Vec<PlanHeader>> {
    raw.into_iter().map(map_plan).collect()
}

pub fn map_plan_state(raw: RawPlanState) -> Result<PlanState> {
    Ok(PlanState {
        owner: raw.student_id,
        status: status_from_code(raw.status)?,
    })
}

pub fn map_summaries(raw: Vec<RawPlanSummary>) -> Result<Vec<PlanSummary>> {
    raw.into_iter()
        .map(|row| {
            Ok(PlanSummary {
                header: map_plan(row.plan)?,
                first_name: row.first_name,
                last_name: row.last_name,
            })
        })
        .collect()
}

pub fn map_courses(raw: Vec<RawCourse>) -> Vec<Course> {
    raw.into_iter()
        .map(|row| Course {
            course_id: row.course_id,
            course_code: row.course_code,
            title: row.title,
            credits: row.credits,
            restriction: Restriction::from_level(row.restriction),
        })
        .collect()
}

/// Split the normalized envelope back into comments and reviews.
pub fn map_activity(raw: Vec<RawActivity>) -> Result<Vec<Activity>> {
    raw.into_iter()
        .map(|row| {
            let kind = if row.status < 0 {
                ActivityKind::Comment {
                    comment_id: row.comment_id,
                    text: row.text,
                }
            } else {
                ActivityKind::Review {
                    review_id: row.review_id,
                    status: status_from_code(row.status)?,
                }
            };
            Ok(Activity {
                kind,
                plan_id: row.plan_id,
                user_id: row.user_id,
                first_name: row.first_name,
                last_name: row.last_name,
                time: row.time,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn envelope(review_id: i64, comment_id: i64, text: &str, status: i16) -> RawActivity {
        RawActivity {
            review_id,
            comment_id,
            plan_id: 3,
            user_id: 8,
            text: text.to_string(),
            status,
            time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            first_name: "Ada".to_string(),
            last_name: "Byron".to_string(),
        }
    }

    #[test]
    fn sentinel_status_marks_comments() {
        let activity = map_activity(vec![
            envelope(0, 4, "Consider MTH 254", -1),
            envelope(6, 0, "", 1),
        ])
        .expect("map activity");

        assert_eq!(
            activity[0].kind,
            ActivityKind::Comment {
                comment_id: 4,
                text: "Consider MTH 254".to_string()
            }
        );
        assert_eq!(
            activity[1].kind,
            ActivityKind::Review {
                review_id: 6,
                status: PlanStatus::AwaitingStudentChanges
            }
        );
    }

    #[test]
    fn unknown_status_is_an_invalid_record() {
        let err = map_activity(vec![envelope(6, 0, "", 9)]).expect_err("status 9");
        assert!(matches!(err, Error::InvalidRecord(_)));
    }
}
