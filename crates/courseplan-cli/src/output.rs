//! Plain-text rendering of query results.

use chrono::{DateTime, Utc};

use courseplan_core::{Activity, ActivityKind, Plan, PlanHeader, PlanSummary, Review};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

fn time(value: &DateTime<Utc>) -> String {
    value.format(TIME_FORMAT).to_string()
}

pub fn render_plan(plan: &Plan) -> String {
    let header = &plan.header;
    let mut out = format!(
        "plan {} \"{}\"\nstudent {}\nstatus {}\ncreated {}\nupdated {}\n",
        header.plan_id,
        header.plan_name,
        header.student_id,
        header.status,
        time(&header.created),
        time(&header.last_updated),
    );
    for course in &plan.courses {
        out.push_str(&format!(
            "  {:<10} {:>2}  {}\n",
            course.course_code, course.credits, course.title
        ));
    }
    out.push_str(&format!(
        "{} courses, {} credits\n",
        plan.courses.len(),
        plan.total_credits()
    ));
    out
}

pub fn render_summaries(plans: &[PlanSummary]) -> String {
    plans
        .iter()
        .map(|plan| {
            format!(
                "{:>6}  {:<26}  {:<24}  {}  {}\n",
                plan.header.plan_id,
                plan.header.status.label(),
                format!("{} {}", plan.first_name, plan.last_name),
                time(&plan.header.last_updated),
                plan.header.plan_name,
            )
        })
        .collect()
}

pub fn render_headers(plans: &[PlanHeader]) -> String {
    plans
        .iter()
        .map(|plan| {
            format!(
                "{:>6}  {:<26}  {}  {}\n",
                plan.plan_id,
                plan.status.label(),
                time(&plan.last_updated),
                plan.plan_name,
            )
        })
        .collect()
}

pub fn render_activity(entries: &[Activity]) -> String {
    entries
        .iter()
        .map(|entry| {
            let what = match &entry.kind {
                ActivityKind::Comment { text, .. } => format!("commented: {text}"),
                ActivityKind::Review { status, .. } => format!("set status to {status}"),
            };
            format!(
                "{}  {} {} {}\n",
                time(&entry.time),
                entry.first_name,
                entry.last_name,
                what
            )
        })
        .collect()
}

pub fn render_history(reviews: &[Review]) -> String {
    reviews
        .iter()
        .map(|review| {
            format!(
                "{}  user {:<6}  {}\n",
                time(&review.time),
                review.user_id,
                review.status
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use courseplan_core::{Course, PlanStatus, Restriction};

    use super::*;

    fn header() -> PlanHeader {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        PlanHeader {
            plan_id: 7,
            student_id: 1,
            plan_name: "Systems Track".to_string(),
            status: PlanStatus::AwaitingReview,
            created: at,
            last_updated: at,
        }
    }

    #[test]
    fn plan_lists_courses_and_credit_total() {
        let plan = Plan {
            header: header(),
            courses: vec![Course {
                course_id: 1,
                course_code: "CS 161".to_string(),
                title: "Intro to Computer Science I".to_string(),
                credits: 4,
                restriction: Restriction::None,
            }],
        };
        let text = render_plan(&plan);
        assert!(text.starts_with("plan 7 \"Systems Track\"\n"));
        assert!(text.contains("status Awaiting Review\n"));
        assert!(text.contains("CS 161"));
        assert!(text.ends_with("1 courses, 4 credits\n"));
    }

    #[test]
    fn activity_describes_each_kind() {
        let base = Activity {
            kind: ActivityKind::Comment {
                comment_id: 3,
                text: "Looks good".to_string(),
            },
            plan_id: 7,
            user_id: 2,
            first_name: "Alan".to_string(),
            last_name: "Turing".to_string(),
            time: header().created,
        };
        let review = Activity {
            kind: ActivityKind::Review {
                review_id: 4,
                status: PlanStatus::Accepted,
            },
            ..base.clone()
        };
        let text = render_activity(&[review, base]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "2024-03-01 09:30  Alan Turing set status to Accepted");
        assert_eq!(lines[1], "2024-03-01 09:30  Alan Turing commented: Looks good");
    }
}
