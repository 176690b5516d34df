use std::collections::BTreeSet;
use std::sync::Arc;

use courseplan_core::{PlanStatus, Role, Violation};
use courseplan_rules::{Outcome, PlanService, Rejection};
use courseplan_store::MemoryBackend;
use serde_json::{json, Value};

const CORE: [&str; 8] = [
    "CS 161", "CS 162", "CS 261", "CS 271", "CS 290", "CS 325", "CS 340", "CS 344",
];

struct Fixture {
    backend: Arc<MemoryBackend>,
    service: PlanService,
    student: i64,
    advisor: i64,
}

async fn fixture() -> Fixture {
    let backend = Arc::new(MemoryBackend::new());
    let student = backend.add_user("Grace", "Hopper", Role::Student).await.user_id;
    let advisor = backend.add_user("Alan", "Turing", Role::Advisor).await.user_id;
    for code in CORE {
        backend.add_course(code, 4, 0).await;
    }
    backend.add_course("CS 101", 4, 0).await;
    backend.add_course("CS 102", 3, 0).await;
    backend.add_course("CS 361", 4, 0).await;
    Fixture {
        service: PlanService::with_backend(backend.clone()),
        backend,
        student,
        advisor,
    }
}

fn submission(student: i64, courses: &[&str]) -> Value {
    json!({ "studentId": student, "planName": "Systems Track", "courses": courses })
}

async fn submit_core(fx: &Fixture) -> i64 {
    fx.service
        .submit(&submission(fx.student, &CORE))
        .await
        .expect("submit")
        .accepted()
        .expect("plan accepted")
}

#[tokio::test]
async fn accepted_submission_is_stored_awaiting_review() {
    let fx = fixture().await;
    let plan_id = submit_core(&fx).await;

    let plan = fx
        .service
        .plan(plan_id)
        .await
        .expect("read")
        .accepted()
        .expect("plan exists");
    assert_eq!(plan.header.status, PlanStatus::AwaitingReview);
    let stored: BTreeSet<_> = plan.course_codes().into_iter().collect();
    assert_eq!(stored, CORE.into_iter().collect());
}

#[tokio::test]
async fn form_slots_are_compacted_before_the_rules() {
    let fx = fixture().await;
    let mut record = json!({ "studentId": fx.student.to_string(), "planName": "Systems Track" });
    for (idx, code) in CORE.iter().enumerate() {
        record[format!("course{}", idx + 1)] = json!(code);
    }
    record["course9"] = json!("");
    record["course12"] = Value::Null;

    let outcome = fx.service.submit(&record).await.expect("submit");
    assert!(outcome.is_accepted(), "unexpected {outcome:?}");
}

#[tokio::test]
async fn malformed_record_never_reaches_the_store() {
    let fx = fixture().await;
    let outcome = fx
        .service
        .submit(&json!({ "planName": "abc", "studentId": 0, "courses": CORE }))
        .await
        .expect("submit");

    let Some(Rejection::Input(violations)) = outcome.rejection() else {
        panic!("expected an input rejection, got {outcome:?}");
    };
    assert_eq!(violations.messages().len(), 2);
    assert_eq!(fx.backend.plan_count().await, 0);
}

#[tokio::test]
async fn more_than_twelve_courses_is_an_input_rejection() {
    let fx = fixture().await;
    let mut courses: Vec<String> = CORE.iter().map(|code| code.to_string()).collect();
    for idx in 0..5 {
        let code = format!("CS 4{idx}0");
        fx.backend.add_course(&code, 4, 0).await;
        courses.push(code);
    }
    assert_eq!(courses.len(), 13);

    let outcome = fx
        .service
        .submit(&json!({ "studentId": fx.student, "planName": "Systems Track", "courses": courses }))
        .await
        .expect("submit");
    let Some(Rejection::Input(violations)) = outcome.rejection() else {
        panic!("expected an input rejection, got {outcome:?}");
    };
    assert!(violations.message().contains("Invalid course list"));
    assert_eq!(fx.backend.plan_count().await, 0);
}

#[tokio::test]
async fn malformed_course_list_is_rejected_not_reinterpreted() {
    let fx = fixture().await;
    let mut record = json!({ "studentId": fx.student, "planName": "Systems Track", "courses": 42 });
    for (idx, code) in CORE.iter().enumerate() {
        record[format!("course{}", idx + 1)] = json!(code);
    }
    let outcome = fx.service.submit(&record).await.expect("submit");
    assert_eq!(outcome.rejection().map(Rejection::code), Some("invalid_input"));

    let outcome = fx
        .service
        .submit(&json!({ "studentId": fx.student, "planName": "Systems Track", "courses": [161, 162] }))
        .await
        .expect("submit");
    assert_eq!(outcome.rejection().map(Rejection::code), Some("invalid_input"));
    assert_eq!(fx.backend.plan_count().await, 0);
}

#[tokio::test]
async fn integral_float_student_id_is_the_same_student() {
    let fx = fixture().await;
    let outcome = fx
        .service
        .submit(&json!({
            "studentId": fx.student as f64,
            "planName": "Systems Track",
            "courses": CORE
        }))
        .await
        .expect("submit");
    let plan_id = outcome.accepted().expect("plan accepted");
    let plan = fx.service.queries().get(plan_id).await.expect("get");
    assert_eq!(plan.header.student_id, fx.student);
}

#[tokio::test]
async fn rule_violations_are_rejections_not_faults() {
    let fx = fixture().await;
    let outcome = fx
        .service
        .submit(&json!({
            "studentId": fx.student,
            "planName": "My Plan",
            "courses": ["CS 101", "CS 102"]
        }))
        .await
        .expect("submit");
    assert_eq!(
        outcome,
        Outcome::Rejected(Rejection::Constraint(Violation::InsufficientCredits))
    );

    let outcome = fx
        .service
        .submit(&submission(fx.advisor, &CORE))
        .await
        .expect("submit");
    assert_eq!(
        outcome.rejection().map(Rejection::code),
        Some("not_a_student")
    );
    assert_eq!(fx.backend.plan_count().await, 0);
}

#[tokio::test]
async fn storage_failure_surfaces_as_fault_without_orphan() {
    let fx = fixture().await;
    fx.backend.fail_course_inserts(true);

    let err = fx
        .service
        .submit(&submission(fx.student, &CORE))
        .await
        .expect_err("course insert forced to fail");
    assert_eq!(
        err.public_message(),
        "An internal server error occurred. Please try again later."
    );
    assert_eq!(fx.backend.plan_count().await, 0);
}

#[tokio::test]
async fn empty_course_list_in_patch_means_no_change() {
    let fx = fixture().await;
    let plan_id = submit_core(&fx).await;
    let before = fx.service.queries().get(plan_id).await.expect("get");

    let outcome = fx
        .service
        .revise(&json!({ "planId": plan_id, "courses": [] }))
        .await
        .expect("revise");
    assert_eq!(outcome, Outcome::Accepted(0));

    let after = fx.service.queries().get(plan_id).await.expect("get");
    assert_eq!(before, after);
}

#[tokio::test]
async fn patch_replaces_courses_and_resets_review() {
    let fx = fixture().await;
    let plan_id = submit_core(&fx).await;
    fx.backend
        .add_review(plan_id, fx.advisor, PlanStatus::AwaitingStudentChanges)
        .await
        .expect("review");

    let mut courses: Vec<&str> = CORE[1..].to_vec();
    courses.push("CS 361");
    let outcome = fx
        .service
        .revise(&json!({ "planId": plan_id, "planName": "Revised Track", "courses": courses }))
        .await
        .expect("revise");
    // rename + review row + status + eight cleared + eight inserted
    assert_eq!(outcome, Outcome::Accepted(1 + 2 + 8 + 8));

    let plan = fx.service.queries().get(plan_id).await.expect("get");
    assert_eq!(plan.header.plan_name, "Revised Track");
    assert_eq!(plan.header.status, PlanStatus::AwaitingReview);
    assert!(plan.course_codes().contains(&"CS 361"));
    assert!(!plan.course_codes().contains(&"CS 161"));
}

#[tokio::test]
async fn patch_is_checked_before_writing() {
    let fx = fixture().await;
    let plan_id = submit_core(&fx).await;

    let outcome = fx
        .service
        .revise(&json!({ "planId": plan_id, "courses": ["CS 161", "CS 161"] }))
        .await
        .expect("revise");
    assert_eq!(
        outcome,
        Outcome::Rejected(Rejection::Constraint(Violation::DuplicateCourse))
    );
    let plan = fx.service.queries().get(plan_id).await.expect("get");
    assert_eq!(plan.courses.len(), CORE.len());
}

#[tokio::test]
async fn patch_without_plan_id_is_an_input_rejection() {
    let fx = fixture().await;
    let outcome = fx
        .service
        .revise(&json!({ "planName": "Revised Track" }))
        .await
        .expect("revise");
    assert_eq!(outcome.rejection().map(Rejection::code), Some("invalid_input"));
}

#[tokio::test]
async fn unknown_plans_are_not_found() {
    let fx = fixture().await;
    assert_eq!(
        fx.service
            .revise(&json!({ "planId": 404, "planName": "Revised Track" }))
            .await
            .expect("revise"),
        Outcome::Rejected(Rejection::NotFound(404))
    );
    assert_eq!(
        fx.service.remove(404).await.expect("remove"),
        Outcome::Rejected(Rejection::NotFound(404))
    );
    assert_eq!(
        fx.service.plan(404).await.expect("plan"),
        Outcome::Rejected(Rejection::NotFound(404))
    );
    assert_eq!(
        fx.service.activity(404).await.expect("activity"),
        Outcome::Rejected(Rejection::NotFound(404))
    );
    assert_eq!(
        fx.service.history(404).await.expect("history"),
        Outcome::Rejected(Rejection::NotFound(404))
    );
}

#[tokio::test]
async fn removing_a_plan_hides_it_from_reads() {
    let fx = fixture().await;
    let plan_id = submit_core(&fx).await;
    assert_eq!(
        fx.service.remove(plan_id).await.expect("remove"),
        Outcome::Accepted(1)
    );
    assert_eq!(
        fx.service.plan(plan_id).await.expect("plan"),
        Outcome::Rejected(Rejection::NotFound(plan_id))
    );
}
