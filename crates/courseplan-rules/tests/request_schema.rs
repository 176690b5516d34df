use jsonschema::JSONSchema;
use serde_json::{json, Value};

use courseplan_rules::{plan_patch_json_schema, plan_submission_json_schema};

fn compile(schema: impl serde::Serialize) -> JSONSchema {
    let schema: Value = serde_json::to_value(schema).expect("schema to json");
    JSONSchema::compile(&schema).expect("emitted schema compiles")
}

#[test]
fn submission_schema_requires_identity_and_name() {
    let schema = compile(plan_submission_json_schema());

    assert!(schema.is_valid(&json!({
        "studentId": "12",
        "planName": "Systems Track",
        "courses": ["CS 161", "CS 162"]
    })));
    assert!(schema.is_valid(&json!({ "studentId": "12", "planName": "Systems Track" })));
    assert!(!schema.is_valid(&json!({ "studentId": "12", "courses": ["CS 161"] })));
    assert!(!schema.is_valid(&json!({
        "studentId": "12",
        "planName": "Systems Track",
        "courses": "CS 161"
    })));
}

#[test]
fn patch_schema_requires_only_plan_id() {
    let schema = compile(plan_patch_json_schema());

    assert!(schema.is_valid(&json!({ "planId": 5 })));
    assert!(schema.is_valid(&json!({ "planId": 5, "planName": "Compilers Track" })));
    assert!(schema.is_valid(&json!({ "planId": 5, "courses": ["CS 480"] })));
    assert!(!schema.is_valid(&json!({ "planName": "Compilers Track" })));
    assert!(!schema.is_valid(&json!({ "planId": "five" })));
}
