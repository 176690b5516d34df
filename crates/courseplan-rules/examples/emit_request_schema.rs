use courseplan_rules::{plan_patch_json_schema, plan_submission_json_schema};

fn main() {
    let schemas = serde_json::json!({
        "submission": plan_submission_json_schema(),
        "patch": plan_patch_json_schema(),
    });
    let json = serde_json::to_string_pretty(&schemas).expect("serialize request json schemas");
    println!("{json}");
}
