//! CLI contract tests that need no judge endpoint.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn lleval() -> Command {
    let mut cmd = Command::cargo_bin("lleval").unwrap();
    cmd.env_remove("LLEVAL_DATA_PATH").env("RUST_LOG", "warn");
    cmd
}

fn write_split(root: &Path) {
    let split = root.join("val");
    fs::create_dir_all(&split).unwrap();
    let knowledge = json!({
        "restaurant": {
            "7": {
                "name": "Pizza Hut",
                "faqs": {"0": {"question": "Do they deliver?", "answer": "Yes, within 5 miles."}},
                "reviews": {"1": {"sentences": {"0": "Great crust.", "1": "Slow service."}}}
            }
        }
    });
    let labels = json!([
        {"target": true, "response": "They deliver within 5 miles.", "knowledge": [
            {"domain": "restaurant", "entity_id": 7, "doc_type": "faq", "doc_id": 0}
        ]},
        {"target": false},
        {"target": true, "response": "Reviewers like the crust.", "knowledge": [
            {"domain": "restaurant", "entity_id": 7, "doc_type": "review", "doc_id": 1, "sent_id": 1},
            {"domain": "restaurant", "entity_id": 7, "doc_type": "review", "doc_id": 1, "sent_id": 0}
        ]}
    ]);
    let logs = json!([
        [{"speaker": "U", "text": "Does Pizza Hut deliver?"}],
        [{"speaker": "U", "text": "Bye."}],
        [{"speaker": "U", "text": "Is the food good?"}]
    ]);
    fs::write(split.join("knowledge.json"), knowledge.to_string()).unwrap();
    fs::write(split.join("labels.json"), labels.to_string()).unwrap();
    fs::write(split.join("logs.json"), logs.to_string()).unwrap();
}

#[test]
fn version_prints_package_version() {
    lleval()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn collect_writes_target_contexts() {
    let dir = tempdir().unwrap();
    write_split(dir.path());
    let out = dir.path().join("contexts.json");

    lleval()
        .args(["collect", "--split", "val", "--output"])
        .arg(&out)
        .arg("--data-path")
        .arg(dir.path())
        .assert()
        .success();

    let contexts: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let contexts = contexts.as_array().unwrap();
    assert_eq!(contexts.len(), 2);
    assert_eq!(contexts[0]["index"], 0);
    assert_eq!(
        contexts[0]["knowledge"][0],
        ":F: (Pizza Hut) Do they deliver? Yes, within 5 miles."
    );
    assert_eq!(contexts[1]["index"], 2);
    assert_eq!(
        contexts[1]["knowledge"][0],
        ":R: (Pizza Hut) Great crust. Slow service."
    );
}

#[test]
fn collect_with_num_samples_is_seeded() {
    let dir = tempdir().unwrap();
    write_split(dir.path());
    let run = |name: &str| {
        let out = dir.path().join(name);
        lleval()
            .args(["collect", "--num-samples", "1", "--seed", "3", "--output"])
            .arg(&out)
            .arg("--data-path")
            .arg(dir.path())
            .assert()
            .success();
        fs::read_to_string(out).unwrap()
    };
    let a = run("a.json");
    assert_eq!(a, run("b.json"));
    let parsed: Value = serde_json::from_str(&a).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 1);
}

#[test]
fn missing_dataset_is_a_config_error() {
    let dir = tempdir().unwrap();
    lleval()
        .args(["collect", "--output", "out.json", "--data-path"])
        .arg(dir.path().join("nope"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("fatal:"));
}

#[test]
fn reformat_reindexes_winrate_records() {
    let dir = tempdir().unwrap();
    let records = dir.path().join("sys_winrate_acc_app_metrics.json");
    fs::write(
        &records,
        json!([
            {"id": 2, "scores": {"accuracy": 1.0}, "explanations": {"accuracy": "x"}},
            {"id": 0, "scores": {"accuracy": -1.0}, "explanations": {"accuracy": "Error in syntax retrieval"}, "failed": ["accuracy"]}
        ])
        .to_string(),
    )
    .unwrap();

    lleval()
        .arg("reformat")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("sys_winrate_acc_app_metrics.json"));

    let out: Value = serde_json::from_str(&fs::read_to_string(&records).unwrap()).unwrap();
    assert_eq!(out, json!([null, null, {"id": 2, "scores": {"accuracy": 1.0}, "explanations": {"accuracy": "x"}}]));
}

#[test]
fn correlate_prints_matrix_per_metric() {
    let dir = tempdir().unwrap();
    let mut human_files = Vec::new();
    for (stem, human, judge) in [("a", 1.0, 2.0), ("b", 3.0, 3.0), ("c", 5.0, 4.0)] {
        let human_path = dir.path().join(format!("{}.human_eval.json", stem));
        fs::write(&human_path, json!([{"accuracy": [human, human]}, null]).to_string()).unwrap();
        fs::write(
            dir.path().join(format!("{}_likert_acc_app_metrics.json", stem)),
            json!([{"id": 0, "scores": {"accuracy": judge}, "explanations": {}}]).to_string(),
        )
        .unwrap();
        human_files.push(human_path);
    }
    let out = dir.path().join("corr.json");

    lleval()
        .arg("correlate")
        .args(&human_files)
        .args(["--metrics", "accuracy", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("accuracy correlations (n=3)"))
        .stdout(predicate::str::contains("kendall tau-b: 1.000000"));

    let saved: Value = serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
    assert_eq!(saved["accuracy"]["n"], 3);
    assert!((saved["accuracy"]["spearman"].as_f64().unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn correlate_rejects_misnamed_human_eval_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ratings.json");
    fs::write(&path, "[]").unwrap();
    lleval()
        .arg("correlate")
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("human_eval.json"));
}
