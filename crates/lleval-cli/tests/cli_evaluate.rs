//! `lleval evaluate` / `lleval compare` against a wiremock judge.

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_file(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../config")
        .join(name)
}

/// DSTC11 split with two target samples and predictions for two systems.
fn workspace() -> TempDir {
    let dir = tempdir().unwrap();
    let split = dir.path().join("data").join("val");
    fs::create_dir_all(&split).unwrap();
    let knowledge = json!({
        "hotel": {"3": {"name": "Acorn", "faqs": {"0": {"question": "Wifi?", "answer": "Free wifi."}}}}
    });
    let refs = json!([{"domain": "hotel", "entity_id": 3, "doc_type": "faq", "doc_id": 0}]);
    let labels = json!([
        {"target": true, "response": "Wifi is free.", "knowledge": refs},
        {"target": true, "response": "Yes, free wifi.", "knowledge": refs}
    ]);
    let logs = json!([
        [{"speaker": "U", "text": "Is there wifi?"}],
        [{"speaker": "U", "text": "Do they charge for wifi?"}]
    ]);
    fs::write(split.join("knowledge.json"), knowledge.to_string()).unwrap();
    fs::write(split.join("labels.json"), labels.to_string()).unwrap();
    fs::write(split.join("logs.json"), logs.to_string()).unwrap();

    let preds = |text: &str| {
        json!([
            {"target": true, "response": format!("{} one", text)},
            {"target": true, "response": format!("{} two", text)}
        ])
        .to_string()
    };
    fs::write(dir.path().join("sys_a.json"), preds("A")).unwrap();
    fs::write(dir.path().join("sys_b.json"), preds("B")).unwrap();
    dir
}

async fn judge_answering(text: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"generated_text": text})))
        .mount(&server)
        .await;
    server
}

/// Judge command with no retry count given on the command line.
fn base_command(dir: &Path, server: &MockServer, subcommand: &str) -> Command {
    let mut cmd = Command::cargo_bin("lleval").unwrap();
    cmd.env("RUST_LOG", "warn")
        .env_remove("LLEVAL_JUDGE_URL")
        .env_remove("LLEVAL_JUDGE_RETRIES")
        .env_remove("LLEVAL_SEED")
        .arg(subcommand)
        .arg("--data-path")
        .arg(dir.join("data"))
        .arg("--judge-url")
        .arg(format!("{}/generate", server.uri()))
        .arg("--prompts")
        .arg(config_file("prompts.json"))
        .arg("--dimensions")
        .arg(config_file("dimensions.json"))
        .args(["--seed", "11", "--quiet"]);
    cmd
}

fn judged_command(dir: &Path, server: &MockServer, subcommand: &str) -> Command {
    let mut cmd = base_command(dir, server, subcommand);
    cmd.args(["--num-retries", "2"]);
    cmd
}

/// Runs the binary off the runtime threads so the mock server keeps serving.
async fn run_blocking(mut cmd: Command) -> assert_cmd::assert::Assert {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
        .assert()
}

#[tokio::test(flavor = "multi_thread")]
async fn evaluate_prints_table_and_saves_metrics() {
    let dir = workspace();
    let server = judge_answering("Consistent with the FAQ.\nAccuracy Score: 5").await;

    let mut cmd = judged_command(dir.path(), &server, "evaluate");
    cmd.arg("--predictions")
        .arg(dir.path().join("sys_a.json"))
        .args(["--dims", "accuracy", "--overall"]);
    run_blocking(cmd)
        .await
        .success()
        .stdout(predicate::str::contains("5.000000"));

    let avg: Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("sys_a_likert_avg_metrics.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(avg["method"], "likert");
    assert_eq!(avg["samples"], 2);
    assert_eq!(avg["dimensions"]["accuracy"]["value"], 5.0);
    assert!(dir.path().join("sys_a_likert_acc_app_metrics.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn evaluate_exits_one_when_nothing_parses() {
    let dir = workspace();
    let server = judge_answering("I would rather not say.").await;

    let mut cmd = judged_command(dir.path(), &server, "evaluate");
    cmd.arg("--predictions").arg(dir.path().join("sys_a.json"));
    run_blocking(cmd).await.code(1);

    // Two samples, two dimensions, two attempts each.
    assert_eq!(server.received_requests().await.unwrap().len(), 8);
}

#[tokio::test(flavor = "multi_thread")]
async fn retries_come_from_env_unless_flag_given() {
    let dir = workspace();
    let server = judge_answering("I would rather not say.").await;

    let mut cmd = base_command(dir.path(), &server, "evaluate");
    cmd.env("LLEVAL_JUDGE_RETRIES", "4")
        .arg("--predictions")
        .arg(dir.path().join("sys_a.json"))
        .args(["--dims", "accuracy"]);
    run_blocking(cmd).await.code(1);
    // Two samples, four attempts each.
    assert_eq!(server.received_requests().await.unwrap().len(), 8);

    let server = judge_answering("I would rather not say.").await;
    let mut cmd = base_command(dir.path(), &server, "evaluate");
    cmd.env("LLEVAL_JUDGE_RETRIES", "5")
        .args(["--num-retries", "1"])
        .arg("--predictions")
        .arg(dir.path().join("sys_a.json"))
        .args(["--dims", "accuracy"]);
    run_blocking(cmd).await.code(1);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn evaluate_rejects_unknown_dimension() {
    let dir = workspace();
    let server = judge_answering("x").await;

    let mut cmd = judged_command(dir.path(), &server, "evaluate");
    cmd.arg("--predictions")
        .arg(dir.path().join("sys_a.json"))
        .args(["--dims", "fluency"]);
    run_blocking(cmd)
        .await
        .code(2)
        .stderr(predicate::str::contains("unknown dimension 'fluency'"));
}

#[tokio::test(flavor = "multi_thread")]
async fn compare_saves_win_rates() {
    let dir = workspace();
    let server = judge_answering("Both fine, first is closer.\nMore appropriate response: 1").await;

    let mut cmd = judged_command(dir.path(), &server, "compare");
    cmd.arg("--predictions")
        .arg(dir.path().join("sys_a.json"))
        .arg("--against")
        .arg(dir.path().join("sys_b.json"))
        .args(["--dims", "appropriateness"]);
    run_blocking(cmd)
        .await
        .success()
        .stdout(predicate::str::contains("Win rate of"));

    let records: Vec<Value> = serde_json::from_str(
        &fs::read_to_string(dir.path().join("sys_a_winrate_acc_app_metrics.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(records.len(), 2);
    for r in &records {
        let score = r["scores"]["appropriateness"].as_f64().unwrap();
        assert!(score == 1.0 || score == 2.0);
    }
}
