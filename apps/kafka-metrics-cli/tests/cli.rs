use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("kafka-metrics").unwrap();
    cmd.env_remove("KAFKA_METRICS_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--no-color");
    cmd
}

fn event_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

const CONNECTION: &str = r#"{"name":"request.connection","client_id":"test","duration_ms":12.5,"payload":{"broker_host":"h","api":"foo","request_size":101,"response_size":4000}}"#;
const UNKNOWN: &str = r#"{"name":"topic_error.async_producer","client_id":"test","payload":{"topic":"AAA"}}"#;
const MISSING_TOPIC: &str = r#"{"name":"buffer_overflow.producer","client_id":"test","payload":{}}"#;

#[test]
fn test_events_lists_recognized_names() {
    cli()
        .arg("events")
        .assert()
        .success()
        .stdout(predicate::str::contains("request.connection"))
        .stdout(predicate::str::contains("loop.fetcher"))
        .stdout(predicate::str::contains("topic_error.async_producer").not());
}

#[test]
fn test_metrics_json() {
    let output = cli().args(["--format", "json", "metrics"]).output().unwrap();
    assert!(output.status.success());

    let defs: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let defs = defs.as_array().unwrap();
    assert_eq!(defs.len(), 38);
    assert_eq!(defs[0]["name"], "api_calls");
    assert_eq!(defs[0]["kind"], "counter");
}

#[test]
fn test_replay_renders_exposition() {
    let file = event_file(&[CONNECTION, "", CONNECTION]);

    cli()
        .arg("replay")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"kafka_api_calls{api="foo",broker="h",client="test"} 2"#,
        ))
        .stdout(predicate::str::contains("kafka_api_latency_count"));
}

#[test]
fn test_replay_json_summary() {
    let file = event_file(&[CONNECTION, UNKNOWN, MISSING_TOPIC, "not json"]);

    let output = cli()
        .args(["--format", "json", "replay"])
        .arg(file.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let summary = &report["summary"];
    assert_eq!(summary["events"], 3);
    assert_eq!(summary["translated"], 1);
    assert_eq!(summary["ignored"], 1);
    assert_eq!(summary["failed"], 1);
    assert_eq!(summary["malformed"], 1);
    assert_eq!(summary["by_event"]["request.connection"], 1);
}

#[test]
fn test_replay_from_stdin() {
    cli()
        .args(["replay", "-"])
        .write_stdin(format!("{}\n", CONNECTION))
        .assert()
        .success()
        .stdout(predicate::str::contains("kafka_api_calls"));
}

#[test]
fn test_replay_strict_fails_on_bad_event() {
    let file = event_file(&[CONNECTION, MISSING_TOPIC]);

    cli()
        .arg("replay")
        .arg("--strict")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_replay_prometheus_backend() {
    let file = event_file(&[CONNECTION]);

    cli()
        .args(["--backend", "prometheus", "replay"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("# TYPE kafka_api_calls counter"));
}

#[test]
fn test_config_file_namespace() {
    let mut config = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(config, "namespace = \"ruby_kafka\"").unwrap();
    let file = event_file(&[CONNECTION]);

    cli()
        .arg("--config")
        .arg(config.path())
        .arg("replay")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("ruby_kafka_api_calls"));
}

#[test]
fn test_missing_input_file() {
    cli()
        .args(["replay", "/nonexistent/events.jsonl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open"));
}

#[test]
fn test_unknown_backend_rejected() {
    cli()
        .args(["--backend", "statsd", "events"])
        .assert()
        .failure();
}

#[test]
fn test_events_yaml() {
    cli()
        .args(["--format", "yaml", "events"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name: request.connection"))
        .stdout(predicate::str::contains("subsystem: connection"));
}

#[test]
fn test_replay_flags_label_defects() {
    let file = event_file(&[MISSING_TOPIC]);

    cli()
        .arg("replay")
        .arg(file.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Event translation failed"))
        .stderr(predicate::str::contains("defect=true"));
}
