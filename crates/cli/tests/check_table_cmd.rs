//! CLI tests for the `scpi check-table` subcommand.

use std::fs;
use std::process::Command;

use assert_cmd::cargo;

fn scpi_cmd() -> Command {
    Command::new(cargo::cargo_bin!("scpi"))
}

#[test]
fn built_in_table_is_clean() {
    let output = scpi_cmd()
        .args(["check-table", "--output", "json"])
        .output()
        .expect("run check-table");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["ok"], true);
    assert_eq!(json["commands"], 19);
    assert!(json["diagnostics"].as_array().is_some_and(Vec::is_empty));
}

#[test]
fn broken_table_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tables.json");
    fs::write(
        &path,
        r#"{
            "formatVersion": "1.0.0",
            "commands": [
                { "keywords": "SYSTem[:BEEPer" },
                { "keywords": "SYSTem:BEEPer", "params": [
                    { "type": "numeric", "optional": true },
                    { "type": "numeric" }
                ] }
            ]
        }"#,
    )
    .expect("write tables");

    let output = scpi_cmd()
        .args(["check-table", "--tables"])
        .arg(&path)
        .args(["--output", "json"])
        .output()
        .expect("run check-table");

    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["ok"], false);
    let ids: Vec<_> = json["diagnostics"]
        .as_array()
        .expect("diagnostics")
        .iter()
        .map(|d| (d["id"].clone(), d["severity"].clone()))
        .collect();
    assert_eq!(
        ids,
        [
            (serde_json::json!("SCPI902"), serde_json::json!("error")),
            (serde_json::json!("SCPI905"), serde_json::json!("warn")),
        ]
    );
    assert_eq!(json["diagnostics"][0]["context"]["command"], "0");
}

#[test]
fn warnings_alone_do_not_fail() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tables.json");
    fs::write(&path, r#"{"formatVersion": "0.9.0", "commands": []}"#).expect("write tables");

    let output = scpi_cmd()
        .args(["check-table", "--tables"])
        .arg(&path)
        .args(["--output", "pretty"])
        .output()
        .expect("run check-table");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SCPI900"), "unexpected stderr: {stderr}");
    assert!(stderr.contains("1 warning"), "unexpected stderr: {stderr}");
}
