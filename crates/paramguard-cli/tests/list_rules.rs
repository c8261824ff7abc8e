use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

fn default_rules() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../rules.yaml")
        .canonicalize()
        .expect("default rule pack should exist")
}

#[test]
fn lists_rules_from_the_default_pack() {
    Command::cargo_bin("paramguard")
        .unwrap()
        .args(["--rules", default_rules().to_str().unwrap(), "list-rules"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rule(s) loaded"))
        .stdout(predicate::str::contains("SECRETS_001"))
        .stdout(predicate::str::contains("CRITICAL"));
}

#[test]
fn json_listing_is_machine_readable() {
    let output = Command::cargo_bin("paramguard")
        .unwrap()
        .args([
            "--rules",
            default_rules().to_str().unwrap(),
            "list-rules",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rules: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rules = rules.as_array().unwrap();
    assert!(!rules.is_empty());
    assert!(rules
        .iter()
        .any(|rule| rule["check"]["type"] == "pattern_match"));
}

#[test]
fn unreadable_rule_pack_is_a_load_error() {
    Command::cargo_bin("paramguard")
        .unwrap()
        .args(["--rules", "definitely-not-here.yaml", "list-rules"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load rules"));
}
