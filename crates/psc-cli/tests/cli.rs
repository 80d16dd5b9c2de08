use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

const NETWORK_JSON: &str = r#"{
  "name": "demo",
  "snapshots": ["0", "1", "2"],
  "buses": [
    {"name": "town", "attributes": {"v_nom": 1.0}}
  ],
  "loads": [
    {"name": "houses", "attributes": {"bus": "town", "p_set": [10.0, 20.0, 30.0]}}
  ],
  "generators": [
    {"name": "plant", "attributes": {"bus": "town", "p_nom": 100.0, "marginal_cost": 50.0}}
  ]
}"#;

#[test]
fn converts_a_network_file() {
    let dir = tempfile::tempdir().unwrap();
    let network = dir.path().join("network.json");
    fs::write(&network, NETWORK_JSON).unwrap();
    let output = dir.path().join("study");

    Command::cargo_bin("psc")
        .unwrap()
        .arg(&network)
        .arg("--output")
        .arg(&output)
        .arg("--format")
        .arg("tsv")
        .assert()
        .success();

    let input = output.join("systems").join("demo").join("input");
    assert!(input.join("system.yml").is_file());
    assert!(input.join("parameters.yml").is_file());
    assert!(input
        .join("data-series")
        .join("demo_load_houses_p_set.tsv")
        .is_file());
}

#[test]
fn rejects_an_unsupported_format_flag() {
    let dir = tempfile::tempdir().unwrap();
    let network = dir.path().join("network.json");
    fs::write(&network, NETWORK_JSON).unwrap();

    Command::cargo_bin("psc")
        .unwrap()
        .arg(&network)
        .arg("--format")
        .arg("parquet")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported series file format"));
}

#[test]
fn fails_cleanly_on_a_missing_network_file() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("psc")
        .unwrap()
        .arg(dir.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.json"));
}
