//! Smoke tests for the `lff` binary
//!
//! Drives the compiled CLI against temporary files: exit codes, JSON
//! output shape, and directory-recursive checking.

use std::fs;
use std::process::Command;

use tempfile::tempdir;

fn lff_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lff"))
}

#[test]
fn check_passes_on_valid_file() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("system.lff");
    fs::write(&file, "Frontend [web] -> Backend [api]\n").unwrap();

    let output = lff_bin().arg("check").arg(&file).output().unwrap();
    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ok"));
}

#[test]
fn check_fails_on_undefined_anchor() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("broken.lff");
    fs::write(&file, "A [svc]\nA -> *ghost\n").unwrap();

    let output = lff_bin().arg("check").arg(&file).output().unwrap();
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("UNDEFINED_ANCHOR_REFERENCE"));
}

#[test]
fn check_walks_directories() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("services");
    fs::create_dir(&nested).unwrap();
    fs::write(dir.path().join("a.lff"), "A [svc]\n").unwrap();
    fs::write(nested.join("b.lff"), "B [svc]\n").unwrap();
    fs::write(nested.join("ignored.txt"), "not lff").unwrap();

    let output = lff_bin().arg("check").arg(dir.path()).output().unwrap();
    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 file(s) ok"));
}

#[test]
fn tokens_emits_json_stream() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("tokens.lff");
    fs::write(&file, "A -> B\n").unwrap();

    let output = lff_bin().arg("tokens").arg(&file).output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("tokens output is JSON");
    assert!(json["tokens"].is_array());
    assert!(json["source_info"]["line_count"].is_number());
}

#[test]
fn graph_emits_graph_json() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("graph.lff");
    fs::write(&file, "@title: T\nA [svc] -> B [svc]\n").unwrap();

    let output = lff_bin().arg("graph").arg(&file).output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(json["edges"].as_array().unwrap().len(), 1);
    assert_eq!(json["metadata"]["title"], "T");
}

#[test]
fn fmt_rewrites_in_place() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("fmt.lff");
    fs::write(&file, "A [svc]->B [svc]\n").unwrap();

    let output = lff_bin()
        .args(["fmt", "--preset", "pretty", "--write"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);

    let formatted = fs::read_to_string(&file).unwrap();
    assert!(formatted.contains("A [svc]"));
    assert!(formatted.contains("-> "));
}
