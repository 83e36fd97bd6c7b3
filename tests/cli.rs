use assert_cmd::Command;

fn webreplay() -> Command {
    Command::cargo_bin("webreplay").unwrap()
}

#[test]
fn test_schema_describes_script_format() {
    let output = webreplay().arg("schema").output().unwrap();
    assert!(output.status.success());
    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let text = schema.to_string();
    assert!(text.contains("actions"));
    assert!(text.contains("triggersRefresh"));
}

#[test]
fn test_missing_script_fails() {
    let output = webreplay()
        .args(["run", "/nonexistent/script.json", "--quiet"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot read"), "{stderr}");
}

#[test]
fn test_empty_script_fails() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("empty.json");
    std::fs::write(&script, r#"{"actions": []}"#).unwrap();

    let output = webreplay().arg("run").arg(&script).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no actions"));
}

#[test]
fn test_failing_step_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("hover.json");
    std::fs::write(&script, r#"[{"type": "hover"}]"#).unwrap();

    let output = webreplay().arg("run").arg(&script).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unsupported action 'hover'"));
}

#[test]
fn test_bad_set_argument_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("wait.json");
    std::fs::write(&script, r#"[{"type": "wait", "value": "0.01"}]"#).unwrap();

    webreplay()
        .arg("run")
        .arg(&script)
        .args(["--set", "novalue"])
        .assert()
        .failure();
}

#[test]
fn test_wait_only_script_succeeds_with_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("wait.json");
    std::fs::write(&script, r#"[{"type": "wait", "value": "0.01"}]"#).unwrap();

    webreplay()
        .arg("run")
        .arg(&script)
        .assert()
        .success()
        .stdout("");
}
