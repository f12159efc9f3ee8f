use assert_cmd::Command;

#[test]
fn help_lists_subcommands() {
    let output = Command::cargo_bin("mtype").unwrap().arg("--help").output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    for cmd in ["test", "history", "stats", "show"] {
        assert!(text.contains(cmd), "missing {cmd} in help");
    }
}

#[test]
fn invalid_mode_is_a_usage_error() {
    Command::cargo_bin("mtype")
        .unwrap()
        .args(["test", "--mode", "marathon"])
        .assert()
        .failure();
}

#[test]
fn zero_words_fail_before_touching_the_terminal() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::cargo_bin("mtype")
        .unwrap()
        .arg("--config")
        .arg(dir.path().join("config.json"))
        .args(["test", "--words", "0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("word count must be positive"), "{stderr}");
}

#[test]
fn unknown_quote_id_is_reported_by_message() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::cargo_bin("mtype")
        .unwrap()
        .arg("--config")
        .arg(dir.path().join("config.json"))
        .args(["test", "--quote-id", "no-such-quote"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("quote with id \"no-such-quote\" not found"), "{stderr}");
}
