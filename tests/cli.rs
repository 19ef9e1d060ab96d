#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    Command::cargo_bin("roulement-cli").expect("binary built")
}

#[test]
fn help_lists_subcommands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("template-add"))
        .stdout(predicate::str::contains("swap-request"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn template_add_then_list() {
    let dir = tempfile::tempdir().unwrap();
    let planning = dir.path().join("planning.json");

    cli()
        .args([
            "--planning",
            planning.to_str().unwrap(),
            "template-add",
            "--code",
            "MAT",
            "--name",
            "Matin",
            "--start",
            "06:00",
            "--end",
            "14:00",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("template MAT created"));

    cli()
        .args([
            "--planning",
            planning.to_str().unwrap(),
            "template-list",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("MAT"))
        .stdout(predicate::str::contains("8.0h"));
}

#[test]
fn invalid_template_code_fails() {
    let dir = tempfile::tempdir().unwrap();
    let planning = dir.path().join("planning.json");

    cli()
        .args([
            "--planning",
            planning.to_str().unwrap(),
            "template-add",
            "--code",
            "m1",
            "--name",
            "Minuscule",
            "--start",
            "06:00",
            "--end",
            "14:00",
        ])
        .assert()
        .failure();
}

#[test]
fn check_on_an_empty_planning_reports_ok() {
    let dir = tempfile::tempdir().unwrap();
    let planning = dir.path().join("planning.json");

    cli()
        .args(["--planning", planning.to_str().unwrap(), "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: no conflicts"));
}
