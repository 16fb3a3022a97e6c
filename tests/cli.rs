use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("audiograb")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("--query"));
}

#[test]
fn version_flag() {
    Command::cargo_bin("audiograb")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("audiograb"));
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("audiograb")
        .unwrap()
        .arg("transcribe")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}
