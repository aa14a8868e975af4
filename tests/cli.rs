use assert_cmd::prelude::*;
use predicates::str::contains;
use std::process::Command;

#[test]
fn headless_cycle_prints_each_beat() {
    let mut cmd = Command::cargo_bin("chest-reveal").expect("binary exists");
    cmd.arg("--headless").arg("--frames").arg("150");
    cmd.assert()
        .success()
        .stdout(contains("Mounted chest with 22 parts"))
        .stdout(contains("Activated: phase=Opening"))
        .stdout(contains("After open: phase=Open"))
        .stdout(contains("particles=40"))
        .stdout(contains("After close: phase=Closed"))
        .stdout(contains("revealed=false attached=true"))
        .stdout(contains("Unmounted: phase=Closed"))
        .stdout(contains("attached=false"))
        .stdout(contains("Gallery commands: starts=1 stops=1"));
}

#[test]
fn unknown_arguments_are_rejected() {
    let mut cmd = Command::cargo_bin("chest-reveal").expect("binary exists");
    cmd.arg("--bogus");
    cmd.assert().failure().stderr(contains("Unknown argument"));
}
