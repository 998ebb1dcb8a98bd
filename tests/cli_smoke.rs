use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn tabboard_help_works() {
    Command::cargo_bin("tabboard")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("new-tab dashboard"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = ["add", "toggle", "done", "rm", "edit", "ls", "stats", "clear"];

    for cmd in subcommands {
        Command::cargo_bin("tabboard")
            .expect("binary")
            .args(["todo", cmd, "--help"])
            .assert()
            .success();
    }
}

#[test]
fn missing_subcommand_is_usage_error() {
    Command::cargo_bin("tabboard")
        .expect("binary")
        .arg("todo")
        .assert()
        .failure()
        .code(2);
}
