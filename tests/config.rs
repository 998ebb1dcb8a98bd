mod support;

use std::fs;

use predicates::str::contains;
use tabboard::config::Config;
use tabboard::todo::TodoFilter;

#[test]
fn load_rejects_unknown_filter() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tabboard.toml");
    fs::write(&path, "[todos]\ndefault_filter = \"someday\"\n").expect("write config");

    assert!(Config::load(&path).is_err());
}

#[test]
fn load_reads_storage_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tabboard.toml");
    let store = dir.path().join("board.json");
    let content = format!(
        "[storage]\npath = {:?}\n\n[todos]\ndefault_filter = \"completed\"\n",
        store.display().to_string()
    );
    fs::write(&path, content).expect("write config");

    let cfg = Config::load(&path).expect("load");
    assert_eq!(cfg.store_path().expect("store path"), store);
    assert_eq!(cfg.todos.default_filter, TodoFilter::Completed);
    assert_eq!(cfg.todos.clear_after_days, 7);
}

#[test]
fn cli_uses_configured_store_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("tabboard.toml");
    let store = dir.path().join("nested").join("board.json");
    fs::write(
        &config,
        format!("[storage]\npath = {:?}\n", store.display().to_string()),
    )
    .expect("write config");

    support::tabboard_cmd()
        .env_remove("TABBOARD_STORE")
        .env("TABBOARD_CONFIG", &config)
        .env("TABBOARD_NOW", "2025-06-01T08:00:00+00:00")
        .args(["todo", "add", "Buy milk"])
        .assert()
        .success()
        .stdout(contains("Todo added"));

    let contents = fs::read_to_string(&store).expect("store written");
    assert!(contents.contains("Buy milk"));
}

#[test]
fn cli_defaults_when_config_file_is_absent() {
    let dir = tempfile::tempdir().expect("tempdir");
    support::tabboard_cmd()
        .env("TABBOARD_CONFIG", dir.path().join("absent.toml"))
        .env("TABBOARD_STORE", dir.path().join("storage.json"))
        .env("TABBOARD_NOW", "2025-06-01T08:00:00+00:00")
        .args(["todo", "ls"])
        .assert()
        .success()
        .stdout(contains("Todos (today): 0"));
}

#[test]
fn cli_rejects_invalid_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("tabboard.toml");
    fs::write(&config, "[todos]\nclear_after_days = 0\n").expect("write config");

    support::tabboard_cmd()
        .env("TABBOARD_CONFIG", &config)
        .env("TABBOARD_STORE", dir.path().join("storage.json"))
        .args(["todo", "ls"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("hint: fix tabboard.toml"));
}
