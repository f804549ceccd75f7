use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn oneliner(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("oneliner").unwrap();
    cmd.env("ONELINER_HOME", home)
        .env_remove("GEMINI_API_KEY")
        .env_remove("GEMINI_BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn home() -> TempDir {
    tempdir().unwrap()
}

#[test]
fn help_lists_flags() {
    let home = home();
    oneliner(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--execute"))
        .stdout(predicate::str::contains("--set-default-output"));
}

#[test]
fn missing_query_prints_usage_and_fails() {
    let home = home();
    oneliner(home.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage: oneliner"));
}

#[test]
fn show_config_path_points_into_home() {
    let home = home();
    oneliner(home.path())
        .arg("--show-config-path")
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"))
        .stdout(predicate::str::contains(
            home.path().to_string_lossy().to_string(),
        ));
}

#[test]
fn set_default_output_persists_style() {
    let home = home();
    oneliner(home.path())
        .args(["--set-default-output", "inline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("plain"));

    let saved = fs::read_to_string(home.path().join("config.toml")).unwrap();
    assert!(saved.contains("default_style = \"plain\""), "{saved}");
}

#[test]
fn set_default_output_rejects_unknown_style() {
    let home = home();
    oneliner(home.path())
        .args(["--set-default-output", "fancy"])
        .assert()
        .failure();
    assert!(!home.path().join("config.toml").exists());
}

#[test]
fn set_default_output_keeps_other_keys() {
    let home = home();
    fs::write(
        home.path().join("config.toml"),
        "[credentials]\napi_key = \"keep-me\"\n",
    )
    .unwrap();

    oneliner(home.path())
        .args(["--set-default-output", "tui"])
        .assert()
        .success();

    let saved = fs::read_to_string(home.path().join("config.toml")).unwrap();
    assert!(saved.contains("keep-me"));
    assert!(saved.contains("interactive"));
}

#[test]
fn set_default_output_leaves_malformed_config_untouched() {
    let home = home();
    let config = home.path().join("config.toml");
    fs::write(&config, "this is = = not toml").unwrap();

    oneliner(home.path())
        .args(["--set-default-output", "inline"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Refusing to overwrite"));
    assert_eq!(fs::read_to_string(&config).unwrap(), "this is = = not toml");
}

#[test]
fn clear_config_with_yes_removes_file() {
    let home = home();
    let config = home.path().join("config.toml");
    fs::write(&config, "[output]\ndefault_style = \"plain\"\n").unwrap();

    oneliner(home.path())
        .args(["--clear-config", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed"));
    assert!(!config.exists());
}

#[test]
fn clear_config_without_terminal_needs_yes() {
    let home = home();
    let config = home.path().join("config.toml");
    fs::write(&config, "[output]\ndefault_style = \"plain\"\n").unwrap();

    oneliner(home.path())
        .arg("--clear-config")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--yes"));
    assert!(config.exists());
}

#[test]
fn print_default_config_is_commented_toml() {
    let home = home();
    oneliner(home.path())
        .arg("--print-default-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[model]"))
        .stdout(predicate::str::contains("gemini-2.0-flash"));
}

#[test]
fn history_listing_and_clearing() {
    let home = home();
    oneliner(home.path())
        .arg("--history")
        .assert()
        .success()
        .stdout(predicate::str::contains("History is empty"));

    fs::write(
        home.path().join("history.json"),
        r#"[{"query": "disk usage", "command": "df -h"}]"#,
    )
    .unwrap();

    oneliner(home.path())
        .arg("--history")
        .assert()
        .success()
        .stdout(predicate::str::contains("disk usage"))
        .stdout(predicate::str::contains("df -h"));

    oneliner(home.path())
        .arg("--clear-history")
        .assert()
        .success();

    oneliner(home.path())
        .arg("--history")
        .assert()
        .success()
        .stdout(predicate::str::contains("History is empty"));
}

#[test]
fn corrupt_history_is_reported() {
    let home = home();
    fs::write(home.path().join("history.json"), "{ not json").unwrap();

    oneliner(home.path())
        .arg("--history")
        .assert()
        .success()
        .stdout(predicate::str::contains("History is empty"))
        .stderr(predicate::str::contains("corrupt"));
}

#[test]
fn missing_key_without_terminal_fails() {
    let home = home();
    oneliner(home.path())
        .arg("list files")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No Gemini API key found"))
        .stderr(predicate::str::contains("cancelled"));
}

#[test]
fn malformed_config_warns_and_continues() {
    let home = home();
    fs::write(home.path().join("config.toml"), "this is = = not toml").unwrap();

    oneliner(home.path())
        .arg("--show-config-path")
        .assert()
        .success()
        .stderr(predicate::str::contains("malformed"));
}

#[cfg(unix)]
mod with_backend {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn backend_replying(text: &str) -> MockServer {
        let server = MockServer::start().await;
        let reply = serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        });
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply))
            .mount(&server)
            .await;
        server
    }

    fn configured(home: &Path, server: &MockServer) -> Command {
        let mut cmd = oneliner(home);
        cmd.env("GEMINI_API_KEY", "test-key")
            .env("GEMINI_BASE_URL", format!("{}/v1beta", server.uri()))
            .env("SHELL", "/bin/sh");
        cmd
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn prints_command_without_terminal() {
        let home = home();
        let server =
            backend_replying(r#"{"command": "ls -la", "explanation": "Lists files"}"#).await;

        configured(home.path(), &server)
            .arg("list all files")
            .assert()
            .success()
            .stdout("ls -la\n")
            .stderr(predicate::str::contains("Lists files"));

        // Nothing was executed, so nothing is remembered.
        assert!(!home.path().join("history.json").exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn execute_flag_runs_and_records() {
        let home = home();
        let server = backend_replying("```bash\necho hello-from-shell\n```").await;

        configured(home.path(), &server)
            .args(["--execute", "say", "hello"])
            .assert()
            .success()
            .stdout(predicate::str::contains("hello-from-shell"));

        let history = fs::read_to_string(home.path().join("history.json")).unwrap();
        let entries: serde_json::Value = serde_json::from_str(&history).unwrap();
        assert_eq!(entries[0]["query"], "say hello");
        assert_eq!(entries[0]["command"], "echo hello-from-shell");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failing_child_does_not_fail_the_tool() {
        let home = home();
        let server = backend_replying(r#"{"command": "exit 3"}"#).await;

        configured(home.path(), &server)
            .args(["-e", "fail on purpose"])
            .assert()
            .success()
            .stderr(predicate::str::contains("exited with code: 3"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn backend_rejection_is_fatal() {
        let home = home();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "API key not valid.", "status": "INVALID_ARGUMENT"}
            })))
            .mount(&server)
            .await;

        configured(home.path(), &server)
            .arg("anything")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("authentication failed"))
            .stderr(predicate::str::contains("API key not valid"));
    }
}
