// ABOUTME: Integration tests for the hoist CLI commands.
// ABOUTME: Validates --help output, init, and status behavior.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn hoist_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("hoist"))
}

#[test]
fn help_shows_commands() {
    hoist_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("zones"));
}

mod init {
    use super::*;

    #[test]
    fn writes_domain_and_config_template() {
        let temp_dir = tempfile::tempdir().unwrap();

        hoist_cmd()
            .current_dir(temp_dir.path())
            .args(["init", "--domain", "Example.com", "--subdomain", "app", "--app", "demo"])
            .assert()
            .success()
            .stdout(predicate::str::contains("app.example.com"));

        let env = fs::read_to_string(temp_dir.path().join(".env")).unwrap();
        assert_eq!(env, "CUSTOM_DOMAIN=app.example.com\n");

        let config = fs::read_to_string(temp_dir.path().join("hoist.yml")).unwrap();
        assert!(config.contains("app: demo"));
    }

    #[test]
    fn refuses_existing_env_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join(".env"), "CUSTOM_DOMAIN=old.example.com\n").unwrap();

        hoist_cmd()
            .current_dir(temp_dir.path())
            .args(["init", "--zone", "example.com", "--app", "demo"])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("already exists"));

        let env = fs::read_to_string(temp_dir.path().join(".env")).unwrap();
        assert!(env.contains("old.example.com"));
        assert!(!temp_dir.path().join("hoist.yml").exists());
    }

    #[test]
    fn force_overwrites_env_and_keeps_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join(".env"), "CUSTOM_DOMAIN=old.example.com\n").unwrap();
        fs::write(temp_dir.path().join("hoist.yml"), "app: existing\n").unwrap();

        hoist_cmd()
            .current_dir(temp_dir.path())
            .args(["init", "--zone", "example.com", "--force", "--app", "demo"])
            .assert()
            .success();

        let env = fs::read_to_string(temp_dir.path().join(".env")).unwrap();
        assert_eq!(env, "CUSTOM_DOMAIN=example.com\n");
        let config = fs::read_to_string(temp_dir.path().join("hoist.yml")).unwrap();
        assert_eq!(config, "app: existing\n");
    }

    #[test]
    fn rejects_url_as_zone() {
        let temp_dir = tempfile::tempdir().unwrap();

        hoist_cmd()
            .current_dir(temp_dir.path())
            .args(["init", "--zone", "https://example.com", "--app", "demo"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid configuration"));

        assert!(!temp_dir.path().join(".env").exists());
    }
}

mod status {
    use super::*;

    #[test]
    fn reports_undeployed_project_without_creating_ledger() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("hoist.yml"), "app: demo\n").unwrap();

        hoist_cmd()
            .current_dir(temp_dir.path())
            .env_remove("CUSTOM_DOMAIN")
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("App:      demo"))
            .stdout(predicate::str::contains("Not deployed yet"));

        assert!(!temp_dir.path().join("infra/.hoist/state.json").exists());
    }

    #[test]
    fn shows_recorded_database() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("hoist.yml"), "app: demo\n").unwrap();
        fs::write(temp_dir.path().join(".env"), "CUSTOM_DOMAIN=app.example.com\n").unwrap();
        let state_dir = temp_dir.path().join("infra/.hoist");
        fs::create_dir_all(&state_dir).unwrap();
        fs::write(
            state_dir.join("state.json"),
            r#"{"databaseId":"db-42","databaseName":"demo-db","authSecretSet":true}"#,
        )
        .unwrap();

        hoist_cmd()
            .current_dir(temp_dir.path())
            .env_remove("CUSTOM_DOMAIN")
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("app.example.com"))
            .stdout(predicate::str::contains("demo-db (db-42)"))
            .stdout(predicate::str::contains("Secret:   set"));
    }
}

#[test]
fn deploy_without_config_fails() {
    let temp_dir = tempfile::tempdir().unwrap();

    hoist_cmd()
        .current_dir(temp_dir.path())
        .arg("deploy")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("configuration file not found"));
}
