// ABOUTME: Integration tests for credential resolution order.
// ABOUTME: Env var first, then a CLI refresh, then the first config file holding a token.

mod support;

use std::path::PathBuf;
use std::sync::Arc;

use hoist::credentials::{
    API_TOKEN_ENV, CliRefresh, ConfigFileToken, CredentialChain, CredentialError, EnvToken,
};
use hoist::process::CommandRunner;
use nonempty::NonEmpty;
use support::fake_runner::FakeRunner;

struct Fixture {
    dir: tempfile::TempDir,
    runner: Arc<FakeRunner>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            runner: Arc::new(FakeRunner::new()),
        }
    }

    fn config_file(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn chain(&self, paths: Vec<PathBuf>) -> CredentialChain {
        let runner: Arc<dyn CommandRunner> = self.runner.clone();
        let cli = NonEmpty::from_vec(vec!["bunx".to_string(), "wrangler".to_string()]).unwrap();
        CredentialChain::new(vec![
            Box::new(EnvToken::new(API_TOKEN_ENV)),
            Box::new(CliRefresh::new(runner, cli, self.dir.path())),
            Box::new(ConfigFileToken::new(paths)),
        ])
    }
}

#[tokio::test]
async fn environment_token_short_circuits_the_chain() {
    let fx = Fixture::new();
    let file = fx.config_file("default.toml", "oauth_token = \"from-file\"\n");
    let chain = fx.chain(vec![file]);

    let token = temp_env::async_with_vars([(API_TOKEN_ENV, Some("from-env"))], chain.resolve())
        .await
        .unwrap();

    assert_eq!(token.expose(), "from-env");
    assert!(fx.runner.calls().is_empty(), "refresh must not run");
}

#[tokio::test]
async fn falls_back_to_first_config_file_with_a_token() {
    let fx = Fixture::new();
    let missing = fx.dir.path().join("missing.toml");
    let empty = fx.config_file("empty.toml", "[env]\nname = \"x\"\n");
    let first = fx.config_file("first.toml", "oauth_token = \"first-token\"\n");
    let second = fx.config_file("second.toml", "api_token = \"second-token\"\n");
    let chain = fx.chain(vec![missing, empty, first, second]);

    let token = temp_env::async_with_vars([(API_TOKEN_ENV, None::<&str>)], chain.resolve())
        .await
        .unwrap();

    assert_eq!(token.expose(), "first-token");

    let calls = fx.runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].line(), "bunx wrangler whoami");
}

#[tokio::test]
async fn failing_refresh_is_ignored() {
    let fx = Fixture {
        dir: tempfile::tempdir().unwrap(),
        runner: Arc::new(FakeRunner::new().fail_on("whoami", 1, "not logged in")),
    };
    let file = fx.config_file("default.toml", "oauth_token = \"cached\"\n");
    let chain = fx.chain(vec![file]);

    let token = temp_env::async_with_vars([(API_TOKEN_ENV, None::<&str>)], chain.resolve())
        .await
        .unwrap();
    assert_eq!(token.expose(), "cached");
}

#[tokio::test]
async fn nothing_found_lists_every_source() {
    let fx = Fixture::new();
    let chain = fx.chain(vec![fx.dir.path().join("nope.toml")]);

    let err = temp_env::async_with_vars([(API_TOKEN_ENV, None::<&str>)], chain.resolve())
        .await
        .unwrap_err();

    let CredentialError::NotFound { tried } = err;
    assert_eq!(tried.len(), 3);
    assert!(tried[0].contains(API_TOKEN_ENV));
}
