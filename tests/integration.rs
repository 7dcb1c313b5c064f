use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn subscope_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("subscope");
    path
}

/// Test config with the Reddit endpoint pointed at a closed local port, so
/// any command that actually reaches for the network fails with an upstream
/// error rather than talking to reddit.com.
fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/subscope.sqlite"

[reddit]
base_url = "http://127.0.0.1:9"
timeout_secs = 1

[server]
bind = "127.0.0.1:7399"
"#,
        root.display()
    );

    let config_path = config_dir.join("subscope.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_subscope(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = subscope_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run subscope binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_subscope(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_subscope(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_subscope(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_add_rejects_invalid_name_before_network() {
    let (_tmp, config_path) = setup_test_env();
    run_subscope(&config_path, &["init"]);

    // Too short and bad characters both fail validation, not upstream.
    for bad in ["ab", "bad name!"] {
        let (stdout, stderr, success) = run_subscope(&config_path, &["add", bad]);
        assert!(!success, "add '{}' unexpectedly succeeded: {}", bad, stdout);
        assert!(
            stderr.contains("invalid input"),
            "expected a validation error for '{}', got: {}",
            bad,
            stderr
        );
    }
}

#[test]
fn test_add_valid_name_reaches_network() {
    let (_tmp, config_path) = setup_test_env();
    run_subscope(&config_path, &["init"]);

    // A valid name passes validation and fails only at the dead endpoint.
    let (_, stderr, success) = run_subscope(&config_path, &["add", "rust"]);
    assert!(!success);
    assert!(
        stderr.contains("reddit request failed"),
        "expected an upstream error, got: {}",
        stderr
    );
}

#[test]
fn test_refresh_bad_limit_fails_fast() {
    let (_tmp, config_path) = setup_test_env();
    run_subscope(&config_path, &["init"]);

    let (_, stderr, success) =
        run_subscope(&config_path, &["refresh", "rust", "--limit", "150"]);
    assert!(!success);
    assert!(
        stderr.contains("invalid input"),
        "expected a validation error, got: {}",
        stderr
    );
}

#[test]
fn test_refresh_bad_sort_fails_fast() {
    let (_tmp, config_path) = setup_test_env();
    run_subscope(&config_path, &["init"]);

    let (_, stderr, success) =
        run_subscope(&config_path, &["refresh", "rust", "--sort", "spiciest"]);
    assert!(!success);
    assert!(stderr.contains("invalid input"), "got: {}", stderr);
}

#[test]
fn test_comments_unknown_post_is_not_found() {
    let (_tmp, config_path) = setup_test_env();
    run_subscope(&config_path, &["init"]);

    let (_, stderr, success) = run_subscope(&config_path, &["comments", "t3_missing"]);
    assert!(!success);
    assert!(
        stderr.contains("not found"),
        "expected not found before any network call, got: {}",
        stderr
    );
}

#[test]
fn test_subreddits_empty() {
    let (_tmp, config_path) = setup_test_env();
    run_subscope(&config_path, &["init"]);

    let (stdout, _, success) = run_subscope(&config_path, &["subreddits"]);
    assert!(success);
    assert!(stdout.contains("No subreddits."));
}

#[test]
fn test_posts_unknown_subreddit_is_not_found() {
    let (_tmp, config_path) = setup_test_env();
    run_subscope(&config_path, &["init"]);

    let (_, stderr, success) = run_subscope(&config_path, &["posts", "nosuch"]);
    assert!(!success);
    assert!(stderr.contains("not found"), "got: {}", stderr);
}

#[test]
fn test_search_empty_store() {
    let (_tmp, config_path) = setup_test_env();
    run_subscope(&config_path, &["init"]);

    let (stdout, _, success) = run_subscope(&config_path, &["search", "anything"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_refresh_all_empty_store() {
    let (_tmp, config_path) = setup_test_env();
    run_subscope(&config_path, &["init"]);

    let (stdout, _, success) = run_subscope(&config_path, &["refresh-all"]);
    assert!(success);
    assert!(stdout.contains("subreddits updated: 0"));
    assert!(stdout.contains("posts found: 0"));
}

#[test]
fn test_ideas_rejects_unknown_platform() {
    let (_tmp, config_path) = setup_test_env();
    run_subscope(&config_path, &["init"]);

    let (_, stderr, success) =
        run_subscope(&config_path, &["ideas", "rust", "--platform", "myspace"]);
    assert!(!success);
    assert!(stderr.contains("invalid input"), "got: {}", stderr);
}

#[test]
fn test_missing_config_is_a_clear_error() {
    let (_tmp, config_path) = setup_test_env();
    let bogus = config_path.with_file_name("absent.toml");

    let binary = subscope_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(bogus.to_str().unwrap())
        .arg("subreddits")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read config file"), "got: {}", stderr);
}
