//! End-to-end tests for the fsgate binary.
//!
//! These tests verify complete flows work correctly:
//! - Configuration loading and command-line overrides
//! - File operations confined to the base directory
//! - Command history recording
//! - The line-oriented shell

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use cli::config::Config;
use cli::history::History;
use tempfile::TempDir;

/// Create a sandbox and a config file pointing at it.
///
/// Returns the temp dir guard, the sandbox path and the config path.
fn create_test_env() -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let sandbox = temp_dir.path().join("sandbox");
    fs::create_dir_all(&sandbox).unwrap();

    let mut config = Config::default();
    config.gateway.base_dir = sandbox.clone();
    config.history.path = temp_dir.path().join("history").to_string_lossy().to_string();
    config.logging.level = "warn".to_string();

    let config_path = temp_dir.path().join("config.toml");
    config.save(&config_path).unwrap();

    (temp_dir, sandbox, config_path)
}

fn fsgate(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fsgate"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("FSGATE_BASE_DIR")
        .env_remove("FSGATE_HISTORY_FILE")
        .env_remove("FSGATE_LOG_LEVEL")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

// =============================================================================
// File Operation Tests
// =============================================================================

#[test]
fn test_write_then_read() {
    let (_temp_dir, sandbox, config) = create_test_env();

    let output = fsgate(&config, &["write", "a/b.txt", "hi"]);
    assert!(output.status.success());
    assert_eq!(fs::read_to_string(sandbox.join("a/b.txt")).unwrap(), "hi");

    let output = fsgate(&config, &["read", "a/b.txt"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "hi");
}

#[test]
fn test_read_prints_file_bytes_unchanged() {
    let (_temp_dir, sandbox, config) = create_test_env();
    fs::write(sandbox.join("two.txt"), "first\nsecond\n").unwrap();

    let output = fsgate(&config, &["read", "two.txt"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "first\nsecond\n");
}

#[test]
fn test_write_from_stdin() {
    let (_temp_dir, sandbox, config) = create_test_env();

    let mut child = Command::new(env!("CARGO_BIN_EXE_fsgate"))
        .arg("--config")
        .arg(&config)
        .args(["write", "piped.txt"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"line one\nline two\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert_eq!(
        fs::read_to_string(sandbox.join("piped.txt")).unwrap(),
        "line one\nline two\n"
    );
}

#[test]
fn test_traversal_is_rejected() {
    let (temp_dir, _sandbox, config) = create_test_env();

    let output = fsgate(&config, &["write", "../outside.txt", "x"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid path"));
    assert!(!temp_dir.path().join("outside.txt").exists());
}

#[test]
fn test_list_json() {
    let (_temp_dir, sandbox, config) = create_test_env();
    fs::create_dir_all(sandbox.join("src")).unwrap();
    fs::write(sandbox.join("src/main.rs"), "fn main() {}").unwrap();

    let output = fsgate(&config, &["list", "--recursive", "--json"]);
    assert!(output.status.success());
    let names: Vec<String> = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(names, vec!["src", "src/main.rs"]);
}

#[test]
fn test_stat_json() {
    let (_temp_dir, sandbox, config) = create_test_env();
    fs::write(sandbox.join("data.txt"), "12345").unwrap();

    let output = fsgate(&config, &["stat", "data.txt", "--json"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(value["name"], "data.txt");
    assert_eq!(value["size"], 5);
    assert_eq!(value["is_dir"], false);
    assert!(value["modified"].as_u64().unwrap() > 0);
}

#[test]
fn test_base_dir_flag_overrides_config() {
    let (temp_dir, _sandbox, config) = create_test_env();
    let other = temp_dir.path().join("other");
    fs::create_dir_all(&other).unwrap();

    let other_str = other.to_string_lossy().to_string();
    let output = fsgate(&config, &["--base-dir", &other_str, "mkdir", "made-here"]);
    assert!(output.status.success());
    assert!(other.join("made-here").is_dir());
}

// =============================================================================
// History Tests
// =============================================================================

#[test]
fn test_commands_are_recorded() {
    let (temp_dir, _sandbox, config) = create_test_env();

    fsgate(&config, &["mkdir", "docs"]);
    fsgate(&config, &["exists", "docs"]);
    fsgate(&config, &["exists", "docs"]);

    let history_path = temp_dir.path().join("history");
    let history = History::open(&history_path.to_string_lossy(), 100).unwrap();
    assert_eq!(history.list(), vec!["mkdir docs", "exists docs"]);

    let output = fsgate(&config, &["history", "last"]);
    assert_eq!(stdout(&output), "exists docs\n");

    let output = fsgate(&config, &["history", "clear"]);
    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&history_path).unwrap(), "");
}

#[test]
fn test_multiline_stdin_write_is_recorded() {
    let (temp_dir, sandbox, config) = create_test_env();

    let mut child = Command::new(env!("CARGO_BIN_EXE_fsgate"))
        .arg("--config")
        .arg(&config)
        .args(["write", "f.txt"])
        .env_remove("FSGATE_HISTORY_FILE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"a\nb\n").unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert_eq!(fs::read_to_string(sandbox.join("f.txt")).unwrap(), "a\nb\n");

    let output = fsgate(&config, &["history", "list"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "    1  write f.txt\n");

    let history =
        History::open(&temp_dir.path().join("history").to_string_lossy(), 100).unwrap();
    assert_eq!(history.list(), vec!["write f.txt"]);
}

// =============================================================================
// Shell Tests
// =============================================================================

#[test]
fn test_shell_session() {
    let (temp_dir, sandbox, config) = create_test_env();

    let mut child = Command::new(env!("CARGO_BIN_EXE_fsgate"))
        .arg("--config")
        .arg(&config)
        .arg("shell")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"write notes.txt hello shell\nread notes.txt\n\nexit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert!(stdout(&output).contains("hello shell"));
    assert_eq!(
        fs::read_to_string(sandbox.join("notes.txt")).unwrap(),
        "hello shell"
    );

    let history =
        History::open(&temp_dir.path().join("history").to_string_lossy(), 100).unwrap();
    assert_eq!(
        history.list(),
        vec!["write notes.txt hello shell", "read notes.txt"]
    );
}

#[test]
fn test_shell_reports_failures() {
    let (_temp_dir, _sandbox, config) = create_test_env();

    let mut child = Command::new(env!("CARGO_BIN_EXE_fsgate"))
        .arg("--config")
        .arg(&config)
        .arg("shell")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"read ../../etc/passwd\nbogus\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid path"));
    assert!(stderr.contains("unknown command: bogus"));
}
