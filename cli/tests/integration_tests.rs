use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;

use tempfile::TempDir;

/// Runs `cmdkit` in `dir` with a clean command-kit environment.
fn cmdkit(dir: &Path, args: &[&str]) -> Output {
    cmdkit_with_env(dir, args, &[])
}

fn cmdkit_with_env(dir: &Path, args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut command = std::process::Command::new(env!("CARGO_BIN_EXE_cmdkit"));
    command
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("CMDKIT_CONFIG")
        .env_remove("CMDKIT_CONTENT_TYPE")
        .env_remove("CMDKIT_JSON_TO_STDOUT")
        .env_remove("CMDKIT_ENV");
    for (key, value) in env {
        command.env(key, value);
    }
    command.output().expect("failed to run cmdkit")
}

/// Minimal aggregated configuration YAML.
fn write_config(dir: &TempDir, username: &str, api_version: Option<&str>) -> PathBuf {
    let mut yaml = format!("defaultusername: {username}\n");
    if let Some(api_version) = api_version {
        yaml.push_str(&format!("apiVersion: \"{api_version}\"\n"));
    }
    let path = dir.path().join(".cmdkit.yml");
    fs::write(&path, yaml).expect("failed to write config");
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[test]
fn unknown_command_lists_commands_and_fails() {
    let dir = TempDir::new().unwrap();
    let out = cmdkit(dir.path(), &["nope"]);

    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.contains("unknown command \"nope\""));
    assert!(err.contains("hello"));
    assert!(err.contains("flags:describe"));
    assert!(err.contains("org:display"));
}

#[test]
fn command_help_prints_usage_first() {
    let dir = TempDir::new().unwrap();
    let out = cmdkit(dir.path(), &["hello", "-h"]);

    assert!(out.status.success());
    let text = stdout(&out);
    assert_eq!(text.lines().next(), Some("USAGE"));
    assert!(text.contains("$ cmdkit hello [name=value...] [-n <string>]"));
    assert!(text.contains("OPTIONS"));
    assert!(!text.contains("--shout"));
}

// ---------------------------------------------------------------------------
// hello
// ---------------------------------------------------------------------------

#[test]
fn hello_prints_greeting_and_varargs() {
    let dir = TempDir::new().unwrap();
    let out = cmdkit(dir.path(), &["hello", "-n", "Ada", "--times", "2", "mood=cheerful"]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert_eq!(text.matches("Hello, Ada!").count(), 2);
    assert!(text.contains("mood = cheerful"));
}

#[test]
fn hello_json_document() {
    let dir = TempDir::new().unwrap();
    let out = cmdkit(dir.path(), &["hello", "--loud", "--json"]);

    assert!(out.status.success());
    let document: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(document["status"], 0);
    assert_eq!(document["result"]["greeting"], "HELLO, WORLD!");
    assert_eq!(document["warnings"], serde_json::json!([]));
}

#[test]
fn hello_out_of_range_value_fails() {
    let dir = TempDir::new().unwrap();
    let out = cmdkit(dir.path(), &["hello", "--times", "50"]);

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).starts_with("ERROR running hello: "));
}

#[test]
fn hello_deprecated_flag_warns() {
    let dir = TempDir::new().unwrap();
    let out = cmdkit(dir.path(), &["hello", "--shout"]);

    assert!(out.status.success());
    assert!(stdout(&out).contains("HELLO, WORLD!"));
    assert!(stderr(&out).contains("WARNING: The flag \"shout\" has been deprecated"));
}

#[test]
fn hello_duplicate_vararg_json_error_on_stderr() {
    let dir = TempDir::new().unwrap();
    let out = cmdkit_with_env(
        dir.path(),
        &["hello", "foo=bar", "foo=baz"],
        &[("CMDKIT_CONTENT_TYPE", "json"), ("CMDKIT_JSON_TO_STDOUT", "false")],
    );

    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    let document: serde_json::Value = serde_json::from_slice(&out.stderr).unwrap();
    assert_eq!(document["name"], "DuplicateVararg");
    assert_eq!(document["commandName"], "hello");
}

// ---------------------------------------------------------------------------
// flags:describe
// ---------------------------------------------------------------------------

#[test]
fn describe_renders_flag_table() {
    let dir = TempDir::new().unwrap();
    let out = cmdkit(dir.path(), &["flags:describe", "hello"]);

    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.lines().next().unwrap().starts_with("Name"));
    assert!(text.contains("times"));
    assert!(!text.contains("shout"));
    assert!(stderr(&out).contains("Pass --all"));
}

#[test]
fn describe_unknown_command_exit_code() {
    let dir = TempDir::new().unwrap();
    let out = cmdkit(dir.path(), &["flags:describe", "nope"]);

    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("Try this:"));
}

// ---------------------------------------------------------------------------
// org:display
// ---------------------------------------------------------------------------

#[test]
fn org_display_requires_username() {
    let dir = TempDir::new().unwrap();
    let out = cmdkit(dir.path(), &["org:display", "--json"]);

    assert_eq!(out.status.code(), Some(1));
    let document: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(document["name"], "RequiresUsernameError");
}

#[test]
fn org_display_uses_configured_default() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "ada@example.com", Some("58.0"));
    let out = cmdkit(dir.path(), &["org:display", "--json"]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let document: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(document["result"]["username"], "ada@example.com");
    assert_eq!(document["result"]["apiVersion"], "58.0");
    assert_eq!(
        document["warnings"][0],
        "apiVersion configuration overridden at \"58.0\""
    );
}

#[test]
fn org_display_config_path_from_env() {
    let dir = TempDir::new().unwrap();
    let config_dir = TempDir::new().unwrap();
    let path = write_config(&config_dir, "grace@example.com", None);
    let out = cmdkit_with_env(
        dir.path(),
        &["org:display", "--apiversion", "59.0"],
        &[("CMDKIT_CONFIG", path.to_str().unwrap())],
    );

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("grace@example.com"));
    assert!(text.contains("59.0"));
}
