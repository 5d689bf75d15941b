use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn metatag_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_metatag"))
}

fn run_cli(home: &Path, args: &[&str]) -> Output {
    Command::new(metatag_bin())
        .args(args)
        .env("METATAG_HOME", home)
        .env_remove("METATAG_DB")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute metatag CLI")
}

fn assert_cli_success(output: &Output, args: &[&str]) {
    assert!(
        output.status.success(),
        "command failed: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn run_json(home: &Path, args: &[&str]) -> Value {
    let output = run_cli(home, args);
    assert_cli_success(&output, args);
    serde_json::from_slice(&output.stdout).expect("parse json output")
}

fn setup() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let home = tmp.path().join("home");
    let music = tmp.path().join("music");
    fs::create_dir_all(music.join("Album (2001)")).unwrap();
    fs::write(music.join("Album (2001)").join("01 - Intro.mp3"), b"id3").unwrap();
    (tmp, home, music)
}

#[test]
fn test_rule_apply_and_undo_round_trip() {
    let (_tmp, home, music) = setup();
    let music_arg = music.to_string_lossy().into_owned();

    let args = ["library", "add", music_arg.as_str()];
    assert_cli_success(&run_cli(&home, &args), &args);

    let libraries = run_json(&home, &["library", "list", "--json"]);
    let library_id = libraries[0]["id"].as_i64().unwrap().to_string();

    let files = run_json(&home, &["library", "files", &library_id, "--json"]);
    assert_eq!(files.as_array().unwrap().len(), 1);
    let file_id = files[0]["id"].as_i64().unwrap().to_string();

    let rules = run_json(&home, &["rule", "list", "--json"]);
    let rule_id = rules
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "Title from ## - Title filename")
        .and_then(|r| r["id"].as_i64())
        .unwrap()
        .to_string();

    let preview = run_json(
        &home,
        &["rule", "preview", &rule_id, "--library", &library_id, "--json"],
    );
    assert_eq!(preview[0]["new_value"], "Intro");

    // Without --yes nothing is written.
    let dry = ["rule", "apply", rule_id.as_str(), "--file", file_id.as_str()];
    let output = run_cli(&home, &dry);
    assert_cli_success(&output, &dry);
    assert!(String::from_utf8_lossy(&output.stdout).contains("--yes"));
    let tags = run_json(&home, &["tag", "show", &file_id, "--json"]);
    assert!(tags.as_array().unwrap().is_empty());

    let apply = ["rule", "apply", rule_id.as_str(), "--file", file_id.as_str(), "--yes"];
    assert_cli_success(&run_cli(&home, &apply), &apply);
    let tags = run_json(&home, &["tag", "show", &file_id, "--json"]);
    assert_eq!(tags[0]["key"], "title");
    assert_eq!(tags[0]["value"], "Intro");
    assert!(music
        .join("Album (2001)")
        .join("01 - Intro.mp3.meta.json")
        .exists());

    let history = run_json(&home, &["history", "show", &file_id, "--json"]);
    assert_eq!(history[0]["operation"], "create");

    let undo = ["history", "undo", file_id.as_str()];
    assert_cli_success(&run_cli(&home, &undo), &undo);
    let tags = run_json(&home, &["tag", "show", &file_id, "--json"]);
    assert!(tags.as_array().unwrap().is_empty());
}

#[test]
fn test_tag_set_and_rm_are_recorded() {
    let (_tmp, home, music) = setup();
    let music_arg = music.to_string_lossy().into_owned();
    let args = ["library", "add", music_arg.as_str(), "--name", "Tunes"];
    assert_cli_success(&run_cli(&home, &args), &args);

    let libraries = run_json(&home, &["library", "list", "--json"]);
    assert_eq!(libraries[0]["name"], "Tunes");
    let library_id = libraries[0]["id"].as_i64().unwrap().to_string();
    let files = run_json(&home, &["library", "files", &library_id, "--json"]);
    let file_id = files[0]["id"].as_i64().unwrap().to_string();

    let set = ["tag", "set", file_id.as_str(), "genre", "Ambient"];
    assert_cli_success(&run_cli(&home, &set), &set);
    let rm = ["tag", "rm", file_id.as_str(), "genre"];
    assert_cli_success(&run_cli(&home, &rm), &rm);

    let history = run_json(&home, &["history", "show", &file_id, "--json"]);
    let ops: Vec<_> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["operation"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ops, vec!["update", "create"]);
    assert_eq!(history[0]["old_value"], "Ambient");
    assert!(history[0]["new_value"].is_null());

    let undo = ["history", "undo", file_id.as_str()];
    assert_cli_success(&run_cli(&home, &undo), &undo);
    let tags = run_json(&home, &["tag", "show", &file_id, "--json"]);
    assert_eq!(tags[0]["key"], "genre");
    assert_eq!(tags[0]["value"], "Ambient");
}

#[test]
fn test_preset_rule_cannot_be_removed() {
    let (_tmp, home, _music) = setup();
    let rules = run_json(&home, &["rule", "list", "--json"]);
    let preset_id = rules[0]["id"].as_i64().unwrap().to_string();
    assert_eq!(rules[0]["is_preset"], true);

    let output = run_cli(&home, &["rule", "remove", &preset_id]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot be removed"));
}

#[test]
fn test_undo_without_history_fails() {
    let (_tmp, home, music) = setup();
    let music_arg = music.to_string_lossy().into_owned();
    let args = ["library", "add", music_arg.as_str()];
    assert_cli_success(&run_cli(&home, &args), &args);
    let libraries = run_json(&home, &["library", "list", "--json"]);
    let library_id = libraries[0]["id"].as_i64().unwrap().to_string();
    let files = run_json(&home, &["library", "files", &library_id, "--json"]);
    let file_id = files[0]["id"].as_i64().unwrap().to_string();

    let output = run_cli(&home, &["history", "undo", &file_id]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Nothing to undo"));
}
