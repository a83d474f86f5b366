use super::*;

use std::path::PathBuf;

use rstest::{fixture, rstest};
use tempfile::TempDir;

struct Outcome {
    exit_code: ExitCode,
    stdout: String,
    stderr: String,
}

fn invoke(args: &[&str]) -> Outcome {
    let argv: Vec<OsString> = std::iter::once("sift")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit_code = run(argv, &mut stdout, &mut stderr);
    Outcome {
        exit_code,
        stdout: String::from_utf8(stdout).expect("stdout utf8"),
        stderr: String::from_utf8(stderr).expect("stderr utf8"),
    }
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(&path, contents).expect("write fixture");
    path
}

#[fixture]
fn project() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    write(&dir, "src/app.ts", "foo(1);\nbar(2);\nfoo(3);\n");
    write(&dir, "src/util.ts", "const x = 1;\n");
    write(&dir, "scripts/tool.py", "foo(4)\n");
    write(&dir, ".cache/stale.ts", "foo(5);\n");
    dir
}

fn root(dir: &TempDir) -> &str {
    dir.path().to_str().expect("utf8 temp path")
}

#[rstest]
fn search_prints_one_line_per_match(project: TempDir) {
    let outcome = invoke(&["search", "foo('_x);", root(&project)]);
    assert_eq!(outcome.exit_code, ExitCode::SUCCESS);

    let lines: Vec<&str> = outcome.stdout.lines().collect();
    assert_eq!(lines.len(), 2, "stdout: {}", outcome.stdout);
    assert!(lines.first().is_some_and(|line| line.ends_with("app.ts:1:1: foo(1);")));
    assert!(lines.get(1).is_some_and(|line| line.ends_with("app.ts:3:1: foo(3);")));
}

#[rstest]
fn directory_walks_skip_hidden_and_foreign_files(project: TempDir) {
    let outcome = invoke(&["search", "--output", "json", "foo('_x);", root(&project)]);
    assert_eq!(outcome.exit_code, ExitCode::SUCCESS);

    let uris: Vec<String> = outcome
        .stdout
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).expect("json line");
            value
                .get("uri")
                .and_then(serde_json::Value::as_str)
                .expect("uri")
                .to_owned()
        })
        .collect();
    assert_eq!(uris.len(), 2);
    assert!(uris.first().is_some_and(|uri| uri.ends_with("app.ts")));
    assert!(uris.get(1).is_some_and(|uri| uri.ends_with("util.ts")));
}

#[rstest]
fn json_output_carries_captures(project: TempDir) {
    let file = project.path().join("src/app.ts");
    let outcome = invoke(&[
        "search",
        "--output",
        "json",
        "foo('x);",
        file.to_str().expect("utf8 path"),
    ]);
    assert_eq!(outcome.exit_code, ExitCode::SUCCESS);

    let value: serde_json::Value =
        serde_json::from_str(outcome.stdout.trim_end()).expect("single json line");
    let matches = value
        .get("matches")
        .and_then(serde_json::Value::as_array)
        .expect("matches array");
    assert_eq!(matches.len(), 2);
    let text_at = |pointer: &str| value.pointer(pointer).and_then(serde_json::Value::as_str);
    assert_eq!(text_at("/matches/0/image"), Some("foo(1);"));
    assert_eq!(text_at("/matches/0/captures/x/value/text"), Some("1"));
}

#[rstest]
fn explicit_files_are_searched_whatever_their_extension(project: TempDir) {
    let file = write(&project, "notes.txt", "foo(9);\n");
    let outcome = invoke(&["search", "foo('_x);", file.to_str().expect("utf8 path")]);
    assert_eq!(outcome.exit_code, ExitCode::SUCCESS);
    assert!(outcome.stdout.trim_end().ends_with("notes.txt:1:1: foo(9);"));
}

#[rstest]
fn language_flag_selects_the_walked_files(project: TempDir) {
    let outcome = invoke(&["search", "-l", "python", "foo('_x)", root(&project)]);
    assert_eq!(outcome.exit_code, ExitCode::SUCCESS);
    assert!(outcome.stdout.trim_end().ends_with("tool.py:1:1: foo(4)"));
}

#[cfg(unix)]
#[test]
fn directory_links_back_to_an_ancestor_are_not_followed() {
    let dir = TempDir::new().expect("temp dir");
    write(&dir, "d/a.ts", "foo(1);\n");
    std::os::unix::fs::symlink("..", dir.path().join("d/loop")).expect("create symlink");

    let outcome = invoke(&["search", "foo('_x);", root(&dir)]);
    assert_eq!(outcome.exit_code, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    let lines: Vec<&str> = outcome.stdout.lines().collect();
    assert_eq!(lines.len(), 1, "stdout: {}", outcome.stdout);
    assert!(lines.first().is_some_and(|line| line.ends_with("a.ts:1:1: foo(1);")));
}

#[test]
fn empty_inputs_are_reported() {
    let dir = TempDir::new().expect("temp dir");
    let outcome = invoke(&["search", "foo();", root(&dir)]);
    assert_eq!(outcome.exit_code, ExitCode::FAILURE);
    assert!(outcome.stderr.contains("no typescript files found"));
}

#[test]
fn missing_files_are_reported() {
    let dir = TempDir::new().expect("temp dir");
    let missing = dir.path().join("absent.ts");
    let outcome = invoke(&["search", "foo();", missing.to_str().expect("utf8 path")]);
    assert_eq!(outcome.exit_code, ExitCode::FAILURE);
    assert!(outcome.stderr.contains("failed to read"));
}

#[rstest]
#[case(&["check", "foo('_x);"], "ok\n")]
#[case(&["plan", "a.b(null);"], "require code a\nrequire code b\nrequire code null\n")]
#[case(&["plan", "'_a = '_b;"], "no required tokens\n")]
fn pattern_commands_report_on_stdout(#[case] args: &[&str], #[case] expected: &str) {
    let outcome = invoke(args);
    assert_eq!(outcome.exit_code, ExitCode::SUCCESS);
    assert_eq!(outcome.stdout, expected);
    assert!(outcome.stderr.is_empty());
}

#[test]
fn check_reports_malformed_patterns() {
    let outcome = invoke(&["check", "'_x{3,1};"]);
    assert_eq!(outcome.exit_code, ExitCode::FAILURE);
    assert!(outcome.stderr.contains("E_SIFT_RANGE_INVALID"));
    assert!(outcome.stderr.contains("minimum above its maximum"));
}

#[test]
fn options_file_tables_are_applied() {
    let dir = TempDir::new().expect("temp dir");
    let options = write(
        &dir,
        "options.json",
        r#"{ "compile": { "case_sensitive": false } }"#,
    );
    let source = write(&dir, "a.ts", "FOO(1);\n");
    let outcome = invoke(&[
        "search",
        "--options",
        options.to_str().expect("utf8 path"),
        "foo('_x);",
        source.to_str().expect("utf8 path"),
    ]);
    assert_eq!(outcome.exit_code, ExitCode::SUCCESS);
    assert!(outcome.stdout.trim_end().ends_with("a.ts:1:1: FOO(1);"));
}

#[test]
fn unknown_option_tables_are_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let options = write(&dir, "options.json", r#"{ "matcher": {} }"#);
    let outcome = invoke(&["check", "--options", options.to_str().expect("utf8 path"), "foo();"]);
    assert_eq!(outcome.exit_code, ExitCode::FAILURE);
    assert!(outcome.stderr.contains("failed to parse options file"));
}

#[test]
fn help_is_written_to_stdout() {
    let outcome = invoke(&["--help"]);
    assert_eq!(outcome.exit_code, ExitCode::SUCCESS);
    assert!(outcome.stdout.contains("search"));
    assert!(outcome.stderr.is_empty());
}

#[test]
fn usage_errors_fail() {
    let outcome = invoke(&["search", "foo();"]);
    assert_eq!(outcome.exit_code, ExitCode::FAILURE);
    assert!(outcome.stderr.contains("PATH"));
}
