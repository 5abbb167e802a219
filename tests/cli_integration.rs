use assert_cmd::Command;
use regex::Regex;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Function under test: reports `invalid` when the name was blanked.
const FAKE_FUNCTION: &str = r#"input=$(cat)
case "$input" in
  *'"name":""'*) echo '{"status":"invalid"}' ;;
  *) echo '{"status":"ok"}' ;;
esac
"#;

fn write_fake_function(dir: &Path) -> PathBuf {
    let path = dir.join("function.sh");
    fs::write(&path, FAKE_FUNCTION).expect("write fake function");
    path
}

fn normalize_output(text: &str) -> String {
    // Redact the crate version so reports stay stable across releases.
    let re_version = Regex::new(r#""version"\s*:\s*"[^"]*""#).unwrap();
    let out = re_version.replace_all(text, r#""version": "<VERSION>""#);

    let re_tmp_unix = Regex::new(r#"/tmp/[^\s"]+"#).unwrap();
    let out = re_tmp_unix.replace_all(&out, "<TMP>");

    out.to_string()
}

struct Run {
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

fn run_zest(args: &[&str]) -> Run {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zest-crumble"));
    cmd.args(args)
        .env("NO_COLOR", "1")
        .env("RUST_BACKTRACE", "0")
        .env_remove("ZEST_LOG");

    let output = cmd.output().expect("command should run");
    Run {
        code: output.status.code(),
        stdout: normalize_output(&String::from_utf8_lossy(&output.stdout)),
        stderr: normalize_output(&String::from_utf8_lossy(&output.stderr)),
    }
}

fn stdout_json(run: &Run) -> Value {
    serde_json::from_str(&run.stdout)
        .unwrap_or_else(|e| panic!("stdout is not JSON ({e}): {}", run.stdout))
}

#[test]
fn cli_help_lists_subcommands() {
    let run = run_zest(&["--help"]);
    assert_eq!(run.code, Some(0));
    for sub in ["check", "abstract", "sweep"] {
        assert!(run.stdout.contains(sub), "help should mention {sub}:\n{}", run.stdout);
    }
}

#[test]
fn check_prints_the_parsed_rule() {
    let run = run_zest(&[
        "check",
        "--script",
        "if status equals ok then pass else abstract count",
    ]);

    assert_eq!(run.code, Some(0));
    insta::assert_snapshot!(run.stdout, @r"
    output script ok
    key:        status
    value:      ok
    on success: pass
    on failure: abstract, count
    ");
}

#[test]
fn check_json_reports_tagged_failure() {
    let run = run_zest(&[
        "check",
        "--json",
        "--script",
        "if status equals ok then pass abstract count",
    ]);

    assert_eq!(run.code, Some(1));
    assert_eq!(
        stdout_json(&run),
        json!({"status": "failure", "error": "Missing the else keyword"})
    );
}

#[test]
fn check_human_failure_goes_to_stderr() {
    let run = run_zest(&["check", "--script", "if status equals ok"]);

    assert_eq!(run.code, Some(1));
    assert!(run.stdout.is_empty());
    assert_eq!(
        run.stderr.trim(),
        "invalid output script: Would expect at least 3 parameters after then"
    );
}

#[test]
fn abstract_summarizes_a_fixture() {
    let run = run_zest(&["abstract", "--input", "tests/fixtures/person.json"]);

    assert_eq!(run.code, Some(0));
    assert_eq!(
        stdout_json(&run),
        json!([
            {"path": "", "kind": "object", "length": 4},
            {"path": "born", "kind": "integer"},
            {"path": "city", "kind": "string", "length": 6},
            {"path": "languages", "kind": "array", "length": 2},
            {"path": "languages.0", "kind": "string", "length": 2},
            {"path": "languages.1", "kind": "string", "length": 2},
            {"path": "name", "kind": "string", "length": 3}
        ])
    );
}

#[cfg(unix)]
#[test]
fn sweep_json_report_follows_the_output_script() {
    let td = TempDir::new().unwrap();
    let function = write_fake_function(td.path());

    let run = run_zest(&[
        "sweep",
        "--spec",
        "tests/fixtures/status_sweep.yaml",
        "--json",
        "--",
        "sh",
        function.to_str().unwrap(),
    ]);

    assert_eq!(run.code, Some(0), "stderr:\n{}", run.stderr);

    let report = stdout_json(&run);
    assert_eq!(report["tool"], json!("zest-crumble"));
    assert_eq!(report["version"], json!("<VERSION>"));
    assert_eq!(report["rows"], json!(3));
    assert!(report.get("error").is_none());
    assert_eq!(
        report["entries"],
        json!([
            {
                "title": "Path: name, mutation: blank",
                "result": {"count": "Words: 4, Characters 25"}
            },
            {
                "title": "Path: name, mutation: reverse",
                "result": {"status": "ok"}
            },
            {
                "title": "Path: city, mutation: uppercase",
                "result": {"status": "ok"}
            }
        ])
    );

    // Human progress goes to stderr in --json mode.
    assert!(run.stderr.contains("zest-crumble: sweep"));
    assert!(run.stderr.contains("row 3: Path: city, mutation: uppercase"));
}

#[cfg(unix)]
#[test]
fn sweep_human_output_lists_rows_in_order() {
    let td = TempDir::new().unwrap();
    let function = write_fake_function(td.path());

    let run = run_zest(&[
        "sweep",
        "--spec",
        "tests/fixtures/status_sweep.yaml",
        "--",
        "sh",
        function.to_str().unwrap(),
    ]);

    assert_eq!(run.code, Some(0), "stderr:\n{}", run.stderr);

    let rows: Vec<&str> = run
        .stdout
        .lines()
        .filter(|l| l.starts_with("row "))
        .collect();
    assert_eq!(
        rows,
        vec![
            r#"row 1: Path: name, mutation: blank => {"count":"Words: 4, Characters 25"}"#,
            r#"row 2: Path: name, mutation: reverse => {"status":"ok"}"#,
            r#"row 3: Path: city, mutation: uppercase => {"status":"ok"}"#,
        ]
    );
    assert!(run.stdout.contains("--- sweep summary ---"));
    assert!(run.stdout.contains("entries: 3"));
}

#[cfg(unix)]
#[test]
fn rejected_output_script_is_a_single_entry() {
    let td = TempDir::new().unwrap();
    let function = write_fake_function(td.path());
    let spec = td.path().join("bad_script.yaml");
    fs::write(
        &spec,
        r#"
config:
  signature: A
  output: if status equals ok then pass abstract count
table:
  - { path: name, mutation: blank }
  - { path: name, mutation: reverse }
  - { path: city, mutation: uppercase }
values:
  - { name: Ada, city: London }
"#,
    )
    .unwrap();

    let args = [
        "sweep",
        "--spec",
        spec.to_str().unwrap(),
        "--json",
        "--",
        "sh",
        function.to_str().unwrap(),
    ];

    let run = run_zest(&args);
    assert_eq!(run.code, Some(0));
    assert_eq!(
        stdout_json(&run)["entries"],
        json!([{"message": "Crumble error: Missing the else keyword"}])
    );

    let mut strict_args = args.to_vec();
    strict_args.insert(3, "--strict");
    let run = run_zest(&strict_args);
    assert_eq!(run.code, Some(2));
}

#[cfg(unix)]
#[test]
fn missing_signature_fails_the_run() {
    let td = TempDir::new().unwrap();
    let function = write_fake_function(td.path());
    let spec = td.path().join("no_signature.json");
    fs::write(
        &spec,
        r#"{"table": [{"path": "name", "mutation": "blank"}], "values": [{"name": "Ada"}]}"#,
    )
    .unwrap();

    let run = run_zest(&[
        "sweep",
        "--spec",
        spec.to_str().unwrap(),
        "--json",
        "--",
        "sh",
        function.to_str().unwrap(),
    ]);

    assert_eq!(run.code, Some(1));
    let report = stdout_json(&run);
    assert_eq!(report["error"], json!("Crumble should have a signature"));
    assert_eq!(report["entries"], json!([]));
}

#[test]
fn missing_sweep_file_is_an_error() {
    let run = run_zest(&[
        "sweep",
        "--spec",
        "tests/fixtures/does_not_exist.yaml",
        "--",
        "true",
    ]);

    assert_eq!(run.code, Some(1));
    assert!(run.stderr.contains("failed to load sweep file"));
}
