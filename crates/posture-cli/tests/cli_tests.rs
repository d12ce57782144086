//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A `posture` command isolated in `dir`: its own config, storage and HOME.
fn posture(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("posture").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("POSTURE_STORAGE_DIR")
        .env_remove("POSTURE_SUBMIT_URL")
        .env_remove("POSTURE_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    let config = format!(
        "storage_dir = '{}'\noutput_dir = 'out'\n\n[submitter]\ntype = \"local\"\n",
        dir.path().join("state").display()
    );
    std::fs::write(dir.path().join("posture.toml"), config).unwrap();
    dir
}

fn answers(n: usize) -> String {
    "4\n".repeat(n)
}

fn files_with_extension(dir: &Path, ext: &str) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|e| e == ext))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn validate_builtin_catalog() {
    let dir = workspace();
    posture(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("6 pillars, 18 questions, levels 1-4"))
        .stdout(predicate::str::contains("All catalogs valid."));
}

#[test]
fn validate_nonexistent_file() {
    let dir = workspace();
    posture(dir.path())
        .args(["validate", "--catalog", "nonexistent.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_rejects_negative_weights() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("bad.toml"),
        r#"
[catalog]
id = "bad"
name = "Bad"

[[levels]]
value = 1
label = "Low"

[[levels]]
value = 2
label = "High"

[[pillars]]
id = "P"
name = "Pillar"

[[pillars.questions]]
id = "Q1"
text = "Question?"
weight = -2
"#,
    )
    .unwrap();

    posture(dir.path())
        .args(["validate", "--catalog", "bad.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid weight -2"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    posture(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created posture.toml"))
        .stdout(predicate::str::contains("Created catalogs/example.toml"));

    assert!(dir.path().join("posture.toml").exists());

    posture(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists, skipping."));

    posture(dir.path())
        .args(["validate", "--catalog", "catalogs/example.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Example Catalog (2 pillars, 4 questions"));
}

#[test]
fn full_run_writes_reports() {
    let dir = workspace();

    posture(dir.path())
        .args(["run", "--name", "Ada", "--company", "Acme", "--format", "all"])
        .write_stdin(answers(18))
        .assert()
        .success()
        .stdout(predicate::str::contains("Assessment submitted"))
        .stdout(predicate::str::contains("Overall maturity: 100% (Resilient)"));

    let out = dir.path().join("out");
    assert_eq!(files_with_extension(&out, "json").len(), 1);
    assert_eq!(files_with_extension(&out, "html").len(), 1);
    assert_eq!(files_with_extension(&out, "md").len(), 1);

    posture(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved progress."));
}

#[test]
fn interrupted_run_can_be_resumed() {
    let dir = workspace();

    posture(dir.path())
        .args(["run", "--name", "Ada", "--company", "Acme", "--provider", "aws"])
        .write_stdin(answers(4))
        .assert()
        .success()
        .stdout(predicate::str::contains("Progress saved (4/18 answered)"));

    posture(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved progress for Acme (AWS)"))
        .stdout(predicate::str::contains("Answered: 4/18"))
        .stdout(predicate::str::contains(
            "Current pillar: 2/6 Cloud Identity & IAM (CSPR v3)",
        ));

    posture(dir.path())
        .arg("run")
        .write_stdin(format!("r\n{}", answers(14)))
        .assert()
        .success()
        .stdout(predicate::str::contains("Progress restored."))
        .stdout(predicate::str::contains("Overall maturity: 100%"));
}

#[test]
fn reset_clears_saved_progress() {
    let dir = workspace();

    posture(dir.path())
        .args(["run", "--name", "Ada", "--company", "Acme"])
        .write_stdin(answers(2))
        .assert()
        .success();

    posture(dir.path())
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved progress cleared."));

    posture(dir.path())
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved progress to clear."));

    posture(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved progress."));
}

#[test]
fn report_rerenders_saved_json() {
    let dir = workspace();

    posture(dir.path())
        .args(["run", "--name", "Ada", "--company", "Acme"])
        .write_stdin(answers(18))
        .assert()
        .success();

    let json = files_with_extension(&dir.path().join("out"), "json")
        .pop()
        .unwrap();
    let rendered = dir.path().join("rendered");

    posture(dir.path())
        .arg("report")
        .arg("--input")
        .arg(&json)
        .arg("--output")
        .arg(&rendered)
        .args(["--format", "markdown"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme"))
        .stdout(predicate::str::contains("100% overall, Resilient"));

    let md = files_with_extension(&rendered, "md").pop().unwrap();
    let content = std::fs::read_to_string(md).unwrap();
    assert!(content.contains("# Cybersecurity posture: Acme"));
}

#[test]
fn report_missing_input_fails() {
    let dir = workspace();
    posture(dir.path())
        .args(["report", "--input", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read report"));
}
