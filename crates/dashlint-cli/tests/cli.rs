use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn dashlint() -> Command {
    let mut cmd = Command::cargo_bin("dashlint-cli").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn list_rules_prints_table() {
    dashlint()
        .arg("list-rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("6 built-in rule(s)"))
        .stdout(predicate::str::contains("ACCOUNT_IDS"))
        .stdout(predicate::str::contains("(expects null)"));
}

#[test]
fn list_rules_json_is_parseable() {
    let output = dashlint().args(["list-rules", "--json"]).output().unwrap();
    assert!(output.status.success());
    let rules: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<_> = rules
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        ids,
        vec![
            "GUID",
            "ENTITY_GUID",
            "LINKED_ENTITY_GUIDS",
            "PERMISSIONS",
            "ACCOUNT_ID",
            "ACCOUNT_IDS"
        ]
    );
}

#[test]
fn clean_file_prints_nothing_on_stdout() {
    dashlint()
        .arg("check-files")
        .arg(fixture("clean_dashboard.json"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("no dashboard warnings"));
}

#[test]
fn deprecated_fields_are_reported_in_line_order() {
    let path = fixture("deprecated_dashboard.json");
    let output = dashlint()
        .arg("check-files")
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let name = path.display().to_string();
    let expected_rows = [
        format!("| \"permissions\" field should not be used | {name} |"),
        format!("| \"accountId\" must be zero | {name} |"),
        format!("| \"entityGuid\" should not be used | {name} |"),
        format!("| \"accountIds\" must be set to [] | {name} |"),
    ];
    let rows: Vec<_> = stdout
        .lines()
        .filter(|line| line.ends_with(&format!("{name} |")))
        .collect();
    assert_eq!(rows, expected_rows.iter().map(String::as_str).collect::<Vec<_>>());
    assert!(stdout.starts_with("## Dashboard JSON warnings"));
    assert!(stdout.contains("| Warning | Filepath |"));
}

#[test]
fn fail_on_warnings_exits_with_two() {
    dashlint()
        .args(["check-files", "--fail-on-warnings"])
        .arg(fixture("deprecated_dashboard.json"))
        .assert()
        .code(2);

    dashlint()
        .args(["check-files", "--fail-on-warnings"])
        .arg(fixture("clean_dashboard.json"))
        .assert()
        .success();
}

#[test]
fn json_format_lists_entries() {
    let output = dashlint()
        .args(["check-files", "--format", "json"])
        .arg(fixture("deprecated_dashboard.json"))
        .output()
        .unwrap();
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 4);
    assert_eq!(entries[1]["warning"], "\"accountId\" must be zero");
}

#[test]
fn invalid_json_aborts() {
    let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write(file.path(), "{ \"name\": ").unwrap();

    dashlint()
        .arg("check-files")
        .arg(fixture("clean_dashboard.json"))
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not valid JSON"));
}

#[test]
fn check_pr_requires_token() {
    dashlint()
        .env_remove("GITHUB_TOKEN")
        .args(["check-pr", "--repo", "acme/quickstarts", "--pr", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GITHUB_TOKEN"));
}

#[test]
fn check_pr_requires_pull_request_number() {
    dashlint()
        .env("GITHUB_TOKEN", "test-token")
        .env_remove("DASHLINT_PR_NUMBER")
        .args(["check-pr", "--repo", "acme/quickstarts"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pull request number is not set"));
}

#[test]
fn invalid_config_timeout_is_reported() {
    let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write(
        file.path(),
        "repository = \"acme/quickstarts\"\ntimeout = \"soon\"\n",
    )
    .unwrap();

    dashlint()
        .env("GITHUB_TOKEN", "test-token")
        .arg("--config")
        .arg(file.path())
        .args(["check-pr", "--pr", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid timeout `soon`"));
}

#[test]
#[ignore = "requires loopback networking"]
fn check_pr_reads_files_from_api() {
    use httpmock::prelude::*;

    let server = MockServer::start();
    let raw_url = server.url("/raw/dash.json");
    let files = server.mock(|when, then| {
        when.method(GET).path("/repos/acme/quickstarts/pulls/5/files");
        then.status(200).json_body(serde_json::json!([
            { "filename": "dashboards/dash/dash.json", "status": "added", "raw_url": raw_url },
            { "filename": "quickstarts/dash/config.yml", "status": "added", "raw_url": "unused" }
        ]));
    });
    let raw = server.mock(|when, then| {
        when.method(GET).path("/raw/dash.json");
        then.status(200).body(r#"{"accountId": 99}"#);
    });

    dashlint()
        .env("GITHUB_TOKEN", "test-token")
        .args(["check-pr", "--repo", "acme/quickstarts", "--pr", "5", "--api-url"])
        .arg(server.base_url())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "| \"accountId\" must be zero | dashboards/dash/dash.json |",
        ));
    files.assert();
    raw.assert();
}
