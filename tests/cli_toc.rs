use predicates::prelude::*;

const GUIDE: &str = "# Creating Invoices\n\nIntro\n\n## Line items\n### Taxes & Fees\n## Sending\n";

#[test]
fn toc_prints_headers_and_structure_as_json() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let input = temp.path().join("guide.md");
    std::fs::write(&input, GUIDE).expect("write markdown");

    let output = assert_cmd::cargo::cargo_bin_cmd!("docportal")
        .args(["toc", "--input"])
        .arg(&input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let toc: serde_json::Value = serde_json::from_slice(&output).expect("json output");
    let ids = toc["headers"]
        .as_array()
        .expect("headers array")
        .iter()
        .map(|h| h["id"].as_str().unwrap_or_default().to_owned())
        .collect::<Vec<_>>();
    assert_eq!(
        ids,
        vec!["creating-invoices", "line-items", "taxes-fees", "sending"]
    );
    assert_eq!(
        toc["structure"]["creating-invoices"]["children"],
        serde_json::json!(["line-items", "sending"])
    );
    assert_eq!(
        toc["structure"]["line-items"]["children"],
        serde_json::json!(["taxes-fees"])
    );
}

#[test]
fn toc_reads_stdin_and_writes_yaml() {
    assert_cmd::cargo::cargo_bin_cmd!("docportal")
        .args(["toc", "--input", "-", "--format", "yaml"])
        .write_stdin("# Title\n## Part\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("id: part"))
        .stdout(predicate::str::contains("level: 2"));
}

#[test]
fn ast_strategy_skips_fenced_code() {
    let markdown = "# Real\n\n```sh\n# not a heading\n```\n";

    assert_cmd::cargo::cargo_bin_cmd!("docportal")
        .args(["toc", "--input", "-", "--strategy", "ast"])
        .write_stdin(markdown)
        .assert()
        .success()
        .stdout(predicate::str::contains("not-a-heading").not());

    assert_cmd::cargo::cargo_bin_cmd!("docportal")
        .args(["toc", "--input", "-", "--strategy", "line"])
        .write_stdin(markdown)
        .assert()
        .success()
        .stdout(predicate::str::contains("not-a-heading"));
}

#[test]
fn numeric_suffix_policy_keeps_ids_unique() {
    assert_cmd::cargo::cargo_bin_cmd!("docportal")
        .args(["toc", "--input", "-", "--collisions", "numeric-suffix"])
        .write_stdin("# Notes\n# Notes\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"notes-1\""));
}

#[test]
fn slug_prints_heading_id() {
    assert_cmd::cargo::cargo_bin_cmd!("docportal")
        .args(["slug", "What's New?!"])
        .assert()
        .success()
        .stdout("what-s-new\n");
}

#[test]
fn render_marks_active_heading() {
    assert_cmd::cargo::cargo_bin_cmd!("docportal")
        .args(["render", "--input", "-", "--active", "sending"])
        .write_stdin(GUIDE)
        .assert()
        .success()
        .stdout(predicate::str::contains("<title>Creating Invoices</title>"))
        .stdout(predicate::str::contains("<h2 id=\"line-items\">"))
        .stdout(predicate::str::contains(
            "<a href=\"#sending\" class=\"active\">Sending</a>",
        ));
}

#[test]
fn render_rejects_unknown_active_heading() {
    assert_cmd::cargo::cargo_bin_cmd!("docportal")
        .args(["render", "--input", "-", "--active", "missing"])
        .write_stdin(GUIDE)
        .assert()
        .failure()
        .stderr(predicate::str::contains("heading missing"));
}

#[test]
fn offline_search_finds_typos_in_default_catalog() {
    let output = assert_cmd::cargo::cargo_bin_cmd!("docportal")
        .args(["search", "--query", "invoces", "--offline"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let hits: serde_json::Value = serde_json::from_slice(&output).expect("json output");
    assert_eq!(hits[0]["title"], "Invoices");
    assert_eq!(hits[0]["href"], "/invoices");
}

#[test]
fn missing_input_file_fails_with_context() {
    assert_cmd::cargo::cargo_bin_cmd!("docportal")
        .args(["toc", "--input", "does/not/exist.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("read input"));
}

#[test]
fn rust_log_debug_emits_debug_line_to_stderr() {
    assert_cmd::cargo::cargo_bin_cmd!("docportal")
        .env("RUST_LOG", "debug")
        .args(["slug", "Hello"])
        .assert()
        .success()
        .stderr(predicate::str::contains("parsed cli"));
}
