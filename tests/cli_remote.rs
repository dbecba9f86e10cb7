mod content_api_stub;

use content_api_stub::{ContentApiStub, StubRoute};
use predicates::prelude::*;

fn docportal(stub: &ContentApiStub) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("docportal");
    cmd.env("DOCPORTAL_API_BASE_URL", &stub.base_url)
        .env("DOCPORTAL_ADMIN_EMAILS", "editor@example.com")
        .env_remove("DOCPORTAL_PATH_STYLE")
        .env_remove("DOCPORTAL_DEFAULTS_FILE");
    cmd
}

fn stdout_json(assert: assert_cmd::assert::Assert) -> serde_json::Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("json stdout")
}

#[test]
fn fetch_uses_stored_content_and_derives_missing_toc() {
    let stub = ContentApiStub::spawn(vec![StubRoute::json(
        "GET",
        "/content/en/invoices-creating-invoices",
        200,
        r##"{"pageContent":"# Stored\n## Part\n","tableOfContent":null}"##,
    )]);

    let page = stdout_json(
        docportal(&stub)
            .args(["fetch", "--page", "invoices/creating-invoices"])
            .assert()
            .success(),
    );
    assert_eq!(page["content"], "# Stored\n## Part\n");
    assert_eq!(page["origin"], "derived");
    assert_eq!(
        page["tableOfContent"]["structure"]["stored"]["children"],
        serde_json::json!(["part"])
    );
    assert!(page.get("notice").is_none());
}

#[test]
fn fetch_nested_path_style() {
    let stub = ContentApiStub::spawn(vec![StubRoute::json(
        "GET",
        "/content/fr/quotes/creating-quotes",
        200,
        r##"{"pageContent":"# Devis\n","tableOfContent":null}"##,
    )]);

    let page = stdout_json(
        docportal(&stub)
            .args([
                "fetch",
                "--language",
                "fr",
                "--page",
                "quotes/creating-quotes",
                "--path-style",
                "nested",
            ])
            .assert()
            .success(),
    );
    assert_eq!(page["content"], "# Devis\n");
}

#[test]
fn fetch_missing_page_falls_back_without_notice() {
    let stub = ContentApiStub::spawn(Vec::new());

    let page = stdout_json(
        docportal(&stub)
            .args(["fetch", "--page", "invoices/creating-invoices"])
            .assert()
            .success()
            .stderr(predicate::str::contains("Failed to fetch content").not()),
    );
    assert_eq!(page["origin"], "default");
    assert_eq!(
        page["content"],
        "# Creating Invoices\n\nStep by step guide to create invoices\n"
    );
}

#[test]
fn fetch_timeout_falls_back_to_default_with_notice() {
    let stub = ContentApiStub::spawn(vec![StubRoute::hang(
        "GET",
        "/content/en/invoices-creating-invoices",
    )]);

    let started = std::time::Instant::now();
    let page = stdout_json(
        docportal(&stub)
            .args([
                "fetch",
                "--page",
                "invoices/creating-invoices",
                "--timeout-ms",
                "200",
            ])
            .assert()
            .success()
            .stderr(predicate::str::contains("Failed to fetch content")),
    );
    assert!(started.elapsed() < std::time::Duration::from_secs(10));
    assert_eq!(page["origin"], "default");
    assert_eq!(page["notice"]["level"], "error");
    assert_eq!(
        page["tableOfContent"]["headers"][0]["id"],
        "creating-invoices"
    );
}

#[test]
fn save_posts_markdown_with_derived_toc() {
    let stub = ContentApiStub::spawn(vec![StubRoute::json(
        "POST",
        "/content/en/work-orders-managing-work-orders",
        200,
        "",
    )]);
    let temp = tempfile::TempDir::new().expect("tempdir");
    let input = temp.path().join("page.md");
    std::fs::write(&input, "# Managing\n## Assigning crews\n").expect("write markdown");

    docportal(&stub)
        .args([
            "save",
            "--page",
            "work-orders/managing-work-orders",
            "--user",
            "Editor@Example.com",
            "--input",
        ])
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains("Content saved successfully"));

    let requests = stub.requests();
    let post = requests
        .iter()
        .find(|r| r.method == "POST")
        .expect("save request");
    assert_eq!(post.path, "/api/v1/content/en/work-orders-managing-work-orders");
    let body: serde_json::Value = serde_json::from_str(&post.body).expect("json body");
    assert_eq!(body["pageContent"], "# Managing\n## Assigning crews\n");
    assert_eq!(body["pageURL"], "work-orders/managing-work-orders");
    assert_eq!(
        body["tableOfContent"]["headers"][1]["id"],
        "assigning-crews"
    );
}

#[test]
fn save_requires_admin() {
    let stub = ContentApiStub::spawn(Vec::new());

    docportal(&stub)
        .args([
            "save",
            "--page",
            "invoices/creating-invoices",
            "--user",
            "reader@example.com",
            "--input",
            "-",
        ])
        .write_stdin("# Hi\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("save page requires an admin account"));
    assert!(stub.requests().is_empty());
}

#[test]
fn api_error_detail_is_reported() {
    let stub = ContentApiStub::spawn(vec![StubRoute::json(
        "POST",
        "/content/structure/en/section",
        409,
        r#"{"detail":"section invoices already exists"}"#,
    )]);

    docportal(&stub)
        .args([
            "add-section",
            "--section-id",
            "invoices",
            "--title",
            "Invoices",
            "--user",
            "editor@example.com",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("section invoices already exists"));

    let requests = stub.requests();
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).expect("json body");
    assert_eq!(body["title"], "# Invoices");
}

#[test]
fn search_falls_back_to_catalog_when_api_is_down() {
    let stub = ContentApiStub::spawn(vec![StubRoute::json(
        "GET",
        "/content/structure/en",
        500,
        r#"{"detail":"boom"}"#,
    )]);

    let hits = stdout_json(
        docportal(&stub)
            .args(["search", "--query", "managing work"])
            .assert()
            .success(),
    );
    assert_eq!(hits[0]["id"], "managing-work-orders");
    assert_eq!(hits[0]["href"], "/work-orders/managing-work-orders");
}
