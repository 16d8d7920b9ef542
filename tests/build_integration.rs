//! Integration tests that run the `xdoc` binary.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn xdoc_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_xdoc"))
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn temp_out(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("xdoc-build-test").join(name);
    // Clean up from previous runs
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn run(args: &[&str]) -> Output {
    Command::new(xdoc_bin())
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run xdoc")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn build_single_file_writes_page_and_source() {
    let out = temp_out("single");
    let output = run(&[
        "build",
        fixture("report.xdoc").to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--quiet",
    ]);
    assert!(output.status.success(), "xdoc build failed: {}", stderr(&output));

    let html = fs::read_to_string(out.join("report.html")).expect("report.html should exist");
    assert!(html.contains("<title>Parser Report</title>"));
    assert!(html.contains("<h2>2. Methods</h2>"), "included section missing");
    assert!(html.contains("<dt id=\"bib-knuth84\">[knuth84]</dt>"));
    assert!(out.join("report.xdoc").exists(), "source should be copied");

    // The unresolved reference is a warning, not a failure.
    assert!(stderr(&output).contains("[W010]"));

    let _ = fs::remove_dir_all(&out);
}

#[test]
fn build_title_flag_overrides_front_matter() {
    let out = temp_out("title");
    let output = run(&[
        "build",
        fixture("report.xdoc").to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--title",
        "Custom",
        "--quiet",
    ]);
    assert!(output.status.success());

    let html = fs::read_to_string(out.join("report.html")).unwrap();
    assert!(html.contains("<title>Custom</title>"));

    let _ = fs::remove_dir_all(&out);
}

#[test]
fn build_structural_error_exits_nonzero() {
    let out = temp_out("duplicate");
    let output = run(&[
        "build",
        fixture("duplicate.xdoc").to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--quiet",
    ]);
    assert!(!output.status.success());

    let err = stderr(&output);
    assert!(err.contains("duplicate.xdoc:3:"), "{err}");
    assert!(err.contains("error"), "{err}");
    assert!(err.contains("duplicate identifier 'dup'"), "{err}");
    assert!(!out.join("duplicate.html").exists());

    let _ = fs::remove_dir_all(&out);
}

#[test]
fn build_directory_uses_config_and_keeps_layout() {
    let src = temp_out("dir-src");
    fs::create_dir_all(src.join("guide")).unwrap();
    fs::write(src.join("xdoc.json"), r#"{ "outDir": "site", "numbering": false }"#).unwrap();
    fs::write(src.join("index.xdoc"), "<section>Home\n    Welcome.\n").unwrap();
    fs::write(
        src.join("guide/start.xdoc"),
        "---\nnumbering: true\n---\n<section>Start\n    Go.\n",
    )
    .unwrap();
    fs::write(src.join("notes.txt"), "not a document").unwrap();

    let output = run(&["build", src.to_str().unwrap(), "--quiet"]);
    assert!(output.status.success(), "xdoc build failed: {}", stderr(&output));

    let site = src.join("site");
    let index = fs::read_to_string(site.join("index.html")).unwrap();
    assert!(index.contains("<h2>Home</h2>"), "config disables numbering");
    let start = fs::read_to_string(site.join("guide/start.html")).unwrap();
    assert!(start.contains("<h2>1. Start</h2>"), "front matter wins over config");
    assert!(!site.join("notes.html").exists());

    // A second build must not pick up the copied sources inside the output.
    let again = run(&["build", src.to_str().unwrap(), "--quiet"]);
    assert!(again.status.success());
    assert!(!site.join("site").exists());

    let _ = fs::remove_dir_all(&src);
}

#[cfg(unix)]
#[test]
fn build_renders_diagrams_with_configured_command() {
    let src = temp_out("diagrams");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("xdoc.json"), r#"{ "diagrams": { "svg": "cat" } }"#).unwrap();
    fs::write(
        src.join("doc.xdoc"),
        "<x-diagram #flow .svg>Flow\n    <svg xmlns=\"http://www.w3.org/2000/svg\"/>\n",
    )
    .unwrap();
    let out = src.join("out");

    let output = run(&[
        "build",
        src.join("doc.xdoc").to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--quiet",
    ]);
    assert!(output.status.success(), "xdoc build failed: {}", stderr(&output));

    let html = fs::read_to_string(out.join("doc.html")).unwrap();
    assert!(html.contains("<img src=\"diagrams/"), "{html}");
    assert!(html.contains("<figcaption>Figure 1: Flow</figcaption>"), "{html}");

    let cached: Vec<_> = fs::read_dir(out.join("diagrams")).unwrap().collect();
    assert_eq!(cached.len(), 1);

    let _ = fs::remove_dir_all(&src);
}

#[test]
fn render_json_prints_tree() {
    let output = run(&["render", fixture("scenario.xdoc").to_str().unwrap(), "--format", "json"]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["nodes"][1]["node_type"], "section");
    assert!(json["xref"]["abstract"].is_number());
}

#[test]
fn render_html_prints_fragment() {
    let output = run(&["render", fixture("scenario.xdoc").to_str().unwrap()]);
    assert!(output.status.success());

    let html = String::from_utf8_lossy(&output.stdout);
    assert!(html.contains("<h2>1.1. Sub</h2>"));
    assert!(!html.contains("<!DOCTYPE html>"));
}

#[test]
fn check_reports_ok_and_warnings() {
    let output = run(&[
        "check",
        fixture("scenario.xdoc").to_str().unwrap(),
        fixture("report.xdoc").to_str().unwrap(),
    ]);
    assert!(output.status.success(), "warnings alone should not fail");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("scenario.xdoc: "));
    assert!(stdout.contains("OK"));
    let err = stderr(&output);
    assert!(err.contains("report.xdoc:"), "{err}");
    assert!(err.contains("warning: [W010]"), "{err}");
}

#[test]
fn check_fails_on_structural_error() {
    let output = run(&["check", fixture("duplicate.xdoc").to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("duplicate identifier"));
}
