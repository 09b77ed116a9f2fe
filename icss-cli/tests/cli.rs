use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

fn icss_binary() -> &'static str {
    env!("CARGO_BIN_EXE_icss")
}

fn run_icss(input: &Path, flags: &[&str]) -> Output {
    Command::new(icss_binary())
        .arg(input)
        .args(flags)
        .env_remove("RUST_LOG")
        .output()
        .expect("run icss")
}

const THEMED: &str = r#"/* palette */
Primary := #3366cc;
Compact := FALSE;

header, .banner {
  background-color: Primary;
  if [Compact] {
    height: 40px;
  } else {
    height: 40px * 2;
  }
}
"#;

#[test]
fn compiles_to_stdout() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    let input = tmp.path().join("theme.icss");
    fs::write(&input, THEMED)?;

    let output = run_icss(&input, &[]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "header, .banner {\n  background-color: #3366cc;\n  height: 80px;\n}\n"
    );
    assert!(output.stderr.is_empty(), "clean input should not print diagnostics");
    Ok(())
}

#[test]
fn writes_to_output_file() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    let input = tmp.path().join("theme.icss");
    let css = tmp.path().join("theme.css");
    fs::write(&input, THEMED)?;

    let output = Command::new(icss_binary())
        .arg(&input)
        .arg("--output")
        .arg(&css)
        .output()
        .expect("run icss");

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert_eq!(
        fs::read_to_string(&css)?,
        "header, .banner {\n  background-color: #3366cc;\n  height: 80px;\n}\n"
    );
    Ok(())
}

#[test]
fn reports_semantic_errors_with_location() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    let input = tmp.path().join("broken.icss");
    fs::write(&input, "a {\n  color: 2 + 3px;\n}\n")?;

    let output = run_icss(&input, &[]);

    assert!(!output.status.success(), "type errors must fail the build");
    assert!(output.stdout.is_empty(), "no CSS is written on failure");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error: TypeError: Cannot add or subtract with distinct literals."),
        "stderr: {stderr}"
    );
    assert!(
        stderr.contains("error: Color/background-color property must be assigned by a color literal."),
        "stderr: {stderr}"
    );
    assert!(stderr.contains("broken.icss:2:"), "stderr: {stderr}");
    assert!(stderr.contains("Semantic analysis failed with 2 error(s)"), "stderr: {stderr}");
    Ok(())
}

#[test]
fn reports_syntax_errors() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    let input = tmp.path().join("syntax.icss");
    fs::write(&input, "a { width: 1px }\n")?;

    let output = run_icss(&input, &[]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("expected ';' after declaration"),
        "stderr: {stderr}"
    );
    assert!(stderr.contains("syntax.icss:1:16"), "stderr: {stderr}");
    Ok(())
}

#[test]
fn check_mode_writes_no_css() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    let input = tmp.path().join("theme.icss");
    fs::write(&input, THEMED)?;

    let output = run_icss(&input, &["--check"]);

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no errors"));
    Ok(())
}

#[test]
fn check_mode_fails_on_scope_errors() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    let input = tmp.path().join("scoped.icss");
    fs::write(&input, "a { Gap := 1px; } b { width: Gap; }\n")?;

    let output = run_icss(&input, &["--check"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Scope error: variable not defined in current scope."),
        "stderr: {stderr}"
    );
    Ok(())
}

#[test]
fn warns_about_unknown_properties() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    let input = tmp.path().join("margin.icss");
    fs::write(&input, "p { margin: 4px * 2; }\n")?;

    let output = run_icss(&input, &[]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "p {\n  margin: 8px;\n}\n"
    );
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("warning: unknown property 'margin' is passed through unchecked"));
    Ok(())
}

#[test]
fn emits_evaluated_tree_as_json() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    let input = tmp.path().join("tree.icss");
    let css = tmp.path().join("tree.css");
    fs::write(&input, "Size := 2px; a { width: Size + 1px; }\n")?;

    let output = Command::new(icss_binary())
        .arg(&input)
        .args(["--emit", "json", "-o"])
        .arg(&css)
        .output()
        .expect("run icss");

    assert!(output.status.success());
    let tree: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(tree["kind"], "Stylesheet");
    let rule = &tree["children"][0];
    assert_eq!(rule["kind"], "Stylerule");
    assert_eq!(rule["children"][1]["children"][1]["kind"]["Literal"]["Pixel"], 3);
    Ok(())
}

#[test]
fn missing_input_file_is_an_error() {
    let tmp = tempdir().expect("tempdir");
    let missing = tmp.path().join("absent.icss");

    let output = run_icss(&missing, &[]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read"));
}
