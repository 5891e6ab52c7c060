#![cfg(feature = "cli")]

use std::io::Write;
use std::process::{Command, Output};

use anyhow::Result;
use indoc::indoc;
use regex::Regex;

const BIN: &str = env!("CARGO_BIN_EXE_yaml-anchor-codec");

fn run_on(command: &str, suffix: &str, content: &str) -> Result<Output> {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(Command::new(BIN).arg(command).arg(file.path()).output()?)
}

#[test]
fn parse_prints_annotated_json() -> Result<()> {
    let out = run_on("parse", ".yaml", "base: &b {x: 1}\nuse: *b\n")?;
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout)?;
    assert_eq!(json["base"]["anchor"], "b");
    assert_eq!(json["use"]["referenceOf"], "b");
    assert_eq!(json["use"]["x"], 1);
    Ok(())
}

#[test]
fn generate_reads_annotated_json() -> Result<()> {
    let json = r#"{"base": {"x": 1, "anchor": "b"}, "use": {"referenceOf": "b"}}"#;
    let out = run_on("generate", ".json", json)?;
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8(out.stdout)?,
        indoc! {"
            # Generated YAML from JSON with anchors and references

            base: &b
              x: 1
            use: *b
        "}
    );
    Ok(())
}

#[test]
fn roundtrip_and_scope() -> Result<()> {
    let yaml = "base: &b\n  x: 1\nuse:\n  <<: *b\n  y: 2\n";
    let out = run_on("roundtrip", ".yaml", yaml)?;
    assert!(out.status.success());
    assert!(String::from_utf8(out.stdout)?.ends_with(yaml));

    let out = run_on("scope", ".yaml", yaml)?;
    assert!(out.status.success());
    let report = String::from_utf8(out.stdout)?;
    assert!(report.contains("- `b` → `/base`"), "{report}");
    assert!(report.contains("- `use` → `b`"), "{report}");
    Ok(())
}

#[test]
fn invalid_input_exits_with_3_and_a_snippet() -> Result<()> {
    let out = run_on("parse", ".yaml", "ok: 1\nbad: *nowhere\n")?;
    assert_eq!(out.status.code(), Some(3));
    let stderr = String::from_utf8(out.stderr)?;
    assert!(stderr.contains("undefined anchor `nowhere`"), "{stderr}");
    let location = Regex::new(r"\.yaml:2:6")?;
    assert!(location.is_match(&stderr), "{stderr}");
    Ok(())
}

#[test]
fn usage_and_io_errors() -> Result<()> {
    let out = Command::new(BIN).output()?;
    assert_eq!(out.status.code(), Some(1));
    let usage = String::from_utf8(out.stderr)?;
    assert!(usage.contains("Sequence anchors and aliases are lost"), "{usage}");

    let out = Command::new(BIN).args(["explode", "x.yaml"]).output()?;
    assert_eq!(out.status.code(), Some(1));

    let out = Command::new(BIN)
        .args(["parse", "/definitely/not/here.yaml"])
        .output()?;
    assert_eq!(out.status.code(), Some(2));
    Ok(())
}
