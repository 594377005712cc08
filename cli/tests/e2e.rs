use anyhow::Result;
use pretty_assertions::assert_eq;
use std::{
    fs,
    io::Write,
    path::PathBuf,
    process::{Command, Output},
};
use tempfile::NamedTempFile;

fn items_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("items.jsonl")
}

fn medsearch(args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_medsearch"))
        .arg("--input")
        .arg(items_path())
        .args(args)
        .env("RUST_LOG", "off")
        .output()?;
    Ok(output)
}

fn medications(stdout: &[u8]) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for line in String::from_utf8(stdout.to_vec())?.lines() {
        let record: serde_json::Value = serde_json::from_str(line)?;
        names.push(record["medication"].as_str().unwrap_or_default().to_string());
    }
    Ok(names)
}

#[test]
fn test_not_contains_keeps_records_without_description() -> Result<()> {
    let output = medsearch(&["--filter", "description:NotContains:foo"])?;
    assert!(output.status.success());
    assert_eq!(
        medications(&output.stdout)?,
        vec!["acetaminophen", "hydromorphone"]
    );
    Ok(())
}

#[test]
fn test_filters_combine_with_and_by_default() -> Result<()> {
    let output = medsearch(&[
        "-f",
        "controlled:eq:true",
        "-f",
        "dispensed_on:eq:2024-03-01",
    ])?;
    assert!(output.status.success());
    assert_eq!(medications(&output.stdout)?, vec!["morphine sulfate"]);

    let output = medsearch(&[
        "-f",
        "controlled:eq:true",
        "-f",
        "dispensed_on:eq:2024-03-01",
        "--any",
    ])?;
    assert_eq!(
        medications(&output.stdout)?,
        vec!["morphine sulfate", "acetaminophen", "hydromorphone"]
    );
    Ok(())
}

#[test]
fn test_empty_and_null_sentinels() -> Result<()> {
    let output = medsearch(&["-f", "lot_number:eq:=<empty>"])?;
    assert_eq!(medications(&output.stdout)?, vec!["acetaminophen"]);

    let output = medsearch(&["-f", "facility:eq:=<null>"])?;
    assert_eq!(medications(&output.stdout)?, vec!["hydromorphone"]);
    Ok(())
}

#[test]
fn test_criteria_document_and_output_file() -> Result<()> {
    let mut document = NamedTempFile::new()?;
    write!(
        document,
        r#"{{"combine": "all", "criteria": [
            {{"field": "medication", "operator": "Contains", "value": "morph"}},
            {{"field": "device_id", "operator": "NotEquals", "value": "5a7c3e10-9b2d-4f6a-8c1e-7d3b2a190001"}}
        ]}}"#
    )?;
    let out = NamedTempFile::new()?;
    let out_path = out.path().to_string_lossy().to_string();
    let criteria_path = document.path().to_string_lossy().to_string();

    let output = medsearch(&["--criteria", &criteria_path, "--output", &out_path, "--sql"])?;
    assert!(output.status.success());
    assert_eq!(
        medications(fs::read(out.path())?.as_slice())?,
        vec!["hydromorphone"]
    );

    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("WHERE (medication LIKE '%morph%' ESCAPE '\\'"));
    assert!(stderr.contains("device_id IS NULL"));
    assert!(stderr.contains("Wrote 1 matching records"));
    Ok(())
}

#[test]
fn test_unsupported_operator_fails() -> Result<()> {
    let output = medsearch(&["-f", "controlled:Contains:true"])?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("unsupported operator Contains for Boolean condition"));
    Ok(())
}

#[test]
fn test_malformed_filter_is_rejected_by_argument_parser() -> Result<()> {
    let output = medsearch(&["-f", "medication"])?;
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    Ok(())
}
