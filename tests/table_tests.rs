#![cfg(feature = "cli")]

use anyhow::Result;
use clap::Parser;
use std::io::Read;
use tempfile::TempDir;
use txpower::config::TableArgs;
use txpower::utils::validation::Validate;
use txpower::{LocalStorage, TableEngine, ZipTablePipeline};

fn read_entry(archive: &mut zip::ZipArchive<std::fs::File>, name: &str) -> Result<String> {
    let mut file = archive.by_name(name)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

#[tokio::test]
async fn test_table_build_writes_bundle() -> Result<()> {
    let input_dir = TempDir::new()?;
    let output_dir = TempDir::new()?;

    let input = input_dir.path().join("zips.csv");
    std::fs::write(
        &input,
        "zip,city,county\n\
         # downtown\n\
         75201,,\n\
         77002,,\n\
         78701,,\n\
         75802,Palestine,Anderson\n\
         10001,New York,\n\
         75201,,\n",
    )?;
    let overrides = input_dir.path().join("overrides.csv");
    std::fs::write(
        &overrides,
        "zip,tdsp,utility,city,county,confidence\n77002,centerpoint,,Houston,Harris,55\n",
    )?;

    let args = TableArgs::try_parse_from([
        "zip_table",
        "--input",
        input.to_str().unwrap(),
        "--overrides",
        overrides.to_str().unwrap(),
        "--output-path",
        output_dir.path().to_str().unwrap(),
    ])?;
    args.validate()?;

    let storage = LocalStorage::new(output_dir.path());
    let engine = TableEngine::new(ZipTablePipeline::new(storage, args));
    let (bundle, stats) = engine.run().await?;

    assert_eq!(bundle, "zip_tdsp_bundle.zip");
    assert_eq!(stats.total, 4);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.deregulated, 3);
    assert_eq!(stats.low_confidence, 1);
    assert_eq!(stats.by_tdsp.get("oncor"), Some(&2));
    assert_eq!(stats.by_tdsp.get("Austin Energy"), Some(&1));

    let file = std::fs::File::open(output_dir.path().join(&bundle))?;
    let mut archive = zip::ZipArchive::new(file)?;
    assert_eq!(archive.len(), 4);

    let csv = read_entry(&mut archive, "zip_tdsp.csv")?;
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("zip,tdsp,utility,city,county,confidence,source,deregulated")
    );
    assert_eq!(lines.count(), 4);

    let low: serde_json::Value = serde_json::from_str(&read_entry(&mut archive, "low_confidence.json")?)?;
    assert_eq!(low[0]["zip"], "77002");

    let manifest: serde_json::Value = serde_json::from_str(&read_entry(&mut archive, "manifest.json")?)?;
    assert_eq!(manifest["low_confidence_threshold"], 60);
    assert_eq!(manifest["stats"]["total"], 4);
    assert_eq!(manifest["files"].as_array().map(Vec::len), Some(4));
    Ok(())
}

#[tokio::test]
async fn test_table_build_rejects_empty_list() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("empty.csv");
    std::fs::write(&input, "zip\n# nothing yet\n").unwrap();

    let args = TableArgs::try_parse_from(["zip_table", "--input", input.to_str().unwrap()]).unwrap();
    let engine = TableEngine::new(ZipTablePipeline::new(LocalStorage::new(dir.path()), args));
    let err = engine.run().await.unwrap_err();
    assert!(err.to_string().contains("no entries"));
}

#[test]
fn test_table_args_validation() {
    let args = TableArgs::try_parse_from([
        "zip_table",
        "--input",
        "zips.csv",
        "--low-confidence",
        "101",
    ])
    .unwrap();
    assert!(args.validate().is_err());

    assert!(TableArgs::try_parse_from(["zip_table"]).is_err());
}
