//! Lookup-table build: a ZIP list goes in, a bundle of resolved ZIP → TDSP
//! tables comes out.

use crate::core::zip_mapper::{slugify, MapperSettings, ZipMapper};
use crate::domain::model::ZipCodeMapping;
use crate::domain::ports::{ConfigProvider, Storage, TablePipeline, TableResult, TableStats, ZipSeed};
use crate::utils::error::{AppError, Result};
use crate::utils::monitor::BuildMonitor;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const DEFAULT_BUNDLE_NAME: &str = "zip_tdsp_bundle.zip";
pub const DEFAULT_LOW_CONFIDENCE: u8 = 60;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    zip: &'a str,
    tdsp: &'a str,
    utility: &'a str,
    city: &'a str,
    county: &'a str,
    confidence: u8,
    source: &'a str,
    deregulated: bool,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    generated_at: String,
    generator: String,
    low_confidence_threshold: u8,
    files: &'a [&'a str],
    stats: &'a TableStats,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses a `zip[,city,county]` list. A header row is optional; blank lines
/// and `#` comments are skipped.
pub fn parse_seeds(data: &[u8]) -> Result<Vec<ZipSeed>> {
    let has_header = data
        .split(|b| *b == b'\n')
        .map(|line| String::from_utf8_lossy(line).trim().to_ascii_lowercase())
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .is_some_and(|line| line.starts_with("zip"));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(data);

    let mut seeds = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if has_header && index == 0 {
            continue;
        }
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        seeds.push(ZipSeed {
            zip: record.get(0).unwrap_or_default().to_string(),
            city: blank_to_none(record.get(1).map(str::to_string)),
            county: blank_to_none(record.get(2).map(str::to_string)),
        });
    }
    Ok(seeds)
}

pub struct ZipTablePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    settings: MapperSettings,
}

impl<S: Storage, C: ConfigProvider> ZipTablePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self::with_settings(storage, config, MapperSettings::default())
    }

    pub fn with_settings(storage: S, config: C, settings: MapperSettings) -> Self {
        Self {
            storage,
            config,
            settings,
        }
    }

    async fn mapper(&self) -> Result<ZipMapper> {
        let mut mapper = ZipMapper::with_settings(self.settings);
        if let Some(path) = self.config.override_file() {
            let data = self.storage.read_file(path).await?;
            let applied = mapper.load_overrides_csv(&data)?;
            tracing::info!("🔧 Applied {} overrides from {}", applied, path);
        }
        Ok(mapper)
    }
}

fn record_stats(stats: &mut TableStats, mapping: &ZipCodeMapping) {
    stats.total += 1;
    if mapping.deregulated {
        stats.deregulated += 1;
    }
    *stats
        .by_source
        .entry(mapping.source.as_str().to_string())
        .or_insert(0) += 1;
    let territory = match (&mapping.tdsp, &mapping.utility) {
        (Some(code), _) => code.as_str().to_string(),
        (None, Some(utility)) => utility.clone(),
        (None, None) => "unknown".to_string(),
    };
    *stats.by_tdsp.entry(territory).or_insert(0) += 1;
}

fn to_csv(mappings: &[ZipCodeMapping]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for m in mappings {
        writer.serialize(CsvRow {
            zip: &m.zip,
            tdsp: m.tdsp.map(|c| c.as_str()).unwrap_or(""),
            utility: m.utility.as_deref().unwrap_or(""),
            city: m.city.as_deref().unwrap_or(""),
            county: m.county.as_deref().unwrap_or(""),
            confidence: m.confidence,
            source: m.source.as_str(),
            deregulated: m.deregulated,
        })?;
    }
    writer.into_inner().map_err(|e| AppError::ProcessingError {
        message: format!("failed to flush CSV output: {}", e),
    })
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> TablePipeline for ZipTablePipeline<S, C> {
    async fn extract(&self) -> Result<Vec<ZipSeed>> {
        let path = self.config.zip_list_file();
        tracing::debug!("Reading ZIP list from {}", path);
        let data = self.storage.read_file(path).await?;
        let seeds = parse_seeds(&data)?;
        if seeds.is_empty() {
            return Err(AppError::ProcessingError {
                message: format!("ZIP list {} contains no entries", path),
            });
        }
        Ok(seeds)
    }

    async fn transform(&self, seeds: Vec<ZipSeed>) -> Result<TableResult> {
        let mapper = self.mapper().await?;
        let threshold = self.config.low_confidence_threshold();

        let mut seen = BTreeSet::new();
        let mut stats = TableStats::default();
        let mut mappings = Vec::with_capacity(seeds.len());
        let mut low_confidence = Vec::new();

        for seed in seeds {
            let mut mapping = match mapper.resolve(&seed.zip) {
                Ok(mapping) => mapping,
                Err(e) => {
                    tracing::warn!("⚠️ Skipping {}: {}", seed.zip, e);
                    stats.rejected += 1;
                    continue;
                }
            };
            if !seen.insert(mapping.zip.clone()) {
                continue;
            }
            if mapping.city.is_none() {
                if let Some(city) = seed.city {
                    mapping.city_slug = Some(slugify(&city));
                    mapping.city = Some(city);
                }
            }
            if mapping.county.is_none() {
                mapping.county = seed.county;
            }

            record_stats(&mut stats, &mapping);
            if mapping.confidence < threshold {
                low_confidence.push(mapping.clone());
            }
            mappings.push(mapping);
        }
        stats.low_confidence = low_confidence.len();

        Ok(TableResult {
            mappings,
            low_confidence,
            stats,
        })
    }

    async fn load(&self, result: TableResult) -> Result<String> {
        const FILES: [&str; 4] = [
            "zip_tdsp.csv",
            "zip_tdsp.json",
            "low_confidence.json",
            "manifest.json",
        ];
        let manifest = Manifest {
            generated_at: chrono::Utc::now().to_rfc3339(),
            generator: format!("txpower {}", env!("CARGO_PKG_VERSION")),
            low_confidence_threshold: self.config.low_confidence_threshold(),
            files: &FILES,
            stats: &result.stats,
        };

        let bundle = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            zip.start_file::<_, ()>(FILES[0], FileOptions::default())?;
            zip.write_all(&to_csv(&result.mappings)?)?;

            zip.start_file::<_, ()>(FILES[1], FileOptions::default())?;
            zip.write_all(serde_json::to_string_pretty(&result.mappings)?.as_bytes())?;

            zip.start_file::<_, ()>(FILES[2], FileOptions::default())?;
            zip.write_all(serde_json::to_string_pretty(&result.low_confidence)?.as_bytes())?;

            zip.start_file::<_, ()>(FILES[3], FileOptions::default())?;
            zip.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())?;

            zip.finish()?.into_inner()
        };

        let name = self.config.bundle_name();
        tracing::debug!("Writing bundle ({} bytes) to {}", bundle.len(), name);
        self.storage.write_file(name, &bundle).await?;
        Ok(name.to_string())
    }
}

/// Runs a [`TablePipeline`] end to end with optional phase monitoring.
pub struct TableEngine<P: TablePipeline> {
    pipeline: P,
    monitor: BuildMonitor,
}

impl<P: TablePipeline> TableEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor: bool) -> Self {
        Self {
            pipeline,
            monitor: BuildMonitor::new(monitor),
        }
    }

    pub async fn run(&self) -> Result<(String, TableStats)> {
        tracing::info!("🚀 Starting ZIP table build");

        // Extract
        let seeds = self.pipeline.extract().await?;
        tracing::info!("📥 Read {} ZIP codes", seeds.len());
        self.monitor.log_phase("extract");

        // Transform
        let result = self.pipeline.transform(seeds).await?;
        tracing::info!(
            "🔄 Resolved {} ZIPs ({} deregulated, {} low confidence, {} rejected)",
            result.stats.total,
            result.stats.deregulated,
            result.stats.low_confidence,
            result.stats.rejected
        );
        self.monitor.log_phase("transform");

        // Load
        let stats = result.stats.clone();
        let output = self.pipeline.load(result).await?;
        tracing::info!("💾 Bundle written to {}", output);
        self.monitor.log_phase("load");
        self.monitor.log_final();

        Ok((output, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{MappingSource, TdspCode};
    use std::collections::HashMap;
    use std::io::Read;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MemoryStorage {
        async fn put(&self, path: &str, data: &str) {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.as_bytes().to_vec());
        }

        async fn get(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MemoryStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            self.get(path).await.ok_or_else(|| {
                AppError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct TestConfig {
        overrides: Option<String>,
    }

    impl ConfigProvider for TestConfig {
        fn zip_list_file(&self) -> &str {
            "zips.csv"
        }

        fn override_file(&self) -> Option<&str> {
            self.overrides.as_deref()
        }

        fn bundle_name(&self) -> &str {
            DEFAULT_BUNDLE_NAME
        }

        fn low_confidence_threshold(&self) -> u8 {
            DEFAULT_LOW_CONFIDENCE
        }
    }

    fn pipeline(storage: MemoryStorage, overrides: bool) -> ZipTablePipeline<MemoryStorage, TestConfig> {
        let config = TestConfig {
            overrides: overrides.then(|| "overrides.csv".to_string()),
        };
        ZipTablePipeline::new(storage, config)
    }

    #[test]
    fn test_parse_seeds_with_and_without_header() {
        let with_header = parse_seeds(b"zip,city,county\n75201,Dallas,Dallas\n\n77002,,\n").unwrap();
        assert_eq!(with_header.len(), 2);
        assert_eq!(with_header[0].city.as_deref(), Some("Dallas"));
        assert_eq!(with_header[1].city, None);

        let bare = parse_seeds(b"# comment\n75201\n77002\n").unwrap();
        assert_eq!(bare.iter().map(|s| s.zip.as_str()).collect::<Vec<_>>(), vec!["75201", "77002"]);
    }

    #[tokio::test]
    async fn test_transform_collects_stats_and_rejects() {
        let storage = MemoryStorage::default();
        let pipeline = pipeline(storage, false);
        let seeds = parse_seeds(b"75201\n75201-1234\n77002\n78701\n10001\nabcde\n79250,Petersburg,Hale\n").unwrap();

        let result = pipeline.transform(seeds).await.unwrap();

        assert_eq!(result.stats.total, 4);
        assert_eq!(result.stats.rejected, 2);
        assert_eq!(result.stats.deregulated, 2);
        assert_eq!(result.stats.by_tdsp.get("oncor"), Some(&1));
        assert_eq!(result.stats.by_tdsp.get("unknown"), Some(&1));

        let unknown = result.mappings.iter().find(|m| m.zip == "79250").unwrap();
        assert_eq!(unknown.source, MappingSource::Unknown);
        assert_eq!(unknown.city.as_deref(), Some("Petersburg"));
        assert!(result.low_confidence.iter().any(|m| m.zip == "79250"));
        assert_eq!(result.stats.low_confidence, result.low_confidence.len());
    }

    #[tokio::test]
    async fn test_overrides_are_applied_before_resolution() {
        let storage = MemoryStorage::default();
        storage
            .put("overrides.csv", "zip,tdsp,utility,city,county,confidence\n79250,lpl,,Petersburg,Hale,88\n")
            .await;
        let pipeline = pipeline(storage, true);

        let result = pipeline
            .transform(parse_seeds(b"79250\n").unwrap())
            .await
            .unwrap();

        assert_eq!(result.mappings[0].tdsp, Some(TdspCode::Lpl));
        assert_eq!(result.mappings[0].source, MappingSource::Override);
        assert!(result.low_confidence.is_empty());
    }

    #[tokio::test]
    async fn test_engine_writes_bundle() {
        let storage = MemoryStorage::default();
        storage.put("zips.csv", "zip\n75201\n77002\n79401\n").await;
        let engine = TableEngine::new(pipeline(storage.clone(), false));

        let (output, stats) = engine.run().await.unwrap();

        assert_eq!(output, DEFAULT_BUNDLE_NAME);
        assert_eq!(stats.total, 3);

        let bytes = storage.get(DEFAULT_BUNDLE_NAME).await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["low_confidence.json", "manifest.json", "zip_tdsp.csv", "zip_tdsp.json"]
        );

        let mut csv = String::new();
        archive.by_name("zip_tdsp.csv").unwrap().read_to_string(&mut csv).unwrap();
        assert!(csv.starts_with("zip,tdsp,utility,city,county,confidence,source,deregulated"));
        assert!(csv.contains("79401,lpl,,Lubbock,Lubbock,"));

        let mut manifest = String::new();
        archive.by_name("manifest.json").unwrap().read_to_string(&mut manifest).unwrap();
        let manifest: serde_json::Value = serde_json::from_str(&manifest).unwrap();
        assert_eq!(manifest["stats"]["total"], 3);
        assert_eq!(manifest["low_confidence_threshold"], 60);
    }

    #[tokio::test]
    async fn test_extract_empty_list_fails() {
        let storage = MemoryStorage::default();
        storage.put("zips.csv", "zip\n").await;
        let pipeline = pipeline(storage, false);
        assert!(pipeline.extract().await.is_err());
    }
}
