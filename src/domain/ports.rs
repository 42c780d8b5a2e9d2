use crate::domain::model::{EsiidRecord, Plan, TdspCode, ZipCodeMapping};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Settings the lookup-table build needs, whatever they were loaded from.
pub trait ConfigProvider: Send + Sync {
    fn zip_list_file(&self) -> &str;
    fn override_file(&self) -> Option<&str>;
    fn bundle_name(&self) -> &str;
    fn low_confidence_threshold(&self) -> u8;
}

/// Upstream retail pricing API.
#[async_trait]
pub trait PlanSource: Send + Sync {
    async fn fetch_plans(&self, tdsp: TdspCode, params: &[(String, String)]) -> Result<Vec<Plan>>;
}

/// A utility's own territory check for a ZIP.
#[async_trait]
pub trait TerritoryLookup: Send + Sync {
    async fn in_territory(&self, zip: &str, tdsp: TdspCode) -> Result<bool>;
}

/// Street address to meter (ESIID) search.
#[async_trait]
pub trait EsiidLookup: Send + Sync {
    async fn lookup(&self, address: &str, zip: &str) -> Result<Vec<EsiidRecord>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZipSeed {
    pub zip: String,
    pub city: Option<String>,
    pub county: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct TableStats {
    pub total: usize,
    pub deregulated: usize,
    pub by_source: std::collections::BTreeMap<String, usize>,
    pub by_tdsp: std::collections::BTreeMap<String, usize>,
    pub low_confidence: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone)]
pub struct TableResult {
    pub mappings: Vec<ZipCodeMapping>,
    pub low_confidence: Vec<ZipCodeMapping>,
    pub stats: TableStats,
}

#[async_trait]
pub trait TablePipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<ZipSeed>>;
    async fn transform(&self, seeds: Vec<ZipSeed>) -> Result<TableResult>;
    async fn load(&self, result: TableResult) -> Result<String>;
}
