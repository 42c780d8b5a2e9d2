use crate::adapters::http::{build_client, send_with_retry, RetryPolicy};
use crate::config::UpstreamConfig;
use crate::core::tdsp;
use crate::domain::model::{EsiidRecord, TdspCode};
use crate::domain::ports::EsiidLookup;
use crate::utils::error::Result;
use crate::utils::validation::validate_esiid;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const SERVICE: &str = "esiid";

#[derive(Debug, Deserialize)]
struct RawEsiid {
    esiid: String,
    address: String,
    #[serde(default)]
    city: Option<String>,
    zip: String,
    #[serde(default)]
    tdsp_duns: Option<String>,
    #[serde(default)]
    premise_type: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// DUNS wins; the ESIID prefix is the fallback.
fn resolve_tdsp(raw: &RawEsiid) -> Option<TdspCode> {
    raw.tdsp_duns
        .as_deref()
        .and_then(tdsp::from_duns)
        .or_else(|| tdsp::from_esiid(&raw.esiid).ok().flatten())
}

/// Address to meter search against the ESIID registry API.
pub struct EsiidClient {
    client: Client,
    endpoint: String,
    policy: RetryPolicy,
}

impl EsiidClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(SERVICE, config)?,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            policy: RetryPolicy::from_config(config),
        })
    }
}

#[async_trait]
impl EsiidLookup for EsiidClient {
    async fn lookup(&self, address: &str, zip: &str) -> Result<Vec<EsiidRecord>> {
        let url = format!("{}/esiids", self.endpoint);
        let response = send_with_retry(SERVICE, self.policy, || {
            self.client
                .get(&url)
                .query(&[("address", address), ("zip", zip)])
        })
        .await?;
        let raw: Vec<RawEsiid> = response.json().await?;

        let records: Vec<EsiidRecord> = raw
            .into_iter()
            .filter(|r| match validate_esiid(&r.esiid) {
                Ok(()) => true,
                Err(_) => {
                    tracing::warn!("⚠️ Ignoring malformed ESIID '{}'", r.esiid);
                    false
                }
            })
            .map(|r| EsiidRecord {
                tdsp: resolve_tdsp(&r),
                esiid: r.esiid,
                address: r.address,
                city: r.city,
                zip: r.zip,
                premise_type: r.premise_type,
                status: r.status,
            })
            .collect();

        tracing::debug!("📡 {} ESIID candidates for {}", records.len(), zip);
        Ok(records)
    }
}
