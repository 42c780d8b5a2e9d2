use crate::adapters::http::{build_client, send_with_retry, RetryPolicy};
use crate::config::UpstreamConfig;
use crate::domain::model::TdspCode;
use crate::domain::ports::TerritoryLookup;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const SERVICE: &str = "territory";

#[derive(Debug, Deserialize)]
struct TerritoryResponse {
    in_territory: bool,
}

/// Asks a utility's territory service whether it serves a ZIP.
pub struct TerritoryClient {
    client: Client,
    endpoint: String,
    policy: RetryPolicy,
}

impl TerritoryClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(SERVICE, config)?,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            policy: RetryPolicy::from_config(config),
        })
    }
}

#[async_trait]
impl TerritoryLookup for TerritoryClient {
    async fn in_territory(&self, zip: &str, tdsp: TdspCode) -> Result<bool> {
        let url = format!("{}/territory", self.endpoint);
        let response = send_with_retry(SERVICE, self.policy, || {
            self.client
                .get(&url)
                .query(&[("zip", zip), ("tdsp", tdsp.as_str())])
        })
        .await?;
        let body: TerritoryResponse = response.json().await?;
        tracing::debug!("📡 Territory check {} in {}: {}", zip, tdsp, body.in_territory);
        Ok(body.in_territory)
    }
}
