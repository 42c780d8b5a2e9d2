use crate::adapters::http::{build_client, send_with_retry, RetryPolicy};
use crate::config::UpstreamConfig;
use crate::core::tdsp;
use crate::core::zip_mapper::slug;
use crate::domain::model::{Plan, PlanDocuments, PricePoints, Provider, RateType, TdspCode};
use crate::domain::ports::PlanSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const SERVICE: &str = "pricing";

#[derive(Debug, Deserialize)]
struct UpstreamPlan {
    #[serde(alias = "_id")]
    id: String,
    product: UpstreamProduct,
    #[serde(default)]
    expected_prices: Vec<UpstreamPrice>,
    #[serde(default)]
    tdsp_duns: Option<String>,
    #[serde(default)]
    base_charge: Option<f64>,
    #[serde(default)]
    enroll_url: Option<String>,
    #[serde(default)]
    document_links: Vec<UpstreamDocument>,
}

#[derive(Debug, Deserialize)]
struct UpstreamProduct {
    name: String,
    brand: UpstreamBrand,
    #[serde(default)]
    term: u16,
    #[serde(default)]
    rate_type: Option<String>,
    #[serde(default)]
    percent_green: f64,
    #[serde(default)]
    is_pre_pay: bool,
    #[serde(default)]
    is_time_of_use: bool,
    #[serde(default)]
    early_termination_fee: f64,
    #[serde(default)]
    deposit_required: bool,
}

#[derive(Debug, Deserialize)]
struct UpstreamBrand {
    name: String,
    #[serde(default)]
    puct_number: Option<String>,
    #[serde(default)]
    logo_url: Option<String>,
    #[serde(default)]
    rating: Option<f32>,
}

/// One EFL price point; `price` is dollars per kWh.
#[derive(Debug, Deserialize)]
struct UpstreamPrice {
    usage: u32,
    price: f64,
    #[serde(default = "default_valid")]
    valid: bool,
}

fn default_valid() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct UpstreamDocument {
    #[serde(rename = "type")]
    kind: String,
    link: String,
}

fn price_cents(prices: &[UpstreamPrice], usage: u32) -> Option<f64> {
    prices
        .iter()
        .find(|p| p.usage == usage && p.valid)
        .map(|p| (p.price * 10_000.0).round() / 100.0)
}

/// Maps one upstream record, or `None` when it cannot be shown.
fn to_plan(raw: UpstreamPlan, requested: TdspCode) -> Option<Plan> {
    let prices = PricePoints {
        kwh500: price_cents(&raw.expected_prices, 500)?,
        kwh1000: price_cents(&raw.expected_prices, 1000)?,
        kwh2000: price_cents(&raw.expected_prices, 2000)?,
    };
    if !prices.is_valid() {
        return None;
    }

    let tdsp = raw
        .tdsp_duns
        .as_deref()
        .and_then(tdsp::from_duns)
        .unwrap_or(requested);
    if tdsp != requested {
        return None;
    }

    let product = raw.product;
    let rate_type = match product.rate_type.as_deref() {
        Some(value) => RateType::parse(value)?,
        None => RateType::Fixed,
    };

    let mut documents = PlanDocuments::default();
    for doc in raw.document_links {
        match doc.kind.to_ascii_lowercase().as_str() {
            "efl" => documents.efl_url = Some(doc.link),
            "tos" => documents.tos_url = Some(doc.link),
            "yrac" => documents.yrac_url = Some(doc.link),
            _ => {}
        }
    }

    Some(Plan {
        id: raw.id,
        name: product.name.trim().to_string(),
        provider: Provider {
            slug: slug(&product.brand.name),
            name: product.brand.name,
            puct_number: product.brand.puct_number,
            logo_url: product.brand.logo_url,
            rating: product.brand.rating,
        },
        tdsp,
        term_months: product.term,
        rate_type,
        prices,
        base_charge_dollars: raw.base_charge.unwrap_or(0.0),
        percent_green: product.percent_green.clamp(0.0, 100.0).round() as u8,
        early_termination_fee: product.early_termination_fee.max(0.0),
        deposit_required: product.deposit_required,
        prepaid: product.is_pre_pay,
        time_of_use: product.is_time_of_use,
        documents,
        enroll_url: raw.enroll_url,
    })
}

/// Client for the retail pricing API.
pub struct PricingClient {
    client: Client,
    endpoint: String,
    policy: RetryPolicy,
}

impl PricingClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(SERVICE, config)?,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            policy: RetryPolicy::from_config(config),
        })
    }
}

#[async_trait]
impl PlanSource for PricingClient {
    async fn fetch_plans(&self, tdsp: TdspCode, params: &[(String, String)]) -> Result<Vec<Plan>> {
        let url = format!("{}/plans", self.endpoint);
        tracing::debug!("📡 Fetching plans for {} from {}", tdsp, url);

        let response =
            send_with_retry(SERVICE, self.policy, || self.client.get(&url).query(params)).await?;
        let raw: Vec<serde_json::Value> = response.json().await?;
        let received = raw.len();

        let plans: Vec<Plan> = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<UpstreamPlan>(value) {
                Ok(plan) => {
                    let id = plan.id.clone();
                    let mapped = to_plan(plan, tdsp);
                    if mapped.is_none() {
                        tracing::debug!("Dropping plan {}: incomplete pricing or wrong TDSP", id);
                    }
                    mapped
                }
                Err(e) => {
                    tracing::debug!("Dropping malformed plan record: {}", e);
                    None
                }
            })
            .collect();

        if plans.len() < received {
            tracing::warn!(
                "⚠️ Dropped {} of {} upstream plans for {}",
                received - plans.len(),
                received,
                tdsp
            );
        }
        tracing::info!("✅ {} plans available for {}", plans.len(), tdsp);
        Ok(plans)
    }
}
