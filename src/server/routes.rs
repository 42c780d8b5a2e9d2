use crate::core::facets::{parse_facet_path, FacetRoute, PlanFilters, LISTING_ROOT};
use crate::core::plan_filter::{self, FacetCounts, PlanPage};
use crate::core::search::{AreaGroup, SearchResult, Suggestion, DEFAULT_SUGGESTIONS};
use crate::core::tdsp;
use crate::core::zip_mapper::validate_zip;
use crate::domain::model::{City, EsiidRecord, RateEstimate, TdspCode, TdspInfo, ZipCodeMapping};
use crate::server::response::{respond, Meta, RequestId};
use crate::server::state::AppState;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{sanitize_address, validate_limit};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

type Params = Query<HashMap<String, String>>;

const DEFAULT_SEARCH_LIMIT: usize = 10;
const MAX_SEARCH_LIMIT: usize = 50;
const MAX_SUGGESTIONS: usize = 20;

fn required<'a>(params: &'a HashMap<String, String>, field: &str) -> Result<&'a str> {
    params
        .get(field)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(field, "is required"))
}

fn limit_param(params: &HashMap<String, String>, default: usize, max: usize) -> Result<usize> {
    let raw = match params.get("limit").map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(value) => Some(
            value
                .parse::<usize>()
                .map_err(|_| AppError::validation("limit", "must be a number"))?,
        ),
        None => None,
    };
    validate_limit("limit", raw, default, max)
}

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::validation("body", rejection.body_text()))
}

#[derive(Debug, Serialize)]
pub struct Health {
    status: &'static str,
    version: &'static str,
    uptime_secs: u64,
    zip_entries: usize,
    cities: usize,
    pricing_configured: bool,
    territory_configured: bool,
    esiid_configured: bool,
}

pub async fn health(State(state): State<Arc<AppState>>, rid: RequestId) -> Response {
    let health = Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        zip_entries: state.mapper.len(),
        cities: state.index.cities().len(),
        pricing_configured: state.plans.is_some(),
        territory_configured: state.territory.is_some(),
        esiid_configured: state.esiid.is_some(),
    };
    respond(Ok(health), Meta::new(&rid))
}

pub async fn search(State(state): State<Arc<AppState>>, rid: RequestId, Query(params): Params) -> Response {
    let result = (|| -> Result<Vec<SearchResult>> {
        let q = required(&params, "q")?;
        let limit = limit_param(&params, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT)?;
        state.index.search(&state.mapper, q, limit)
    })();
    let count = result.as_ref().map(Vec::len).unwrap_or(0);
    respond(result, Meta::new(&rid).with("count", count))
}

pub async fn autocomplete(State(state): State<Arc<AppState>>, rid: RequestId, Query(params): Params) -> Response {
    let result = (|| -> Result<Vec<Suggestion>> {
        let q = required(&params, "q")?;
        let limit = limit_param(&params, DEFAULT_SUGGESTIONS, MAX_SUGGESTIONS)?;
        state.index.autocomplete(q, limit)
    })();
    respond(result, Meta::new(&rid))
}

#[derive(Debug, Deserialize)]
pub struct ZipRequest {
    zip: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ZipValidation {
    #[serde(flatten)]
    mapping: ZipCodeMapping,
    requires_address: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tdsp_name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_url: Option<String>,
    message: String,
}

async fn validate_zip_for(state: &AppState, zip: Option<&str>) -> Result<ZipValidation> {
    let zip = zip
        .map(str::trim)
        .filter(|z| !z.is_empty())
        .ok_or_else(|| AppError::validation("zip", "is required"))?;
    let mut mapping = state.mapper.resolve(zip)?;
    if let Some(territory) = &state.territory {
        mapping = state.mapper.verify(mapping, territory.as_ref()).await;
    }

    let requires_address = mapping.requires_address();
    let redirect_url = match (&mapping.city_slug, mapping.deregulated, requires_address) {
        (Some(slug), true, false) => Some(format!("{}/{}", LISTING_ROOT, slug)),
        _ => None,
    };
    let message = match (&mapping.tdsp, &mapping.utility) {
        _ if requires_address => {
            "This ZIP code is served by more than one utility. Enter your address to continue.".to_string()
        }
        (Some(code), _) if mapping.deregulated => {
            format!("Retail choice is available. Lines are maintained by {}.", tdsp::info(*code).name)
        }
        (_, Some(utility)) => {
            format!("This area is served by {}, which does not offer retail choice.", utility)
        }
        _ => "We could not determine the utility for this ZIP code.".to_string(),
    };

    Ok(ZipValidation {
        tdsp_name: mapping.tdsp.map(|c| tdsp::info(c).name),
        requires_address,
        redirect_url,
        message,
        mapping,
    })
}

pub async fn zip_validate_get(State(state): State<Arc<AppState>>, rid: RequestId, Query(params): Params) -> Response {
    let result = validate_zip_for(&state, params.get("zip").map(String::as_str)).await;
    respond(result, Meta::new(&rid))
}

pub async fn zip_validate_post(
    State(state): State<Arc<AppState>>,
    rid: RequestId,
    payload: std::result::Result<Json<ZipRequest>, JsonRejection>,
) -> Response {
    let result = match body(payload) {
        Ok(request) => validate_zip_for(&state, request.zip.as_deref()).await,
        Err(e) => Err(e),
    };
    respond(result, Meta::new(&rid))
}

#[derive(Debug, Serialize)]
pub struct PlanList {
    tdsp: TdspCode,
    #[serde(flatten)]
    page: PlanPage,
    facets: FacetCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    estimate: Option<RateEstimate>,
}

fn empty_page(filters: &PlanFilters) -> PlanPage {
    PlanPage {
        plans: Vec::new(),
        total: 0,
        page: filters.page,
        limit: filters.limit,
        total_pages: 0,
    }
}

/// ZIP wins over an explicit `tdsp` when both are given.
fn target_tdsp(state: &AppState, params: &HashMap<String, String>) -> Result<(TdspCode, Option<ZipCodeMapping>)> {
    if let Some(zip) = params.get("zip").map(|z| z.trim()).filter(|z| !z.is_empty()) {
        let mapping = state.mapper.resolve(zip)?;
        return match (mapping.tdsp, mapping.deregulated) {
            (Some(code), true) => Ok((code, Some(mapping))),
            _ => Err(AppError::validation(
                "zip",
                match &mapping.utility {
                    Some(utility) => format!("{} is served by {} and has no retail choice", mapping.zip, utility),
                    None => format!("no competitive utility is known for {}", mapping.zip),
                },
            )),
        };
    }
    let code = required(params, "tdsp")
        .map_err(|_| AppError::validation("zip", "zip or tdsp is required"))?
        .parse::<TdspCode>()?;
    Ok((code, None))
}

pub async fn plans_list(State(state): State<Arc<AppState>>, rid: RequestId, Query(params): Params) -> Response {
    let mut meta = Meta::new(&rid);
    let (code, mapping, filters) = match target_tdsp(&state, &params)
        .and_then(|(code, mapping)| Ok((code, mapping, PlanFilters::from_query(&params)?)))
    {
        Ok(target) => target,
        Err(e) => return respond::<()>(Err(e), meta),
    };
    meta = meta
        .with("tdsp", code)
        .with("usage_kwh", filters.usage_kwh)
        .with(
            "requires_address",
            mapping.as_ref().is_some_and(ZipCodeMapping::requires_address),
        );

    let fetched = match &state.plans {
        Some(source) => state
            .plan_cache
            .get_or_fetch(code, source.as_ref())
            .await
            .map_err(|e| {
                tracing::warn!("⚠️ Pricing API unavailable for {}, serving estimate: {}", code, e);
            })
            .ok(),
        None => None,
    };

    let list = match fetched {
        Some((plans, status)) => {
            meta = meta.with("source", status.as_str());
            PlanList {
                tdsp: code,
                page: plan_filter::apply(&plans, &filters),
                facets: plan_filter::facet_counts(&plans),
                estimate: None,
            }
        }
        None => {
            meta = meta.with("source", "fallback");
            PlanList {
                tdsp: code,
                page: empty_page(&filters),
                facets: FacetCounts::default(),
                estimate: Some(tdsp::fallback_estimate(code, filters.usage_kwh)),
            }
        }
    };
    respond(Ok(list), meta)
}

#[derive(Debug, Serialize)]
pub struct FacetResolution {
    city: City,
    #[serde(flatten)]
    route: FacetRoute,
}

pub async fn plans_facets(State(state): State<Arc<AppState>>, rid: RequestId, Query(params): Params) -> Response {
    let result = (|| -> Result<FacetResolution> {
        let route = parse_facet_path(required(&params, "path")?)?;
        let city = state
            .index
            .city_by_slug(&route.city_slug)
            .filter(|c| c.deregulated)
            .cloned()
            .ok_or_else(|| AppError::NotFound {
                message: format!("No plan listings for '{}'", route.city_slug),
            })?;
        Ok(FacetResolution { city, route })
    })();
    respond(result, Meta::new(&rid))
}

pub async fn deregulated_areas(State(state): State<Arc<AppState>>, rid: RequestId, Query(params): Params) -> Response {
    let result = (|| -> Result<Vec<AreaGroup>> {
        let filter = match params.get("tdsp").map(|t| t.trim()).filter(|t| !t.is_empty()) {
            Some(value) => Some(value.parse::<TdspCode>()?),
            None => None,
        };
        Ok(state.index.deregulated_areas(filter))
    })();
    respond(result, Meta::new(&rid))
}

#[derive(Debug, Deserialize)]
pub struct EsiidRequest {
    address: Option<String>,
    zip: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EsiidMatches {
    zip: String,
    count: usize,
    candidates: Vec<EsiidRecord>,
}

async fn lookup_esiid(state: &AppState, request: EsiidRequest) -> Result<EsiidMatches> {
    let address = sanitize_address(request.address.as_deref().unwrap_or_default())?;
    let zip = validate_zip(
        request
            .zip
            .as_deref()
            .ok_or_else(|| AppError::validation("zip", "is required"))?,
    )?;
    let client = state.esiid.as_ref().ok_or_else(|| AppError::NotConfigured {
        service: "ESIID lookup".to_string(),
    })?;
    let candidates = client.lookup(&address, &zip).await?;
    Ok(EsiidMatches {
        zip,
        count: candidates.len(),
        candidates,
    })
}

pub async fn esiid_lookup(
    State(state): State<Arc<AppState>>,
    rid: RequestId,
    payload: std::result::Result<Json<EsiidRequest>, JsonRejection>,
) -> Response {
    let result = match body(payload) {
        Ok(request) => lookup_esiid(&state, request).await,
        Err(e) => Err(e),
    };
    respond(result, Meta::new(&rid))
}

pub async fn tdsp_registry(rid: RequestId) -> Response {
    let registry: &[TdspInfo] = tdsp::registry();
    respond(Ok(registry), Meta::new(&rid))
}

pub async fn not_found(rid: RequestId, uri: axum::http::Uri) -> Response {
    respond::<()>(
        Err(AppError::NotFound {
            message: format!("No route for {}", uri.path()),
        }),
        Meta::new(&rid),
    )
}
