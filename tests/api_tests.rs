use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use httpmock::prelude::*;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use txpower::config::{AppConfig, UpstreamConfig};
use txpower::domain::model::{
    EsiidRecord, Plan, PlanDocuments, PricePoints, Provider, RateType, TdspCode,
};
use txpower::domain::ports::{EsiidLookup, PlanSource};
use txpower::utils::error::{AppError, Result};
use txpower::{build_router, AppState, PricingClient, TerritoryClient, ZipMapper};

struct FakePlans {
    calls: AtomicUsize,
}

fn plan(id: &str, provider: &str, cents: f64, term: u16) -> Plan {
    Plan {
        id: id.to_string(),
        name: format!("{} {}", provider, term),
        provider: Provider {
            name: provider.to_string(),
            slug: provider.to_lowercase().replace(' ', "-"),
            puct_number: None,
            logo_url: None,
            rating: None,
        },
        tdsp: TdspCode::Oncor,
        term_months: term,
        rate_type: RateType::Fixed,
        prices: PricePoints {
            kwh500: cents + 2.0,
            kwh1000: cents,
            kwh2000: cents - 1.0,
        },
        base_charge_dollars: 0.0,
        percent_green: 0,
        early_termination_fee: 150.0,
        deposit_required: false,
        prepaid: false,
        time_of_use: false,
        documents: PlanDocuments::default(),
        enroll_url: None,
    }
}

#[async_trait]
impl PlanSource for FakePlans {
    async fn fetch_plans(&self, tdsp: TdspCode, _params: &[(String, String)]) -> Result<Vec<Plan>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if tdsp != TdspCode::Oncor {
            return Err(AppError::upstream("Pricing API", Some(503), "unavailable"));
        }
        Ok(vec![
            plan("p1", "Gexa Energy", 14.2, 12),
            plan("p2", "Reliant", 12.9, 24),
        ])
    }
}

struct FakeEsiid;

#[async_trait]
impl EsiidLookup for FakeEsiid {
    async fn lookup(&self, address: &str, zip: &str) -> Result<Vec<EsiidRecord>> {
        Ok(vec![EsiidRecord {
            esiid: "10443720000000001".to_string(),
            address: address.to_uppercase(),
            city: Some("DALLAS".to_string()),
            zip: zip.to_string(),
            tdsp: Some(TdspCode::Oncor),
            premise_type: Some("Residential".to_string()),
            status: Some("Active".to_string()),
        }])
    }
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.rate_limit.enabled = false;
    config.server.cors_origins = vec!["https://txpower.example".to_string()];
    config
}

fn fake_state() -> Arc<AppState> {
    Arc::new(
        AppState::new(test_config(), ZipMapper::builtin())
            .with_plan_source(Arc::new(FakePlans {
                calls: AtomicUsize::new(0),
            }))
            .with_esiid(Arc::new(FakeEsiid)),
    )
}

async fn get(state: Arc<AppState>, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    build_router(state).oneshot(request).await.unwrap()
}

async fn post_json(state: Arc<AppState>, uri: &str, body: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    build_router(state).oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_envelope() {
    let response = get(fake_state(), "/api/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["pricing_configured"], true);
    assert_eq!(json["data"]["territory_configured"], false);
    assert!(json["meta"]["timestamp"].is_string());
    assert!(json["meta"]["request_id"].as_str().unwrap().starts_with("req-"));
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let request = Request::builder()
        .uri("/api/tdsp")
        .header("x-request-id", "client-42")
        .body(Body::empty())
        .unwrap();
    let response = build_router(fake_state()).oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "client-42");

    let json = json_body(response).await;
    assert_eq!(json["meta"]["request_id"], "client-42");
    assert_eq!(json["data"].as_array().unwrap().len(), TdspCode::all().len());
}

#[tokio::test]
async fn test_invalid_request_id_is_replaced() {
    let request = Request::builder()
        .uri("/api/tdsp")
        .header("x-request-id", "bad id with spaces")
        .body(Body::empty())
        .unwrap();
    let response = build_router(fake_state()).oneshot(request).await.unwrap();
    let id = response.headers()["x-request-id"].to_str().unwrap().to_string();
    assert!(id.starts_with("req-"));
}

#[tokio::test]
async fn test_security_headers_carry_nonce() {
    let response = get(fake_state(), "/api/health").await;
    let headers = response.headers();

    let nonce = headers["x-csp-nonce"].to_str().unwrap();
    assert_eq!(nonce.len(), 24);
    let csp = headers["content-security-policy"].to_str().unwrap();
    assert!(csp.contains(&format!("'nonce-{}'", nonce)));
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers.get("strict-transport-security").is_none());
}

#[tokio::test]
async fn test_unknown_route_is_enveloped_404() {
    let response = get(fake_state(), "/api/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = json_body(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn test_rate_limit_returns_429_with_retry_after() {
    let mut config = test_config();
    config.rate_limit.enabled = true;
    config.rate_limit.capacity = 2;
    config.rate_limit.refill_per_sec = 0.1;
    let state = Arc::new(AppState::new(config, ZipMapper::builtin()));
    let router = build_router(state);

    let call = |uri: &str| {
        Request::builder()
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .unwrap()
    };

    for _ in 0..2 {
        let response = router.clone().oneshot(call("/api/tdsp")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let limited = router.clone().oneshot(call("/api/tdsp")).await.unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = limited.headers()["retry-after"].to_str().unwrap().parse().unwrap();
    assert!(retry_after >= 1);
    assert_eq!(json_body(limited).await["error"]["code"], "RATE_LIMITED");

    let health = router.oneshot(call("/api/health")).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_oversized_uri_rejected() {
    let uri = format!("/api/search?q={}", "a".repeat(3000));
    let response = get(fake_state(), &uri).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["field"], "uri");
}

#[tokio::test]
async fn test_cors_preflight_for_allowed_origin() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/plans/list")
        .header("origin", "https://txpower.example")
        .header("access-control-request-method", "GET")
        .body(Body::empty())
        .unwrap();
    let response = build_router(fake_state()).oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "https://txpower.example"
    );
}

#[tokio::test]
async fn test_zip_validate_redirects_deregulated_zip() {
    let response = get(fake_state(), "/api/zip/validate?zip=75201").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["data"]["tdsp"], "oncor");
    assert_eq!(json["data"]["deregulated"], true);
    assert_eq!(json["data"]["requires_address"], false);
    assert_eq!(json["data"]["redirect_url"], "/electricity-plans/dallas-tx");
}

#[tokio::test]
async fn test_zip_validate_regulated_and_out_of_state() {
    let json = json_body(get(fake_state(), "/api/zip/validate?zip=78701").await).await;
    assert_eq!(json["data"]["deregulated"], false);
    assert_eq!(json["data"]["utility"], "Austin Energy");
    assert!(json["data"].get("redirect_url").is_none());

    let response = post_json(fake_state(), "/api/zip/validate", r#"{"zip":"10001"}"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "NOT_TEXAS");
}

#[tokio::test]
async fn test_zip_validate_rejects_malformed_body() {
    let response = post_json(fake_state(), "/api/zip/validate", "{not json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
    assert_eq!(json["error"]["field"], "body");
}

#[tokio::test]
async fn test_plans_list_from_source() {
    let response = get(fake_state(), "/api/plans/list?zip=75201&sort=price_asc").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["meta"]["source"], "live");
    assert_eq!(json["meta"]["tdsp"], "oncor");
    assert_eq!(json["meta"]["usage_kwh"], 1000);
    assert_eq!(json["data"]["total"], 2);
    assert!(json["data"].get("estimate").is_none());
}

#[tokio::test]
async fn test_plans_list_falls_back_to_estimate() {
    let response = get(fake_state(), "/api/plans/list?tdsp=centerpoint&usage=2000").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["meta"]["source"], "fallback");
    assert_eq!(json["data"]["total"], 0);
    assert!(json["data"]["estimate"].is_object());
}

#[tokio::test]
async fn test_plans_list_rejects_regulated_zip() {
    let response = get(fake_state(), "/api/plans/list?zip=78701").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["field"], "zip");

    let response = get(fake_state(), "/api/plans/list").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_plans_list_caches_pricing_api() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/plans").query_param("tdsp_duns", "1039940674000");
        then.status(200).json_body(json!([{
            "_id": "live-1",
            "product": {
                "name": "Live Saver 12",
                "brand": {"name": "Gexa Energy"},
                "term": 12,
                "rate_type": "fixed",
                "percent_green": 0
            },
            "expected_prices": [
                {"usage": 500, "price": 0.16},
                {"usage": 1000, "price": 0.14},
                {"usage": 2000, "price": 0.13}
            ],
            "tdsp_duns": "1039940674000"
        }]));
    });

    let upstream = UpstreamConfig {
        retry_attempts: 0,
        retry_delay_ms: 1,
        cache_ttl_seconds: 300,
        ..UpstreamConfig::with_endpoint(server.base_url())
    };
    let mut config = test_config();
    config.pricing = Some(upstream.clone());
    let state = Arc::new(
        AppState::new(config, ZipMapper::builtin())
            .with_plan_source(Arc::new(PricingClient::new(&upstream).unwrap())),
    );

    let first = json_body(get(state.clone(), "/api/plans/list?tdsp=oncor").await).await;
    assert_eq!(first["meta"]["source"], "live");
    assert_eq!(first["data"]["plans"][0]["id"], "live-1");

    let second = json_body(get(state, "/api/plans/list?tdsp=oncor&term=12").await).await;
    assert_eq!(second["meta"]["source"], "cache");
    assert_eq!(second["data"]["total"], 1);
    mock.assert_hits(1);
}

#[tokio::test]
async fn test_plans_facets_resolves_city() {
    let json = json_body(
        get(
            fake_state(),
            "/api/plans/facets?path=/electricity-plans/dallas-tx/green-energy/12-month",
        )
        .await,
    )
    .await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["city"]["slug"], "dallas-tx");
    assert_eq!(json["data"]["needs_redirect"], true);
    assert_eq!(
        json["data"]["canonical_path"],
        "/electricity-plans/dallas-tx/12-month/green-energy"
    );

    let response = get(fake_state(), "/api/plans/facets?path=/electricity-plans/austin-tx").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(
        fake_state(),
        "/api/plans/facets?path=/electricity-plans/dallas-tx/solar-panels",
    )
    .await;
    assert_eq!(json_body(response).await["error"]["code"], "UNKNOWN_FILTER");
}

#[tokio::test]
async fn test_search_and_autocomplete() {
    let json = json_body(get(fake_state(), "/api/search?q=Dallas").await).await;
    assert_eq!(json["success"], true);
    assert!(json["meta"]["count"].as_u64().unwrap() > 0);

    let response = get(fake_state(), "/api/search").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["field"], "q");

    let response = get(fake_state(), "/api/autocomplete?q=Hou&limit=999").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deregulated_areas_filter() {
    let json = json_body(get(fake_state(), "/api/deregulated-areas?tdsp=oncor").await).await;
    let groups = json["data"].as_array().unwrap();
    assert_eq!(groups.len(), 1);

    let response = get(fake_state(), "/api/deregulated-areas?tdsp=nowhere").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_esiid_lookup() {
    let response = post_json(
        fake_state(),
        "/api/esiid/lookup",
        r#"{"address":"123 Main St","zip":"75201"}"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["count"], 1);
    assert_eq!(json["data"]["candidates"][0]["tdsp"], "oncor");
}

#[tokio::test]
async fn test_esiid_lookup_without_client_is_503() {
    let state = Arc::new(AppState::new(test_config(), ZipMapper::builtin()));
    let response = post_json(
        state,
        "/api/esiid/lookup",
        r#"{"address":"123 Main St","zip":"75201"}"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["error"]["code"], "SERVICE_NOT_CONFIGURED");
}

fn territory_state(server: &MockServer) -> Arc<AppState> {
    let upstream = UpstreamConfig {
        retry_attempts: 0,
        retry_delay_ms: 1,
        ..UpstreamConfig::with_endpoint(server.base_url())
    };
    Arc::new(
        AppState::new(test_config(), ZipMapper::builtin())
            .with_territory(Arc::new(TerritoryClient::new(&upstream).unwrap())),
    )
}

#[tokio::test]
async fn test_zip_validate_verifies_weak_mapping() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/territory")
            .query_param("zip", "75802")
            .query_param("tdsp", "oncor");
        then.status(200).json_body(json!({"in_territory": true}));
    });

    let json = json_body(get(territory_state(&server), "/api/zip/validate?zip=75802").await).await;
    mock.assert();
    assert_eq!(json["data"]["source"], "verified");
    assert_eq!(json["data"]["confidence"], 95);
    assert_eq!(json["data"]["tdsp"], "oncor");

    // strong static mappings are not sent upstream
    let json = json_body(get(territory_state(&server), "/api/zip/validate?zip=75201").await).await;
    assert_eq!(json["data"]["source"], "static");
    mock.assert_hits(1);
}

#[tokio::test]
async fn test_zip_validate_keeps_mapping_when_territory_api_fails() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/territory");
        then.status(503);
    });

    let response = get(territory_state(&server), "/api/zip/validate?zip=75802").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    mock.assert();
    assert_eq!(json["data"]["source"], "inferred");
    assert_eq!(json["data"]["confidence"], 75);
    assert_eq!(json["data"]["tdsp"], "oncor");
}

#[tokio::test]
async fn test_hsts_header_when_enabled() {
    let mut config = test_config();
    config.security.hsts = true;
    config.security.hsts_max_age_secs = 86_400;
    let state = Arc::new(AppState::new(config, ZipMapper::builtin()));

    let response = get(state, "/api/health").await;
    assert_eq!(
        response.headers()["strict-transport-security"],
        "max-age=86400; includeSubDomains"
    );
}
