use crate::adapters::{EsiidClient, LocalStorage, PricingClient, TerritoryClient};
use crate::config::AppConfig;
use crate::core::search::SearchIndex;
use crate::core::ZipMapper;
use crate::domain::ports::{EsiidLookup, PlanSource, Storage, TerritoryLookup};
use crate::server::cache::PlanCache;
use crate::server::rate_limiter::RateLimiter;
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Instant;

/// Everything the handlers share. Clients are optional; a missing pricing
/// client means plan lists always fall back to estimates.
pub struct AppState {
    pub config: AppConfig,
    pub mapper: ZipMapper,
    pub index: SearchIndex,
    pub plans: Option<Arc<dyn PlanSource>>,
    pub territory: Option<Arc<dyn TerritoryLookup>>,
    pub esiid: Option<Arc<dyn EsiidLookup>>,
    pub plan_cache: PlanCache,
    pub rate_limiter: RateLimiter,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, mapper: ZipMapper) -> Self {
        let ttl = config
            .pricing
            .as_ref()
            .map(|p| p.cache_ttl())
            .unwrap_or_default();
        Self {
            index: SearchIndex::build(&mapper),
            plan_cache: PlanCache::new(ttl),
            rate_limiter: RateLimiter::new(&config.rate_limit),
            config,
            mapper,
            plans: None,
            territory: None,
            esiid: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_plan_source(mut self, source: Arc<dyn PlanSource>) -> Self {
        self.plans = Some(source);
        self
    }

    pub fn with_territory(mut self, lookup: Arc<dyn TerritoryLookup>) -> Self {
        self.territory = Some(lookup);
        self
    }

    pub fn with_esiid(mut self, lookup: Arc<dyn EsiidLookup>) -> Self {
        self.esiid = Some(lookup);
        self
    }

    /// Builds the mapper (with overrides) and the configured upstream clients.
    pub async fn from_config(config: AppConfig) -> Result<Arc<Self>> {
        let mut mapper = ZipMapper::with_settings(config.data.mapper_settings());
        if let Some(path) = &config.data.overrides_path {
            let data = LocalStorage::new(".").read_file(path).await?;
            let applied = mapper.load_overrides_csv(&data)?;
            tracing::info!("🔧 Applied {} ZIP overrides from {}", applied, path);
        }
        tracing::info!("🗺️ ZIP table ready with {} entries", mapper.len());

        let pricing = config.pricing.clone();
        let territory = config.territory.clone();
        let esiid = config.esiid.clone();
        let mut state = AppState::new(config, mapper);

        match pricing {
            Some(cfg) => {
                tracing::info!("📡 Pricing API: {}", cfg.endpoint);
                state = state.with_plan_source(Arc::new(PricingClient::new(&cfg)?));
            }
            None => tracing::warn!("⚠️ No pricing API configured; plan lists will use estimates"),
        }
        if let Some(cfg) = territory {
            tracing::info!("📡 Territory API: {}", cfg.endpoint);
            state = state.with_territory(Arc::new(TerritoryClient::new(&cfg)?));
        }
        if let Some(cfg) = esiid {
            tracing::info!("📡 ESIID API: {}", cfg.endpoint);
            state = state.with_esiid(Arc::new(EsiidClient::new(&cfg)?));
        }

        Ok(Arc::new(state))
    }
}
