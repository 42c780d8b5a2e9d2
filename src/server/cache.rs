use crate::core::facets::PlanFilters;
use crate::domain::model::{Plan, TdspCode};
use crate::domain::ports::PlanSource;
use crate::utils::error::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "cache",
            CacheStatus::Miss => "live",
        }
    }
}

struct Entry {
    fetched_at: Instant,
    plans: Arc<Vec<Plan>>,
}

/// Upstream plan lists, one per TDSP, fetched unfiltered at the default
/// usage and filtered locally per request. A zero TTL disables caching.
pub struct PlanCache {
    ttl: Duration,
    entries: RwLock<HashMap<TdspCode, Entry>>,
}

impl PlanCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    async fn fresh(&self, tdsp: TdspCode) -> Option<Arc<Vec<Plan>>> {
        let entries = self.entries.read().await;
        entries
            .get(&tdsp)
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
            .map(|e| Arc::clone(&e.plans))
    }

    pub async fn get_or_fetch(
        &self,
        tdsp: TdspCode,
        source: &dyn PlanSource,
    ) -> Result<(Arc<Vec<Plan>>, CacheStatus)> {
        if let Some(plans) = self.fresh(tdsp).await {
            tracing::debug!("Plan cache hit for {}", tdsp);
            return Ok((plans, CacheStatus::Hit));
        }

        let params = PlanFilters::default().to_upstream_params(tdsp);
        let plans = Arc::new(source.fetch_plans(tdsp, &params).await?);
        if !self.ttl.is_zero() {
            self.entries.write().await.insert(
                tdsp,
                Entry {
                    fetched_at: Instant::now(),
                    plans: Arc::clone(&plans),
                },
            );
        }
        Ok((plans, CacheStatus::Miss))
    }

    pub async fn invalidate(&self, tdsp: TdspCode) {
        self.entries.write().await.remove(&tdsp);
    }
}
