use crate::core::facets::{PlanFilters, SortOrder};
use crate::domain::model::{Plan, PricePoints};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

const MIN_PRICE_CENTS: f64 = 0.1;

#[derive(Debug, Clone, Serialize)]
pub struct PricedPlan {
    #[serde(flatten)]
    pub plan: Plan,
    pub usage_kwh: u32,
    pub rate_at_usage_cents: f64,
    pub estimated_monthly_bill: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanPage {
    pub plans: Vec<PricedPlan>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct FacetCounts {
    pub terms: BTreeMap<u16, usize>,
    pub rate_types: BTreeMap<String, usize>,
    pub providers: BTreeMap<String, usize>,
    pub green: usize,
    pub prepaid: usize,
    pub time_of_use: usize,
    pub no_deposit: usize,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Price in cents/kWh at an arbitrary usage, interpolated linearly between
/// the EFL price points and extrapolated from the nearest segment outside them.
pub fn price_at(prices: &PricePoints, usage_kwh: u32) -> f64 {
    let usage = usage_kwh as f64;
    let (x0, y0, x1, y1) = if usage <= 1000.0 {
        (500.0, prices.kwh500, 1000.0, prices.kwh1000)
    } else {
        (1000.0, prices.kwh1000, 2000.0, prices.kwh2000)
    };
    let price = y0 + (usage - x0) * (y1 - y0) / (x1 - x0);
    price.max(MIN_PRICE_CENTS)
}

pub fn estimated_monthly_bill(plan: &Plan, usage_kwh: u32) -> f64 {
    round2(price_at(&plan.prices, usage_kwh) * usage_kwh as f64 / 100.0)
}

pub fn matches(plan: &Plan, filters: &PlanFilters) -> bool {
    if filters.term_months.is_some_and(|t| plan.term_months != t) {
        return false;
    }
    if filters.rate_type.is_some_and(|r| plan.rate_type != r) {
        return false;
    }
    if filters.min_green.is_some_and(|g| plan.percent_green < g) {
        return false;
    }
    if filters
        .provider
        .as_deref()
        .is_some_and(|p| plan.provider.slug != p)
    {
        return false;
    }
    if filters.prepaid.is_some_and(|p| plan.prepaid != p) {
        return false;
    }
    if filters.no_deposit && plan.deposit_required {
        return false;
    }
    if filters.time_of_use.is_some_and(|t| plan.time_of_use != t) {
        return false;
    }
    if filters
        .max_rate_cents
        .is_some_and(|max| price_at(&plan.prices, filters.usage_kwh) > max)
    {
        return false;
    }
    true
}

fn compare(a: &PricedPlan, b: &PricedPlan, sort: SortOrder) -> Ordering {
    let by_price = || {
        a.rate_at_usage_cents
            .partial_cmp(&b.rate_at_usage_cents)
            .unwrap_or(Ordering::Equal)
    };
    let primary = match sort {
        SortOrder::PriceAsc => by_price(),
        SortOrder::PriceDesc => by_price().reverse(),
        SortOrder::Term => a.plan.term_months.cmp(&b.plan.term_months).then_with(by_price),
        SortOrder::Green => b
            .plan
            .percent_green
            .cmp(&a.plan.percent_green)
            .then_with(by_price),
        SortOrder::Provider => a
            .plan
            .provider
            .name
            .to_ascii_lowercase()
            .cmp(&b.plan.provider.name.to_ascii_lowercase())
            .then_with(by_price),
    };
    primary.then_with(|| a.plan.id.cmp(&b.plan.id))
}

/// Filters, prices, sorts and paginates. `total` counts matches before paging;
/// a page past the end is empty rather than an error.
pub fn apply(plans: &[Plan], filters: &PlanFilters) -> PlanPage {
    let usage = filters.usage_kwh;
    let mut priced: Vec<PricedPlan> = plans
        .iter()
        .filter(|p| matches(p, filters))
        .map(|p| PricedPlan {
            plan: p.clone(),
            usage_kwh: usage,
            rate_at_usage_cents: round2(price_at(&p.prices, usage)),
            estimated_monthly_bill: estimated_monthly_bill(p, usage),
        })
        .collect();

    let sort = filters.sort.unwrap_or(SortOrder::PriceAsc);
    priced.sort_by(|a, b| compare(a, b, sort));

    let total = priced.len();
    let limit = filters.limit.max(1);
    let total_pages = total.div_ceil(limit);
    let plans = priced
        .into_iter()
        .skip((filters.page.max(1) - 1) * limit)
        .take(limit)
        .collect();

    PlanPage {
        plans,
        total,
        page: filters.page.max(1),
        limit,
        total_pages,
    }
}

pub fn facet_counts(plans: &[Plan]) -> FacetCounts {
    let mut counts = FacetCounts::default();
    for plan in plans {
        *counts.terms.entry(plan.term_months).or_insert(0) += 1;
        *counts
            .rate_types
            .entry(plan.rate_type.as_str().to_string())
            .or_insert(0) += 1;
        *counts.providers.entry(plan.provider.slug.clone()).or_insert(0) += 1;
        if plan.percent_green >= 100 {
            counts.green += 1;
        }
        if plan.prepaid {
            counts.prepaid += 1;
        }
        if plan.time_of_use {
            counts.time_of_use += 1;
        }
        if !plan.deposit_required {
            counts.no_deposit += 1;
        }
    }
    counts
}
