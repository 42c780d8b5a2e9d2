//! Faceted listing URLs such as `/electricity-plans/dallas-tx/12-month/fixed-rate`
//! and the query-string filters behind them.

use crate::core::tdsp;
use crate::domain::model::{RateType, TdspCode};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::validate_limit;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

pub const LISTING_ROOT: &str = "/electricity-plans";
pub const MAX_INDEXABLE_FACETS: usize = 3;
pub const DEFAULT_USAGE_KWH: u32 = 1000;
pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;
const MAX_TERM_MONTHS: u16 = 60;

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    PriceAsc,
    PriceDesc,
    Term,
    Green,
    Provider,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "price_asc" | "price_low" | "cheapest" | "price" => Some(SortOrder::PriceAsc),
            "price_desc" | "price_high" => Some(SortOrder::PriceDesc),
            "term" | "contract" => Some(SortOrder::Term),
            "green" | "renewable" => Some(SortOrder::Green),
            "provider" | "name" => Some(SortOrder::Provider),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Facet {
    Term(u16),
    Rate(RateType),
    Green,
    Prepaid,
    NoDeposit,
    TimeOfUse,
    Cheapest,
}

impl Facet {
    fn rank(&self) -> u8 {
        match self {
            Facet::Term(_) => 0,
            Facet::Rate(_) => 1,
            Facet::Green => 2,
            Facet::Prepaid => 3,
            Facet::NoDeposit => 4,
            Facet::TimeOfUse => 5,
            Facet::Cheapest => 6,
        }
    }

    pub fn parse(segment: &str) -> Result<Self> {
        let facet = match segment {
            "month-to-month" => Facet::Term(0),
            "fixed-rate" => Facet::Rate(RateType::Fixed),
            "variable-rate" => Facet::Rate(RateType::Variable),
            "indexed-rate" => Facet::Rate(RateType::Indexed),
            "green-energy" => Facet::Green,
            "prepaid" => Facet::Prepaid,
            "no-deposit" => Facet::NoDeposit,
            "time-of-use" => Facet::TimeOfUse,
            "cheapest" => Facet::Cheapest,
            other => {
                let months = other
                    .strip_suffix("-month")
                    .and_then(|n| n.parse::<u16>().ok())
                    .filter(|n| (1..=MAX_TERM_MONTHS).contains(n))
                    .ok_or_else(|| AppError::UnknownFacet {
                        segment: other.to_string(),
                    })?;
                Facet::Term(months)
            }
        };
        Ok(facet)
    }

    pub fn segment(&self) -> String {
        match self {
            Facet::Term(0) => "month-to-month".to_string(),
            Facet::Term(n) => format!("{}-month", n),
            Facet::Rate(rate) => format!("{}-rate", rate.as_str()),
            Facet::Green => "green-energy".to_string(),
            Facet::Prepaid => "prepaid".to_string(),
            Facet::NoDeposit => "no-deposit".to_string(),
            Facet::TimeOfUse => "time-of-use".to_string(),
            Facet::Cheapest => "cheapest".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanFilters {
    pub term_months: Option<u16>,
    pub rate_type: Option<RateType>,
    pub min_green: Option<u8>,
    pub provider: Option<String>,
    pub prepaid: Option<bool>,
    pub no_deposit: bool,
    pub time_of_use: Option<bool>,
    pub max_rate_cents: Option<f64>,
    pub usage_kwh: u32,
    pub sort: Option<SortOrder>,
    pub page: usize,
    pub limit: usize,
}

impl Default for PlanFilters {
    fn default() -> Self {
        Self {
            term_months: None,
            rate_type: None,
            min_green: None,
            provider: None,
            prepaid: None,
            no_deposit: false,
            time_of_use: None,
            max_rate_cents: None,
            usage_kwh: DEFAULT_USAGE_KWH,
            sort: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FacetRoute {
    pub city_slug: String,
    pub facets: Vec<Facet>,
    pub filters: PlanFilters,
    pub canonical_path: String,
    pub needs_redirect: bool,
    pub indexable: bool,
}

fn parse_bool(field: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(AppError::validation(field, "must be true or false")),
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| AppError::validation(field, "must be a number"))
}

impl PlanFilters {
    fn apply_facet(&mut self, facet: Facet) -> Result<()> {
        let conflict = |what: &str| AppError::FacetConflict {
            message: format!("Only one {} filter can be selected.", what),
        };
        match facet {
            Facet::Term(months) => {
                if self.term_months.is_some() {
                    return Err(conflict("contract length"));
                }
                self.term_months = Some(months);
            }
            Facet::Rate(rate) => {
                if self.rate_type.is_some() {
                    return Err(conflict("rate type"));
                }
                self.rate_type = Some(rate);
            }
            Facet::Green => self.min_green = Some(100),
            Facet::Prepaid => self.prepaid = Some(true),
            Facet::NoDeposit => self.no_deposit = true,
            Facet::TimeOfUse => self.time_of_use = Some(true),
            Facet::Cheapest => self.sort = Some(SortOrder::PriceAsc),
        }
        Ok(())
    }

    /// Query-string filters (`?term=12&rate_type=fixed&green=50&page=2`).
    /// Keys this type does not own, such as `zip`, are ignored.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self> {
        let mut filters = PlanFilters::default();

        for (key, raw) in params {
            let value = raw.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "term" => {
                    let months = match value {
                        "month-to-month" | "mtm" => 0,
                        _ => parse_number::<u16>("term", value)?,
                    };
                    if months > MAX_TERM_MONTHS {
                        return Err(AppError::validation(
                            "term",
                            format!("must be at most {} months", MAX_TERM_MONTHS),
                        ));
                    }
                    filters.term_months = Some(months);
                }
                "rate_type" => {
                    filters.rate_type = Some(RateType::parse(value).ok_or_else(|| {
                        AppError::validation("rate_type", "must be fixed, variable or indexed")
                    })?);
                }
                "green" => {
                    let pct = parse_number::<u8>("green", value)?;
                    if pct > 100 {
                        return Err(AppError::validation("green", "must be between 0 and 100"));
                    }
                    filters.min_green = Some(pct);
                }
                "provider" => {
                    let slug = value.to_ascii_lowercase();
                    if !SLUG_RE.is_match(&slug) {
                        return Err(AppError::validation("provider", "must be a provider slug"));
                    }
                    filters.provider = Some(slug);
                }
                "prepaid" => filters.prepaid = Some(parse_bool("prepaid", value)?),
                "no_deposit" => filters.no_deposit = parse_bool("no_deposit", value)?,
                "time_of_use" => filters.time_of_use = Some(parse_bool("time_of_use", value)?),
                "max_rate" => {
                    let rate = parse_number::<f64>("max_rate", value)?;
                    if !rate.is_finite() || rate <= 0.0 {
                        return Err(AppError::validation("max_rate", "must be a positive number"));
                    }
                    filters.max_rate_cents = Some(rate);
                }
                "usage" => {
                    let usage = parse_number::<u32>("usage", value)?;
                    if !(100..=5000).contains(&usage) {
                        return Err(AppError::validation("usage", "must be between 100 and 5000 kWh"));
                    }
                    filters.usage_kwh = usage;
                }
                "sort" => {
                    filters.sort = Some(SortOrder::parse(value).ok_or_else(|| {
                        AppError::validation("sort", "must be price_asc, price_desc, term, green or provider")
                    })?);
                }
                "page" => {
                    let page = parse_number::<usize>("page", value)?;
                    if page == 0 {
                        return Err(AppError::validation("page", "must be at least 1"));
                    }
                    filters.page = page;
                }
                "limit" => {
                    filters.limit = validate_limit(
                        "limit",
                        Some(parse_number::<usize>("limit", value)?),
                        DEFAULT_PAGE_SIZE,
                        MAX_PAGE_SIZE,
                    )?;
                }
                _ => {}
            }
        }

        Ok(filters)
    }

    /// Facets these filters can be expressed with, in canonical order.
    pub fn facets(&self) -> Vec<Facet> {
        let mut facets = Vec::new();
        if let Some(term) = self.term_months {
            facets.push(Facet::Term(term));
        }
        if let Some(rate) = self.rate_type {
            facets.push(Facet::Rate(rate));
        }
        if self.min_green.is_some_and(|g| g >= 100) {
            facets.push(Facet::Green);
        }
        if self.prepaid == Some(true) {
            facets.push(Facet::Prepaid);
        }
        if self.no_deposit {
            facets.push(Facet::NoDeposit);
        }
        if self.time_of_use == Some(true) {
            facets.push(Facet::TimeOfUse);
        }
        if self.sort == Some(SortOrder::PriceAsc) {
            facets.push(Facet::Cheapest);
        }
        facets
    }

    pub fn to_path(&self, city_slug: &str) -> String {
        let mut path = format!("{}/{}", LISTING_ROOT, city_slug);
        for facet in self.facets() {
            path.push('/');
            path.push_str(&facet.segment());
        }
        path
    }

    /// Query parameters for the upstream pricing API.
    pub fn to_upstream_params(&self, code: TdspCode) -> Vec<(String, String)> {
        let mut params = Vec::new();
        match tdsp::info(code).duns {
            Some(duns) => params.push(("tdsp_duns".to_string(), duns.to_string())),
            None => params.push(("tdsp".to_string(), code.to_string())),
        }
        params.push(("display_usage".to_string(), self.usage_kwh.to_string()));
        if let Some(term) = self.term_months {
            params.push(("term".to_string(), term.to_string()));
        }
        if let Some(rate) = self.rate_type {
            params.push(("rate_type".to_string(), rate.as_str().to_string()));
        }
        if let Some(green) = self.min_green {
            params.push(("percent_green".to_string(), green.to_string()));
        }
        if let Some(prepaid) = self.prepaid {
            params.push(("is_pre_pay".to_string(), prepaid.to_string()));
        }
        if let Some(tou) = self.time_of_use {
            params.push(("is_time_of_use".to_string(), tou.to_string()));
        }
        params
    }
}

/// Resolves a listing path into filters. Segment order does not matter for
/// the result; a non-canonical spelling is flagged for a redirect.
pub fn parse_facet_path(path: &str) -> Result<FacetRoute> {
    let without_query = path.split(['?', '#']).next().unwrap_or_default();
    let lowered = without_query.to_ascii_lowercase();
    let rest = lowered
        .strip_prefix(LISTING_ROOT)
        .and_then(|r| r.strip_prefix('/'))
        .ok_or_else(|| AppError::NotFound {
            message: format!("'{}' is not a plan listing path", without_query),
        })?;

    let mut segments = rest.split('/').filter(|s| !s.is_empty());
    let city_slug = segments
        .next()
        .ok_or_else(|| AppError::validation("path", "missing city"))?
        .to_string();
    if !SLUG_RE.is_match(&city_slug) {
        return Err(AppError::validation("path", "city must be a lowercase slug"));
    }

    let mut facets: Vec<Facet> = Vec::new();
    let mut filters = PlanFilters::default();
    for segment in segments {
        let facet = Facet::parse(segment)?;
        if facets.contains(&facet) {
            return Err(AppError::FacetConflict {
                message: format!("'{}' appears more than once.", segment),
            });
        }
        filters.apply_facet(facet)?;
        facets.push(facet);
    }

    let mut ordered = facets.clone();
    ordered.sort_by_key(Facet::rank);
    let canonical_path = filters.to_path(&city_slug);
    let needs_redirect = ordered != facets || canonical_path != without_query.trim_end_matches('/');

    Ok(FacetRoute {
        indexable: ordered.len() <= MAX_INDEXABLE_FACETS,
        city_slug,
        facets: ordered,
        filters,
        canonical_path,
        needs_redirect,
    })
}
