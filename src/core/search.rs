use crate::core::facets::LISTING_ROOT;
use crate::core::tdsp;
use crate::core::zip_mapper::ZipMapper;
use crate::domain::model::{City, TdspCode, ZipCodeMapping};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::sanitize_query;
use serde::Serialize;

pub const MAX_QUERY_LEN: usize = 100;
pub const DEFAULT_SUGGESTIONS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Zip,
    City,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub kind: ResultKind,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_slug: Option<String>,
    pub tdsp: Option<TdspCode>,
    pub deregulated: bool,
    /// Listing page, only for places with retail choice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub kind: ResultKind,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AreaCity {
    pub name: String,
    pub slug: String,
    pub zip_count: usize,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AreaGroup {
    pub tdsp: TdspCode,
    pub name: &'static str,
    pub zip_count: usize,
    pub cities: Vec<AreaCity>,
}

/// Read-only view over the mapper's cities and ZIPs, built once at startup.
pub struct SearchIndex {
    cities: Vec<City>,
    zips: Vec<ZipCodeMapping>,
}

fn listing_url(slug: &str) -> String {
    format!("{}/{}", LISTING_ROOT, slug)
}

fn city_result(city: &City) -> SearchResult {
    SearchResult {
        kind: ResultKind::City,
        label: format!("{}, TX", city.name),
        zip: None,
        city_slug: Some(city.slug.clone()),
        tdsp: city.tdsp,
        deregulated: city.deregulated,
        url: city.deregulated.then(|| listing_url(&city.slug)),
    }
}

fn zip_result(mapping: &ZipCodeMapping) -> SearchResult {
    let label = match &mapping.city {
        Some(city) => format!("{} ({}, TX)", mapping.zip, city),
        None => mapping.zip.clone(),
    };
    SearchResult {
        kind: ResultKind::Zip,
        label,
        zip: Some(mapping.zip.clone()),
        city_slug: mapping.city_slug.clone(),
        tdsp: mapping.tdsp,
        deregulated: mapping.deregulated,
        url: mapping
            .city_slug
            .as_deref()
            .filter(|_| mapping.deregulated)
            .map(listing_url),
    }
}

/// `75201` or `75201-1234`.
fn is_zip_query(query: &str) -> bool {
    let digits = |part: &str, len: usize| part.len() == len && part.bytes().all(|b| b.is_ascii_digit());
    match query.split_once('-') {
        Some((zip, plus4)) => digits(zip, 5) && digits(plus4, 4),
        None => digits(query, 5),
    }
}

impl SearchIndex {
    pub fn build(mapper: &ZipMapper) -> Self {
        Self {
            cities: mapper.cities(),
            zips: mapper.entries(),
        }
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn city_by_slug(&self, slug: &str) -> Option<&City> {
        self.cities.iter().find(|c| c.slug == slug)
    }

    /// Cities whose name starts with the query rank ahead of those merely
    /// containing it; ties are alphabetical.
    fn match_cities(&self, needle: &str) -> Vec<&City> {
        let needle = needle.to_lowercase();
        let mut hits: Vec<(bool, &City)> = self
            .cities
            .iter()
            .filter_map(|c| {
                let name = c.name.to_lowercase();
                if name.starts_with(&needle) {
                    Some((false, c))
                } else if name.contains(&needle) || c.slug.contains(&needle.replace(' ', "-")) {
                    Some((true, c))
                } else {
                    None
                }
            })
            .collect();
        hits.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));
        hits.into_iter().map(|(_, c)| c).collect()
    }

    pub fn search(&self, mapper: &ZipMapper, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let query = sanitize_query("q", query, MAX_QUERY_LEN)?;
        let digits_only = query.bytes().all(|b| b.is_ascii_digit());

        if is_zip_query(&query) {
            return match mapper.resolve(&query) {
                Ok(mapping) => Ok(vec![zip_result(&mapping)]),
                Err(AppError::NotTexas { zip }) => {
                    tracing::debug!("Search for out-of-state ZIP {}", zip);
                    Ok(Vec::new())
                }
                Err(e) => Err(e),
            };
        }

        if digits_only {
            // 1-2 digits or more than 5 cannot narrow to a ZIP
            if !(3..5).contains(&query.len()) {
                return Ok(Vec::new());
            }
            return Ok(self
                .zips
                .iter()
                .filter(|m| m.zip.starts_with(&query))
                .take(limit)
                .map(zip_result)
                .collect());
        }

        Ok(self
            .match_cities(&query)
            .into_iter()
            .take(limit)
            .map(city_result)
            .collect())
    }

    pub fn autocomplete(&self, prefix: &str, limit: usize) -> Result<Vec<Suggestion>> {
        let prefix = sanitize_query("q", prefix, MAX_QUERY_LEN)?;

        if prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(self
                .zips
                .iter()
                .filter(|m| m.zip.starts_with(&prefix))
                .take(limit)
                .map(|m| Suggestion {
                    kind: ResultKind::Zip,
                    label: zip_result(m).label,
                    value: m.zip.clone(),
                })
                .collect());
        }

        let lowered = prefix.to_lowercase();
        Ok(self
            .cities
            .iter()
            .filter(|c| c.name.to_lowercase().starts_with(&lowered))
            .take(limit)
            .map(|c| Suggestion {
                kind: ResultKind::City,
                label: format!("{}, TX", c.name),
                value: c.slug.clone(),
            })
            .collect())
    }

    /// Deregulated cities grouped by wires utility, in registry order.
    pub fn deregulated_areas(&self, filter: Option<TdspCode>) -> Vec<AreaGroup> {
        TdspCode::all()
            .iter()
            .filter(|code| filter.is_none_or(|f| f == **code))
            .map(|code| {
                let cities: Vec<AreaCity> = self
                    .cities
                    .iter()
                    .filter(|c| c.deregulated && c.tdsp == Some(*code))
                    .map(|c| AreaCity {
                        name: c.name.clone(),
                        slug: c.slug.clone(),
                        zip_count: c.zips.len(),
                        url: listing_url(&c.slug),
                    })
                    .collect();
                AreaGroup {
                    tdsp: *code,
                    name: tdsp::info(*code).name,
                    zip_count: cities.iter().map(|c| c.zip_count).sum(),
                    cities,
                }
            })
            .collect()
    }
}
