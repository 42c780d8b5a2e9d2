//! ZIP code to utility territory resolution.
//!
//! Lookup order: runtime overrides and the built-in table (exact ZIPs), then
//! numeric range rules (narrowest first), then nearest-neighbour inference
//! over known ZIPs sharing the 3-digit prefix, then the county default of the
//! nearest neighbour. Each step reports a lower confidence than the one before.

use crate::core::zip_data::{
    Area, COUNTY_DEFAULTS, RANGE_RULES, SPLIT_CONFIDENCE, SPLIT_ZIPS, STATIC_CONFIDENCE,
    STATIC_ZIPS,
};
use crate::domain::model::{City, MappingSource, TdspCode, ZipCodeMapping};
use crate::domain::ports::TerritoryLookup;
use crate::utils::error::{AppError, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_NEIGHBOR_WINDOW: u32 = 15;
pub const DEFAULT_VERIFY_BELOW: u8 = 80;

const INFERRED_CAP: f64 = 75.0;
const INFERENCE_DISCOUNT: f64 = 0.8;
const MIN_AGREEMENT: f64 = 0.6;
const COUNTY_CONFIDENCE: u8 = 55;
const VERIFIED_CONFIDENCE: u8 = 95;
const REJECTED_CONFIDENCE_CAP: u8 = 40;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Territory {
    Tdsp(TdspCode),
    Utility(String),
}

impl From<Area> for Territory {
    fn from(area: Area) -> Self {
        match area {
            Area::Tdsp(code) => Territory::Tdsp(code),
            Area::Utility(name) => Territory::Utility(name.to_string()),
        }
    }
}

impl Territory {
    fn sort_key(&self) -> String {
        match self {
            Territory::Tdsp(code) => format!("0{}", code),
            Territory::Utility(name) => format!("1{}", name),
        }
    }
}

#[derive(Debug, Clone)]
struct KnownZip {
    territory: Territory,
    city: Option<String>,
    county: Option<String>,
    confidence: u8,
    source: MappingSource,
    alternates: Vec<TdspCode>,
}

/// One row of an override CSV: `zip,tdsp,utility,city,county,confidence`.
/// `tdsp` may be blank when `utility` names a non-competitive provider.
#[derive(Debug, Clone, Deserialize)]
pub struct OverrideRow {
    pub zip: String,
    #[serde(default)]
    pub tdsp: Option<String>,
    #[serde(default)]
    pub utility: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub confidence: Option<u8>,
}

#[derive(Debug, Clone, Copy)]
pub struct MapperSettings {
    pub neighbor_window: u32,
    pub verify_below: u8,
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self {
            neighbor_window: DEFAULT_NEIGHBOR_WINDOW,
            verify_below: DEFAULT_VERIFY_BELOW,
        }
    }
}

pub struct ZipMapper {
    known: BTreeMap<u32, KnownZip>,
    ranges: Vec<(u32, u32, Territory, u8)>,
    county_defaults: HashMap<String, Territory>,
    settings: MapperSettings,
}

/// Accepts `75201`, ` 75201 ` and ZIP+4 (`75201-1234`); returns the 5-digit ZIP.
pub fn validate_zip(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let candidate = match trimmed.split_once('-') {
        Some((zip, plus4)) if plus4.len() == 4 && plus4.bytes().all(|b| b.is_ascii_digit()) => zip,
        Some(_) => {
            return Err(AppError::InvalidZip {
                value: trimmed.to_string(),
                reason: "ZIP+4 suffix must be 4 digits".to_string(),
            })
        }
        None => trimmed,
    };

    if candidate.len() != 5 || !candidate.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::InvalidZip {
            value: trimmed.to_string(),
            reason: "must be exactly 5 digits".to_string(),
        });
    }
    Ok(candidate.to_string())
}

pub fn is_texas(zip: u32) -> bool {
    matches!(zip, 75000..=79999 | 88500..=88599)
}

/// `"Gexa Energy"` -> `"gexa-energy"`.
pub fn slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c != '\'' {
            pending_dash = true;
        }
    }
    slug
}

/// `"Fort Worth"` -> `"fort-worth-tx"`.
pub fn slugify(city: &str) -> String {
    let base = slug(city);
    if base.ends_with("-tx") {
        base
    } else {
        format!("{}-tx", base)
    }
}

fn zip_number(zip: &str) -> Result<u32> {
    zip.parse::<u32>().map_err(|_| AppError::InvalidZip {
        value: zip.to_string(),
        reason: "not numeric".to_string(),
    })
}

fn build_mapping(
    zip: &str,
    territory: &Territory,
    city: Option<String>,
    county: Option<String>,
    confidence: u8,
    source: MappingSource,
    alternates: Vec<TdspCode>,
) -> ZipCodeMapping {
    let (tdsp, utility) = match territory {
        Territory::Tdsp(code) => (Some(*code), None),
        Territory::Utility(name) => (None, Some(name.clone())),
    };
    ZipCodeMapping {
        zip: zip.to_string(),
        tdsp,
        city_slug: city.as_deref().map(slugify),
        city,
        county,
        confidence: confidence.min(100),
        source,
        deregulated: tdsp.is_some(),
        alternates,
        utility,
    }
}

impl ZipMapper {
    pub fn builtin() -> Self {
        Self::with_settings(MapperSettings::default())
    }

    pub fn with_settings(settings: MapperSettings) -> Self {
        let splits: HashMap<&str, &[TdspCode]> = SPLIT_ZIPS.iter().copied().collect();

        let mut known = BTreeMap::new();
        for (zip, area, city, county) in STATIC_ZIPS {
            let Ok(number) = zip.parse::<u32>() else {
                continue;
            };
            let alternates = splits.get(zip).map(|a| a.to_vec()).unwrap_or_default();
            let confidence = if alternates.is_empty() {
                STATIC_CONFIDENCE
            } else {
                SPLIT_CONFIDENCE
            };
            known.insert(
                number,
                KnownZip {
                    territory: Territory::from(*area),
                    city: Some(city.to_string()),
                    county: Some(county.to_string()),
                    confidence,
                    source: MappingSource::Static,
                    alternates,
                },
            );
        }

        let mut ranges: Vec<(u32, u32, Territory, u8)> = RANGE_RULES
            .iter()
            .map(|(lo, hi, area, conf)| (*lo, *hi, Territory::from(*area), *conf))
            .collect();
        // narrowest rule wins when ranges nest
        ranges.sort_by_key(|(lo, hi, _, _)| (hi - lo, *lo));

        let county_defaults = COUNTY_DEFAULTS
            .iter()
            .map(|(county, area)| (county.to_ascii_lowercase(), Territory::from(*area)))
            .collect();

        Self {
            known,
            ranges,
            county_defaults,
            settings,
        }
    }

    pub fn settings(&self) -> MapperSettings {
        self.settings
    }

    /// Number of exact (static + override) entries.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    pub fn apply_overrides(&mut self, rows: Vec<OverrideRow>) -> Result<usize> {
        let mut applied = 0;
        for row in rows {
            let zip = validate_zip(&row.zip)?;
            let territory = match (row.tdsp.as_deref().map(str::trim), row.utility.as_deref().map(str::trim)) {
                (Some(tdsp), _) if !tdsp.is_empty() => Territory::Tdsp(tdsp.parse()?),
                (_, Some(utility)) if !utility.is_empty() => Territory::Utility(utility.to_string()),
                _ => {
                    return Err(AppError::ProcessingError {
                        message: format!("override for {} names neither a tdsp nor a utility", zip),
                    })
                }
            };
            let number = zip_number(&zip)?;
            let existing = self.known.get(&number);
            let entry = KnownZip {
                territory,
                city: row
                    .city
                    .filter(|c| !c.trim().is_empty())
                    .or_else(|| existing.and_then(|e| e.city.clone())),
                county: row
                    .county
                    .filter(|c| !c.trim().is_empty())
                    .or_else(|| existing.and_then(|e| e.county.clone())),
                confidence: row.confidence.unwrap_or(100).min(100),
                source: MappingSource::Override,
                alternates: Vec::new(),
            };
            tracing::debug!("Override applied for {}: {:?}", zip, entry.territory);
            self.known.insert(number, entry);
            applied += 1;
        }
        Ok(applied)
    }

    pub fn load_overrides_csv(&mut self, data: &[u8]) -> Result<usize> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(data);
        let rows = reader
            .deserialize::<OverrideRow>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.apply_overrides(rows)
    }

    pub fn resolve(&self, input: &str) -> Result<ZipCodeMapping> {
        let zip = validate_zip(input)?;
        let number = zip_number(&zip)?;

        if let Some(entry) = self.known.get(&number) {
            return Ok(build_mapping(
                &zip,
                &entry.territory,
                entry.city.clone(),
                entry.county.clone(),
                entry.confidence,
                entry.source,
                entry.alternates.clone(),
            ));
        }
        if !is_texas(number) {
            return Err(AppError::NotTexas { zip });
        }

        if let Some((_, _, territory, confidence)) = self
            .ranges
            .iter()
            .find(|(lo, hi, _, _)| (*lo..=*hi).contains(&number))
        {
            // borrow city/county from the closest known ZIP in the same territory
            let nearest = self
                .nearest_known(number)
                .filter(|k| &k.territory == territory);
            return Ok(build_mapping(
                &zip,
                territory,
                nearest.and_then(|k| k.city.clone()),
                nearest.and_then(|k| k.county.clone()),
                *confidence,
                MappingSource::Range,
                Vec::new(),
            ));
        }

        if let Some(mapping) = self.infer(&zip, number) {
            return Ok(mapping);
        }

        tracing::debug!("No territory signal for ZIP {}", zip);
        Ok(ZipCodeMapping {
            zip,
            tdsp: None,
            city: None,
            city_slug: None,
            county: None,
            confidence: 0,
            source: MappingSource::Unknown,
            deregulated: false,
            alternates: Vec::new(),
            utility: None,
        })
    }

    fn neighbors(&self, number: u32) -> Vec<(u32, &KnownZip)> {
        let window = self.settings.neighbor_window;
        let prefix = number / 100;
        self.known
            .range(number.saturating_sub(window)..=number.saturating_add(window))
            .filter(|(z, _)| **z / 100 == prefix && **z != number)
            .map(|(z, k)| (z.abs_diff(number), k))
            .collect()
    }

    fn nearest_known(&self, number: u32) -> Option<&KnownZip> {
        self.neighbors(number)
            .into_iter()
            .min_by_key(|(dist, _)| *dist)
            .map(|(_, k)| k)
    }

    fn infer(&self, zip: &str, number: u32) -> Option<ZipCodeMapping> {
        let neighbors = self.neighbors(number);
        let (nearest_dist, nearest) = neighbors.iter().min_by_key(|(d, _)| *d).copied()?;

        let mut votes: HashMap<&Territory, f64> = HashMap::new();
        for (dist, known) in &neighbors {
            *votes.entry(&known.territory).or_insert(0.0) += 1.0 / (1.0 + *dist as f64);
        }
        let total: f64 = votes.values().sum();
        let mut ranked: Vec<(&Territory, f64)> = votes.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.sort_key().cmp(&b.0.sort_key()))
        });
        let (winner, weight) = ranked[0];
        let agreement = weight / total;

        let inferred = || {
            let winners: Vec<&(u32, &KnownZip)> =
                neighbors.iter().filter(|(_, k)| &k.territory == winner).collect();
            let mean_conf =
                winners.iter().map(|(_, k)| k.confidence as f64).sum::<f64>() / winners.len() as f64;
            let mean_dist =
                winners.iter().map(|(d, _)| *d as f64).sum::<f64>() / winners.len() as f64;
            let confidence = ((mean_conf * agreement * INFERENCE_DISCOUNT).min(INFERRED_CAP)
                - (mean_dist / 5.0).floor())
            .clamp(0.0, INFERRED_CAP);
            let closest = winners
                .iter()
                .min_by_key(|(d, _)| *d)
                .map(|(_, k)| *k)
                .unwrap_or(nearest);
            tracing::debug!(
                "Inferred {} for {} from {} neighbours (agreement {:.2})",
                winner.sort_key(),
                zip,
                neighbors.len(),
                agreement
            );
            build_mapping(
                zip,
                winner,
                closest.city.clone(),
                closest.county.clone(),
                confidence as u8,
                MappingSource::Inferred,
                Vec::new(),
            )
        };

        if neighbors.len() >= 2 && agreement >= MIN_AGREEMENT {
            return Some(inferred());
        }

        // weak or single-neighbour signal: only a county default may answer
        let territory = nearest
            .county
            .as_ref()
            .and_then(|c| self.county_defaults.get(&c.to_ascii_lowercase()))?;
        tracing::debug!(
            "Using county default for {} (nearest neighbour {} away, agreement {:.2})",
            zip,
            nearest_dist,
            agreement
        );
        Some(build_mapping(
            zip,
            territory,
            nearest.city.clone(),
            nearest.county.clone(),
            COUNTY_CONFIDENCE,
            MappingSource::County,
            Vec::new(),
        ))
    }

    /// Confirms a weak mapping against the utility's own territory service.
    /// Upstream errors leave the mapping untouched.
    pub async fn verify(
        &self,
        mapping: ZipCodeMapping,
        lookup: &dyn TerritoryLookup,
    ) -> ZipCodeMapping {
        let Some(tdsp) = mapping.tdsp else {
            return mapping;
        };
        if mapping.confidence >= self.settings.verify_below {
            return mapping;
        }

        match lookup.in_territory(&mapping.zip, tdsp).await {
            Ok(true) => ZipCodeMapping {
                confidence: VERIFIED_CONFIDENCE,
                source: MappingSource::Verified,
                ..mapping
            },
            Ok(false) => {
                tracing::info!("⚠️ {} rejected ZIP {} as outside its territory", tdsp, mapping.zip);
                ZipCodeMapping {
                    confidence: mapping.confidence.min(REJECTED_CONFIDENCE_CAP),
                    ..mapping
                }
            }
            Err(e) => {
                tracing::warn!("Territory verification for {} failed: {}", mapping.zip, e);
                mapping
            }
        }
    }

    /// Every exact entry as a mapping, in ZIP order.
    pub fn entries(&self) -> Vec<ZipCodeMapping> {
        self.known
            .iter()
            .map(|(number, k)| {
                build_mapping(
                    &format!("{:05}", number),
                    &k.territory,
                    k.city.clone(),
                    k.county.clone(),
                    k.confidence,
                    k.source,
                    k.alternates.clone(),
                )
            })
            .collect()
    }

    /// Cities aggregated from the exact entries, sorted by name.
    pub fn cities(&self) -> Vec<City> {
        let mut grouped: BTreeMap<String, Vec<ZipCodeMapping>> = BTreeMap::new();
        for mapping in self.entries() {
            if let Some(city) = mapping.city.clone() {
                grouped.entry(city).or_default().push(mapping);
            }
        }

        grouped
            .into_iter()
            .map(|(name, mappings)| {
                let mut tdsp_counts: BTreeMap<TdspCode, usize> = BTreeMap::new();
                for code in mappings.iter().filter_map(|m| m.tdsp) {
                    *tdsp_counts.entry(code).or_insert(0) += 1;
                }
                let regulated = mappings.iter().filter(|m| m.tdsp.is_none()).count();
                let tdsp = tdsp_counts
                    .iter()
                    .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
                    .filter(|(_, count)| **count >= regulated)
                    .map(|(code, _)| *code);

                City {
                    slug: slugify(&name),
                    county: mappings.iter().find_map(|m| m.county.clone()),
                    tdsp,
                    zips: mappings.iter().map(|m| m.zip.clone()).collect(),
                    deregulated: tdsp.is_some(),
                    name,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedTerritory(std::result::Result<bool, ()>);

    #[async_trait]
    impl TerritoryLookup for FixedTerritory {
        async fn in_territory(&self, _zip: &str, _tdsp: TdspCode) -> Result<bool> {
            self.0
                .map_err(|_| AppError::upstream("territory", Some(503), "unavailable"))
        }
    }

    #[test]
    fn test_validate_zip_formats() {
        assert_eq!(validate_zip("75201").unwrap(), "75201");
        assert_eq!(validate_zip("75201-1234").unwrap(), "75201");
        assert_eq!(validate_zip(" 77002 ").unwrap(), "77002");
        assert!(validate_zip("7520").is_err());
        assert!(validate_zip("abcde").is_err());
        assert!(validate_zip("752011").is_err());
        assert!(validate_zip("75201-12").is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slug("Gexa Energy"), "gexa-energy");
        assert_eq!(slug("4Change  Energy!"), "4change-energy");
        assert_eq!(slugify("Fort Worth"), "fort-worth-tx");
        assert_eq!(slugify("Lubbock"), "lubbock-tx");
        assert_eq!(slugify("O'Donnell"), "odonnell-tx");
        assert_eq!(slugify("  The  Woodlands "), "the-woodlands-tx");
    }

    #[test]
    fn test_known_zips_map_to_expected_utilities() {
        let mapper = ZipMapper::builtin();
        let cases = [
            ("75201", TdspCode::Oncor),
            ("77002", TdspCode::Centerpoint),
            ("78401", TdspCode::AepCentral),
            ("79601", TdspCode::AepNorth),
            ("77590", TdspCode::Tnmp),
            ("79401", TdspCode::Lpl),
        ];
        for (zip, expected) in cases {
            let mapping = mapper.resolve(zip).unwrap();
            assert_eq!(mapping.tdsp, Some(expected), "zip {}", zip);
            assert_eq!(mapping.source, MappingSource::Static);
            assert!(mapping.deregulated);
        }
    }

    #[test]
    fn test_regulated_and_out_of_state_zips() {
        let mapper = ZipMapper::builtin();

        let austin = mapper.resolve("78701").unwrap();
        assert!(!austin.deregulated);
        assert_eq!(austin.tdsp, None);
        assert_eq!(austin.utility.as_deref(), Some("Austin Energy"));

        assert!(matches!(
            mapper.resolve("10001"),
            Err(AppError::NotTexas { .. })
        ));
    }

    #[test]
    fn test_range_rule_prefers_narrowest() {
        let mapper = ZipMapper::builtin();

        let dallas = mapper.resolve("75287").unwrap();
        assert_eq!(dallas.tdsp, Some(TdspCode::Oncor));
        assert_eq!(dallas.source, MappingSource::Range);
        assert_eq!(dallas.confidence, 90);

        // 77563-77592 (TNMP) nests inside 77500-77599 (CenterPoint)
        let hitchcock = mapper.resolve("77563").unwrap();
        assert_eq!(hitchcock.tdsp, Some(TdspCode::Tnmp));
    }

    #[test]
    fn test_split_zip_requires_address() {
        let mapper = ZipMapper::builtin();
        let mapping = mapper.resolve("77573").unwrap();
        assert!(mapping.requires_address());
        assert_eq!(mapping.confidence, SPLIT_CONFIDENCE);
        assert_eq!(mapping.alternates, vec![TdspCode::Tnmp, TdspCode::Centerpoint]);
    }

    #[test]
    fn test_nearest_neighbour_inference() {
        let mapper = ZipMapper::builtin();
        let mapping = mapper.resolve("75802").unwrap();
        assert_eq!(mapping.source, MappingSource::Inferred);
        assert_eq!(mapping.tdsp, Some(TdspCode::Oncor));
        assert_eq!(mapping.confidence, 75);
        assert_eq!(mapping.city.as_deref(), Some("Palestine"));
        assert_eq!(mapping.city_slug.as_deref(), Some("palestine-tx"));
    }

    #[test]
    fn test_county_default_when_neighbours_disagree() {
        let mut mapper = ZipMapper::builtin();
        mapper
            .load_overrides_csv(
                b"zip,tdsp,utility,city,county,confidence\n\
                  76610,oncor,,Waco,McLennan,90\n\
                  76614,tnmp,,Waco,McLennan,90\n",
            )
            .unwrap();

        let mapping = mapper.resolve("76612").unwrap();
        assert_eq!(mapping.source, MappingSource::County);
        assert_eq!(mapping.tdsp, Some(TdspCode::Oncor));
        assert_eq!(mapping.confidence, COUNTY_CONFIDENCE);
    }

    #[test]
    fn test_weak_agreement_without_county_default_is_unknown() {
        let mut mapper = ZipMapper::builtin();
        mapper
            .load_overrides_csv(
                b"zip,tdsp,utility,city,county,confidence\n\
                  75910,oncor,,Lufkin,Nowhere,90\n\
                  75914,centerpoint,,Lufkin,Nowhere,90\n\
                  75916,tnmp,,Lufkin,Nowhere,90\n",
            )
            .unwrap();

        let mapping = mapper.resolve("75912").unwrap();
        assert_eq!(mapping.source, MappingSource::Unknown);
        assert_eq!(mapping.tdsp, None);
        assert_eq!(mapping.confidence, 0);
    }

    #[test]
    fn test_single_neighbour_falls_back_to_county() {
        let mut mapper = ZipMapper::builtin();
        mapper
            .load_overrides_csv(b"zip,tdsp,utility,city,county,confidence\n76630,oncor,,Waco,McLennan,90\n")
            .unwrap();

        let mapping = mapper.resolve("76633").unwrap();
        assert_eq!(mapping.source, MappingSource::County);
        assert_eq!(mapping.tdsp, Some(TdspCode::Oncor));
        assert_eq!(mapping.confidence, COUNTY_CONFIDENCE);

        let mut mapper = ZipMapper::builtin();
        mapper
            .load_overrides_csv(b"zip,tdsp,utility,city,county,confidence\n76630,oncor,,Waco,Nowhere,90\n")
            .unwrap();
        assert_eq!(mapper.resolve("76633").unwrap().source, MappingSource::Unknown);
    }

    #[test]
    fn test_override_outside_texas_window_takes_effect() {
        let mut mapper = ZipMapper::builtin();
        assert!(matches!(mapper.resolve("73301"), Err(AppError::NotTexas { .. })));

        mapper
            .load_overrides_csv(b"zip,tdsp,utility,city,county,confidence\n73301,,Austin Energy,Austin,Travis,90\n")
            .unwrap();
        let mapping = mapper.resolve("73301").unwrap();
        assert_eq!(mapping.source, MappingSource::Override);
        assert_eq!(mapping.utility.as_deref(), Some("Austin Energy"));
        assert!(!mapping.deregulated);
        assert!(matches!(mapper.resolve("73302"), Err(AppError::NotTexas { .. })));
    }

    #[test]
    fn test_unknown_texas_zip_has_zero_confidence() {
        let mapper = ZipMapper::builtin();
        let mapping = mapper.resolve("79250").unwrap();
        assert_eq!(mapping.source, MappingSource::Unknown);
        assert_eq!(mapping.confidence, 0);
        assert!(mapping.tdsp.is_none());
    }

    #[test]
    fn test_override_replaces_static_entry() {
        let mut mapper = ZipMapper::builtin();
        let applied = mapper
            .apply_overrides(vec![OverrideRow {
                zip: "75201".to_string(),
                tdsp: Some("TNMP".to_string()),
                utility: None,
                city: None,
                county: None,
                confidence: Some(88),
            }])
            .unwrap();
        assert_eq!(applied, 1);

        let mapping = mapper.resolve("75201").unwrap();
        assert_eq!(mapping.tdsp, Some(TdspCode::Tnmp));
        assert_eq!(mapping.source, MappingSource::Override);
        assert_eq!(mapping.confidence, 88);
        assert_eq!(mapping.city.as_deref(), Some("Dallas"));
    }

    #[test]
    fn test_override_without_territory_is_rejected() {
        let mut mapper = ZipMapper::builtin();
        let result = mapper.load_overrides_csv(b"zip,tdsp,utility\n75201,,\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_confidence_bounds_across_texas() {
        let mapper = ZipMapper::builtin();
        for number in (75000..80000).step_by(7) {
            let mapping = mapper.resolve(&format!("{:05}", number)).unwrap();
            assert!(mapping.confidence <= 100);
            if mapping.source == MappingSource::Inferred {
                assert!(mapping.confidence <= 75);
            }
        }
    }

    #[test]
    fn test_cities_aggregate_zips() {
        let mapper = ZipMapper::builtin();
        let cities = mapper.cities();
        let plano = cities.iter().find(|c| c.slug == "plano-tx").unwrap();
        assert_eq!(plano.tdsp, Some(TdspCode::Oncor));
        assert_eq!(plano.zips.len(), 6);

        let austin = cities.iter().find(|c| c.slug == "austin-tx").unwrap();
        assert!(!austin.deregulated);
    }

    #[tokio::test]
    async fn test_verify_promotes_confirmed_mapping() {
        let mapper = ZipMapper::builtin();
        let weak = mapper.resolve("75460").unwrap();
        assert_eq!(weak.confidence, 70);

        let confirmed = mapper.verify(weak.clone(), &FixedTerritory(Ok(true))).await;
        assert_eq!(confirmed.source, MappingSource::Verified);
        assert_eq!(confirmed.confidence, VERIFIED_CONFIDENCE);

        let rejected = mapper.verify(weak.clone(), &FixedTerritory(Ok(false))).await;
        assert_eq!(rejected.confidence, REJECTED_CONFIDENCE_CAP);
        assert_eq!(rejected.tdsp, weak.tdsp);

        let failed = mapper.verify(weak.clone(), &FixedTerritory(Err(()))).await;
        assert_eq!(failed, weak);
    }

    #[tokio::test]
    async fn test_verify_skips_confident_mapping() {
        let mapper = ZipMapper::builtin();
        let strong = mapper.resolve("75201").unwrap();
        let result = mapper.verify(strong.clone(), &FixedTerritory(Ok(false))).await;
        assert_eq!(result, strong);
    }
}
