use serde::{Deserialize, Serialize};
use std::fmt;

/// Transmission and distribution utilities serving the competitive Texas market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TdspCode {
    Oncor,
    Centerpoint,
    AepCentral,
    AepNorth,
    Tnmp,
    Lpl,
}

impl TdspCode {
    pub fn all() -> &'static [TdspCode] {
        &[
            TdspCode::Oncor,
            TdspCode::Centerpoint,
            TdspCode::AepCentral,
            TdspCode::AepNorth,
            TdspCode::Tnmp,
            TdspCode::Lpl,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TdspCode::Oncor => "oncor",
            TdspCode::Centerpoint => "centerpoint",
            TdspCode::AepCentral => "aep-central",
            TdspCode::AepNorth => "aep-north",
            TdspCode::Tnmp => "tnmp",
            TdspCode::Lpl => "lpl",
        }
    }
}

impl fmt::Display for TdspCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TdspInfo {
    pub code: TdspCode,
    pub name: &'static str,
    pub short_name: &'static str,
    pub duns: Option<&'static str>,
    #[serde(skip)]
    pub esiid_prefixes: &'static [&'static str],
    pub service_area: &'static str,
    /// Monthly customer + metering charge passed through by retailers, in dollars.
    pub base_charge_dollars: f64,
    /// Delivery charge per kWh, in cents.
    pub per_kwh_cents: f64,
    /// All-in average retail rate used when plan data is unavailable, in cents/kWh.
    pub average_rate_cents: f64,
}

/// Where a ZIP resolution came from, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingSource {
    Verified,
    Override,
    Static,
    Range,
    Inferred,
    County,
    Unknown,
}

impl MappingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingSource::Verified => "verified",
            MappingSource::Override => "override",
            MappingSource::Static => "static",
            MappingSource::Range => "range",
            MappingSource::Inferred => "inferred",
            MappingSource::County => "county",
            MappingSource::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZipCodeMapping {
    pub zip: String,
    pub tdsp: Option<TdspCode>,
    pub city: Option<String>,
    pub city_slug: Option<String>,
    pub county: Option<String>,
    pub confidence: u8,
    pub source: MappingSource,
    pub deregulated: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternates: Vec<TdspCode>,
    /// Municipal utility or co-op name for ZIPs outside the competitive market.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utility: Option<String>,
}

impl ZipCodeMapping {
    /// Split ZIPs need a street address before a plan list can be shown.
    pub fn requires_address(&self) -> bool {
        !self.alternates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub puct_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    Fixed,
    Variable,
    Indexed,
}

impl RateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateType::Fixed => "fixed",
            RateType::Variable => "variable",
            RateType::Indexed => "indexed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixed" | "fixed-rate" => Some(RateType::Fixed),
            "variable" | "variable-rate" => Some(RateType::Variable),
            "indexed" | "indexed-rate" | "market" => Some(RateType::Indexed),
            _ => None,
        }
    }
}

/// Price points as printed on the Electricity Facts Label, in cents per kWh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoints {
    pub kwh500: f64,
    pub kwh1000: f64,
    pub kwh2000: f64,
}

impl PricePoints {
    pub fn is_valid(&self) -> bool {
        [self.kwh500, self.kwh1000, self.kwh2000]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanDocuments {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efl_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tos_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yrac_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub provider: Provider,
    pub tdsp: TdspCode,
    /// 0 means month-to-month.
    pub term_months: u16,
    pub rate_type: RateType,
    pub prices: PricePoints,
    pub base_charge_dollars: f64,
    pub percent_green: u8,
    pub early_termination_fee: f64,
    pub deposit_required: bool,
    pub prepaid: bool,
    pub time_of_use: bool,
    #[serde(default)]
    pub documents: PlanDocuments,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enroll_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub slug: String,
    pub county: Option<String>,
    pub tdsp: Option<TdspCode>,
    pub zips: Vec<String>,
    pub deregulated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiidRecord {
    pub esiid: String,
    pub address: String,
    pub city: Option<String>,
    pub zip: String,
    pub tdsp: Option<TdspCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premise_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateEstimate {
    pub tdsp: TdspCode,
    pub usage_kwh: u32,
    pub rate_cents: f64,
    pub monthly_bill_dollars: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tdsp_code_serializes_kebab_case() {
        let json = serde_json::to_string(&TdspCode::AepCentral).unwrap();
        assert_eq!(json, "\"aep-central\"");
        let back: TdspCode = serde_json::from_str("\"centerpoint\"").unwrap();
        assert_eq!(back, TdspCode::Centerpoint);
    }

    #[test]
    fn test_rate_type_parse_accepts_facet_names() {
        assert_eq!(RateType::parse("fixed-rate"), Some(RateType::Fixed));
        assert_eq!(RateType::parse("Variable"), Some(RateType::Variable));
        assert_eq!(RateType::parse("prepaid"), None);
    }

    #[test]
    fn test_price_points_reject_non_positive() {
        let ok = PricePoints { kwh500: 15.1, kwh1000: 13.2, kwh2000: 12.9 };
        let bad = PricePoints { kwh500: 0.0, kwh1000: 13.2, kwh2000: f64::NAN };
        assert!(ok.is_valid());
        assert!(!bad.is_valid());
    }
}
