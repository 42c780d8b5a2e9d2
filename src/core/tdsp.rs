//! Static registry of Texas wires utilities and the identifiers upstream
//! systems use for them (DUNS numbers, ESIID prefixes, free-form names).

use crate::domain::model::{RateEstimate, TdspCode, TdspInfo};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::validate_esiid;
use std::str::FromStr;

static REGISTRY: [TdspInfo; 6] = [
    TdspInfo {
        code: TdspCode::Oncor,
        name: "Oncor Electric Delivery",
        short_name: "Oncor",
        duns: Some("1039940674000"),
        esiid_prefixes: &["1044372", "10400511"],
        service_area: "Dallas-Fort Worth, Waco, Midland-Odessa, Tyler and much of North and West Texas",
        base_charge_dollars: 4.23,
        per_kwh_cents: 5.62,
        average_rate_cents: 15.1,
    },
    TdspInfo {
        code: TdspCode::Centerpoint,
        name: "CenterPoint Energy Houston Electric",
        short_name: "CenterPoint",
        duns: Some("957877905"),
        esiid_prefixes: &["1008901"],
        service_area: "Greater Houston and surrounding Gulf Coast counties",
        base_charge_dollars: 4.39,
        per_kwh_cents: 5.47,
        average_rate_cents: 14.8,
    },
    TdspInfo {
        code: TdspCode::AepCentral,
        name: "AEP Texas Central Company",
        short_name: "AEP Central",
        duns: Some("007924772"),
        esiid_prefixes: &["10032789", "10007900"],
        service_area: "Corpus Christi, Laredo, Victoria and the Rio Grande Valley",
        base_charge_dollars: 4.79,
        per_kwh_cents: 5.93,
        average_rate_cents: 15.9,
    },
    TdspInfo {
        code: TdspCode::AepNorth,
        name: "AEP Texas North Company",
        short_name: "AEP North",
        duns: Some("007923311"),
        esiid_prefixes: &["10204049"],
        service_area: "Abilene, San Angelo and West Central Texas",
        base_charge_dollars: 3.24,
        per_kwh_cents: 5.51,
        average_rate_cents: 15.6,
    },
    TdspInfo {
        code: TdspCode::Tnmp,
        name: "Texas-New Mexico Power",
        short_name: "TNMP",
        duns: Some("007929441"),
        esiid_prefixes: &["10400512", "10400513"],
        service_area: "Texas City, League City, Lewisville, Pecos and scattered North and West Texas towns",
        base_charge_dollars: 7.85,
        per_kwh_cents: 6.21,
        average_rate_cents: 16.4,
    },
    TdspInfo {
        code: TdspCode::Lpl,
        name: "Lubbock Power & Light",
        short_name: "LP&L",
        duns: None,
        esiid_prefixes: &["10176990"],
        service_area: "City of Lubbock",
        base_charge_dollars: 3.00,
        per_kwh_cents: 4.37,
        average_rate_cents: 14.2,
    },
];

pub fn registry() -> &'static [TdspInfo] {
    &REGISTRY
}

pub fn info(code: TdspCode) -> &'static TdspInfo {
    // REGISTRY is declared in TdspCode order
    &REGISTRY[code as usize]
}

impl FromStr for TdspCode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self> {
        let normalized: String = value
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();

        let code = match normalized.as_str() {
            "oncor" | "oncor-electric-delivery" => TdspCode::Oncor,
            "centerpoint" | "cnp" | "centerpoint-energy" | "centerpoint-energy-houston-electric" => {
                TdspCode::Centerpoint
            }
            "aep-central" | "aep-texas-central" | "aepcentral" | "aep-texas-central-company" => {
                TdspCode::AepCentral
            }
            "aep-north" | "aep-texas-north" | "aepnorth" | "aep-texas-north-company" => {
                TdspCode::AepNorth
            }
            "tnmp" | "texas-new-mexico-power" => TdspCode::Tnmp,
            "lpl" | "lp&l" | "lubbock-power-&-light" | "lubbock-power-and-light" => TdspCode::Lpl,
            _ => {
                return Err(AppError::validation(
                    "tdsp",
                    format!("unknown utility '{}'", value.trim()),
                ))
            }
        };
        Ok(code)
    }
}

pub fn from_duns(duns: &str) -> Option<TdspCode> {
    let wanted = duns.trim().trim_start_matches('0');
    if wanted.is_empty() {
        return None;
    }
    REGISTRY.iter().find_map(|info| {
        info.duns
            .filter(|d| d.trim_start_matches('0') == wanted)
            .map(|_| info.code)
    })
}

/// Longest matching ESIID prefix wins.
pub fn from_esiid(esiid: &str) -> Result<Option<TdspCode>> {
    validate_esiid(esiid)?;
    let found = REGISTRY
        .iter()
        .flat_map(|info| info.esiid_prefixes.iter().map(move |p| (*p, info.code)))
        .filter(|(prefix, _)| esiid.starts_with(prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, code)| code);
    Ok(found)
}

/// Rough all-in rate for a utility when no plan data is available. The
/// average is quoted at 1000 kWh; the fixed monthly charge is re-spread over
/// the requested usage.
pub fn fallback_estimate(code: TdspCode, usage_kwh: u32) -> RateEstimate {
    let info = info(code);
    let usage = usage_kwh.max(1) as f64;
    let rate = info.average_rate_cents + info.base_charge_dollars * 100.0 * (1.0 / usage - 1.0 / 1000.0);
    let rate_cents = (rate.max(0.1) * 100.0).round() / 100.0;
    RateEstimate {
        tdsp: code,
        usage_kwh,
        rate_cents,
        monthly_bill_dollars: (rate_cents * usage / 100.0 * 100.0).round() / 100.0,
    }
}
