use crate::core::zip_mapper::{MapperSettings, DEFAULT_NEIGHBOR_WINDOW, DEFAULT_VERIFY_BELOW};
use crate::utils::error::{AppError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Service configuration. Every section is optional in the file; missing
/// values fall back to the defaults below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub pricing: Option<UpstreamConfig>,
    pub territory: Option<UpstreamConfig>,
    pub esiid: Option<UpstreamConfig>,
    pub data: DataConfig,
    pub rate_limit: RateLimitConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub max_uri_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
            max_uri_bytes: 2048,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: String,
    pub verbose: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "compact".to_string(),
            verbose: false,
        }
    }
}

/// Connection settings shared by the pricing, territory and ESIID clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    /// Only used by the pricing client.
    pub cache_ttl_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: None,
            timeout_seconds: 10,
            retry_attempts: 2,
            retry_delay_ms: 250,
            cache_ttl_seconds: 300,
        }
    }
}

impl UpstreamConfig {
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// API key with unresolved `${VAR}` placeholders treated as absent.
    pub fn resolved_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && !ENV_VAR.is_match(k))
    }

    fn validate_section(&self, section: &str) -> Result<()> {
        validate_url(&format!("{}.endpoint", section), &self.endpoint)?;
        validate_range(&format!("{}.timeout_seconds", section), self.timeout_seconds, 1, 120)?;
        validate_range(&format!("{}.retry_attempts", section), self.retry_attempts, 0, 10)?;
        validate_range(&format!("{}.retry_delay_ms", section), self.retry_delay_ms, 1, 60_000)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Optional override CSV applied over the built-in ZIP table at startup.
    pub overrides_path: Option<String>,
    pub neighbor_window: u32,
    /// Mappings below this confidence are checked with the territory service.
    pub verify_below: u8,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            overrides_path: None,
            neighbor_window: DEFAULT_NEIGHBOR_WINDOW,
            verify_below: DEFAULT_VERIFY_BELOW,
        }
    }
}

impl DataConfig {
    pub fn mapper_settings(&self) -> MapperSettings {
        MapperSettings {
            neighbor_window: self.neighbor_window,
            verify_below: self.verify_below,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub capacity: u32,
    pub refill_per_sec: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 60,
            refill_per_sec: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub hsts: bool,
    pub hsts_max_age_secs: u64,
    pub frame_ancestors: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            hsts: false,
            hsts_max_age_secs: 31_536_000,
            frame_ancestors: "'none'".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content, |name| std::env::var(name).ok());
        toml::from_str(&processed).map_err(|e| AppError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Applies environment overrides on top of file values.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        for (section, url_var, key_var) in [
            ("pricing", "PRICING_API_URL", "PRICING_API_KEY"),
            ("territory", "TERRITORY_API_URL", "TERRITORY_API_KEY"),
            ("esiid", "ESIID_API_URL", "ESIID_API_KEY"),
        ] {
            let slot = match section {
                "pricing" => &mut self.pricing,
                "territory" => &mut self.territory,
                _ => &mut self.esiid,
            };
            if let Some(url) = lookup(url_var) {
                slot.get_or_insert_with(UpstreamConfig::default).endpoint = url;
            }
            if let Some(key) = lookup(key_var) {
                match slot {
                    Some(upstream) => upstream.api_key = Some(key),
                    None => tracing::warn!("⚠️ {} is set but {} has no endpoint", key_var, section),
                }
            }
        }

        if let Some(port) = lookup("TXPOWER_PORT") {
            self.server.port = port.parse().map_err(|_| AppError::InvalidConfigValueError {
                field: "TXPOWER_PORT".to_string(),
                value: port.clone(),
                reason: "must be a port number".to_string(),
            })?;
        }
        if let Some(format) = lookup("TXPOWER_LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }

    pub fn log_format(&self) -> LogFormat {
        LogFormat::parse(&self.logging.format).unwrap_or(LogFormat::Compact)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Replaces `${VAR}` with the variable's value. Unknown variables are left
/// as-is so validation can report them.
pub fn substitute_env_vars<F>(content: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ENV_VAR
        .replace_all(content, |caps: &regex::Captures| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("server.host", &self.server.host)?;
        validate_positive_number("server.port", self.server.port as usize, 1)?;
        validate_range("server.max_uri_bytes", self.server.max_uri_bytes, 256, 16_384)?;
        for origin in &self.server.cors_origins {
            if origin != "*" {
                validate_url("server.cors_origins", origin)?;
            }
        }

        if LogFormat::parse(&self.logging.format).is_none() {
            return Err(AppError::InvalidConfigValueError {
                field: "logging.format".to_string(),
                value: self.logging.format.clone(),
                reason: "expected 'compact' or 'json'".to_string(),
            });
        }

        if let Some(pricing) = &self.pricing {
            pricing.validate_section("pricing")?;
            validate_range("pricing.cache_ttl_seconds", pricing.cache_ttl_seconds, 0, 86_400)?;
        }
        if let Some(territory) = &self.territory {
            territory.validate_section("territory")?;
        }
        if let Some(esiid) = &self.esiid {
            esiid.validate_section("esiid")?;
        }

        if let Some(path) = &self.data.overrides_path {
            validate_path("data.overrides_path", path)?;
        }
        validate_range("data.neighbor_window", self.data.neighbor_window, 1, 100)?;
        validate_range("data.verify_below", self.data.verify_below, 0, 100)?;

        if self.rate_limit.enabled {
            validate_positive_number("rate_limit.capacity", self.rate_limit.capacity as usize, 1)?;
            if !(self.rate_limit.refill_per_sec.is_finite() && self.rate_limit.refill_per_sec > 0.0) {
                return Err(AppError::InvalidConfigValueError {
                    field: "rate_limit.refill_per_sec".to_string(),
                    value: self.rate_limit.refill_per_sec.to_string(),
                    reason: "must be a positive number".to_string(),
                });
            }
        }
        Ok(())
    }
}
