use crate::config::toml_config::AppConfig;
use crate::core::table::{DEFAULT_BUNDLE_NAME, DEFAULT_LOW_CONFIDENCE};
use crate::core::zip_mapper::DEFAULT_NEIGHBOR_WINDOW;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_range, Validate};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "txpower")]
#[command(about = "Texas electricity plan comparison API")]
#[command(version)]
pub struct ServeArgs {
    #[arg(long, short, env = "TXPOWER_CONFIG", help = "TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "Bind address, overrides server.host")]
    pub host: Option<String>,

    #[arg(long, short, help = "Listen port, overrides server.port and TXPOWER_PORT")]
    pub port: Option<u16>,

    #[arg(long, short, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit JSON logs")]
    pub log_json: bool,
}

impl ServeArgs {
    /// Defaults, then the TOML file, then the environment, then these flags.
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        config.apply_env()?;
        self.apply_to(&mut config);
        Ok(config)
    }

    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.verbose {
            config.logging.verbose = true;
        }
        if self.log_json {
            config.logging.format = "json".to_string();
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "zip_table")]
#[command(about = "Regenerate the ZIP to TDSP lookup bundle")]
pub struct TableArgs {
    #[arg(long, short, help = "CSV of ZIP codes: zip[,city,county]")]
    pub input: String,

    #[arg(long, help = "Override CSV: zip,tdsp,utility,city,county,confidence")]
    pub overrides: Option<String>,

    #[arg(long, short, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = DEFAULT_BUNDLE_NAME)]
    pub bundle_name: String,

    #[arg(long, default_value_t = DEFAULT_LOW_CONFIDENCE, help = "Flag mappings below this confidence")]
    pub low_confidence: u8,

    #[arg(long, default_value_t = DEFAULT_NEIGHBOR_WINDOW)]
    pub neighbor_window: u32,

    #[arg(long, help = "Report time and memory per phase")]
    pub monitor: bool,

    #[arg(long, short, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ConfigProvider for TableArgs {
    fn zip_list_file(&self) -> &str {
        &self.input
    }

    fn override_file(&self) -> Option<&str> {
        self.overrides.as_deref()
    }

    fn bundle_name(&self) -> &str {
        &self.bundle_name
    }

    fn low_confidence_threshold(&self) -> u8 {
        self.low_confidence
    }
}

impl Validate for TableArgs {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input)?;
        if let Some(overrides) = &self.overrides {
            validate_path("overrides", overrides)?;
        }
        validate_path("output_path", &self.output_path)?;
        validate_path("bundle_name", &self.bundle_name)?;
        validate_range("low_confidence", self.low_confidence, 0, 100)?;
        validate_range("neighbor_window", self.neighbor_window, 1, 100)?;
        Ok(())
    }
}
