#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{ServeArgs, TableArgs};
pub use toml_config::{
    AppConfig, DataConfig, LoggingConfig, RateLimitConfig, SecurityConfig, ServerConfig,
    UpstreamConfig,
};
