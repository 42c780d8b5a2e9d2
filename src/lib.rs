pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

pub use adapters::{EsiidClient, LocalStorage, PricingClient, TerritoryClient};
pub use config::AppConfig;
pub use core::{TableEngine, ZipMapper, ZipTablePipeline};
pub use server::{build_router, start_server, AppState};
pub use utils::error::{AppError, Result};
