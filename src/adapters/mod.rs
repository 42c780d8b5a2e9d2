//! Concrete implementations of the domain ports: upstream HTTP APIs and
//! local file storage.

pub mod esiid_client;
pub mod http;
pub mod pricing_client;
pub mod storage;
pub mod territory_client;

pub use esiid_client::EsiidClient;
pub use pricing_client::PricingClient;
pub use storage::LocalStorage;
pub use territory_client::TerritoryClient;
