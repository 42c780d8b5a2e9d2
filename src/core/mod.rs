pub mod facets;
pub mod plan_filter;
pub mod search;
pub mod table;
pub mod tdsp;
pub mod zip_data;
pub mod zip_mapper;

pub use crate::domain::ports::{ConfigProvider, Storage, TablePipeline};
pub use crate::utils::error::Result;
pub use table::{TableEngine, ZipTablePipeline};
pub use zip_mapper::ZipMapper;
