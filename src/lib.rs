pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::http::LocationIqClient;
pub use adapters::storage::LocalStorage;
pub use app::spreadsheet_pipeline::SpreadsheetPipeline;
pub use core::{engine::GeocodeEngine, row_pipeline::RowPipeline};
pub use utils::error::{GeocoderError, Result};
