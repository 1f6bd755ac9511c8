use crate::domain::model::{CoordinatePair, GeocodeResult, GeocodeSession, InputTable};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("Unsupported export format: {} (use xlsx or csv)", other)),
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn api_endpoint(&self) -> &str;
    fn api_key(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn throttle_interval(&self) -> Duration;
    fn latitude_column(&self) -> Option<&str>;
    fn longitude_column(&self) -> Option<&str>;
    /// Original columns to export; empty means all of them.
    fn export_columns(&self) -> &[String];
    /// Location columns to export; empty means all of them.
    fn location_columns(&self) -> &[String];
    fn export_format(&self) -> ExportFormat;
    fn phone_country_code(&self) -> &str;
    fn include_address_debug(&self) -> bool;
}

/// Reverse-geocoding backend. Failures are folded into the returned result.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse_geocode(&self, coordinates: CoordinatePair) -> GeocodeResult;
}

/// Receives `(rows_processed, total_rows, status)` after every row.
pub trait ProgressReporter: Send + Sync {
    fn on_progress(&self, processed: usize, total: usize, status: &str);
}

impl<F> ProgressReporter for F
where
    F: Fn(usize, usize, &str) + Send + Sync,
{
    fn on_progress(&self, processed: usize, total: usize, status: &str) {
        self(processed, total, status)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn on_progress(&self, _processed: usize, _total: usize, _status: &str) {}
}

/// 以 tracing 輸出進度
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn on_progress(&self, processed: usize, total: usize, status: &str) {
        let percent = if total == 0 {
            100.0
        } else {
            processed as f64 / total as f64 * 100.0
        };
        tracing::info!("⏳ [{}/{} {:.0}%] {}", processed, total, percent, status);
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<InputTable>;
    async fn transform(&self, table: InputTable) -> Result<GeocodeSession>;
    async fn load(&self, session: GeocodeSession) -> Result<String>;
}
