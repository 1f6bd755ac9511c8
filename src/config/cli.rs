use crate::adapters::http::LOCATIONIQ_REVERSE_URL;
use crate::core::export::DEFAULT_COUNTRY_CODE;
use crate::core::ConfigProvider;
use crate::domain::ports::ExportFormat;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate, SUPPORTED_INPUT_EXTENSIONS};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "sheet-geocoder")]
#[command(about = "Add commune and address columns to a spreadsheet of coordinates using LocationIQ")]
pub struct CliConfig {
    /// Spreadsheet to process (.xlsx, .xls, .xlsm, .ods or .csv)
    #[arg(long, short)]
    pub input: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = LOCATIONIQ_REVERSE_URL)]
    pub api_endpoint: String,

    #[arg(long, env = "LOCATIONIQ_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Latitude column; detected from the header when omitted
    #[arg(long)]
    pub lat_column: Option<String>,

    /// Longitude column; detected from the header when omitted
    #[arg(long)]
    pub lng_column: Option<String>,

    /// Original columns to export (default: all)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Location columns to export (default: all)
    #[arg(long, value_delimiter = ',')]
    pub location_columns: Vec<String>,

    #[arg(long, default_value = "xlsx")]
    pub format: String,

    #[arg(long, default_value = "10")]
    pub timeout_seconds: u64,

    /// Minimum delay between two API requests
    #[arg(long, default_value = "1000")]
    pub throttle_ms: u64,

    #[arg(long, default_value = DEFAULT_COUNTRY_CODE)]
    pub phone_country_code: String,

    #[arg(long, help = "Add the raw address JSON as an address_debug column")]
    pub address_debug: bool,

    #[arg(long, help = "Detect columns and count valid coordinates without calling the API")]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    fn latitude_column(&self) -> Option<&str> {
        self.lat_column.as_deref()
    }

    fn longitude_column(&self) -> Option<&str> {
        self.lng_column.as_deref()
    }

    fn export_columns(&self) -> &[String] {
        &self.columns
    }

    fn location_columns(&self) -> &[String] {
        &self.location_columns
    }

    fn export_format(&self) -> ExportFormat {
        self.format.parse().unwrap_or_default()
    }

    fn phone_country_code(&self) -> &str {
        &self.phone_country_code
    }

    fn include_address_debug(&self) -> bool {
        self.address_debug
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input)?;
        validation::validate_file_extension("input", &self.input, SUPPORTED_INPUT_EXTENSIONS)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_url("api_endpoint", &self.api_endpoint)?;
        validation::validate_range("timeout_seconds", self.timeout_seconds, 1, 300)?;
        validation::validate_range("throttle_ms", self.throttle_ms, 0, 60_000)?;
        validation::validate_country_code("phone_country_code", &self.phone_country_code)?;

        self.format
            .parse::<ExportFormat>()
            .map_err(|reason| crate::utils::error::GeocoderError::InvalidConfigValueError {
                field: "format".to_string(),
                value: self.format.clone(),
                reason,
            })?;

        // dry run 不會呼叫 API，不需要金鑰
        if !self.dry_run {
            validation::validate_non_empty_string("api_key", &self.api_key).map_err(|_| {
                crate::utils::error::GeocoderError::MissingConfigError {
                    field: "api_key (--api-key or LOCATIONIQ_API_KEY)".to_string(),
                }
            })?;
        }

        Ok(())
    }
}
