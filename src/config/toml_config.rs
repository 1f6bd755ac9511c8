use crate::adapters::http::LOCATIONIQ_REVERSE_URL;
use crate::core::export::DEFAULT_COUNTRY_CODE;
use crate::core::ConfigProvider;
use crate::domain::ports::ExportFormat;
use crate::utils::error::{GeocoderError, Result};
use crate::utils::validation::{self, Validate, SUPPORTED_INPUT_EXTENSIONS};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub api: ApiConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub export: ExportConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub key: String,
    pub timeout_seconds: Option<u64>,
    pub throttle_interval_ms: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            key: String::new(),
            timeout_seconds: None,
            throttle_interval_ms: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
    pub latitude_column: Option<String>,
    pub longitude_column: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub location_columns: Vec<String>,
    #[serde(default = "default_country_code")]
    pub phone_country_code: String,
    #[serde(default)]
    pub include_address_debug: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            format: default_format(),
            columns: Vec::new(),
            location_columns: Vec::new(),
            phone_country_code: default_country_code(),
            include_address_debug: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

fn default_endpoint() -> String {
    LOCATIONIQ_REVERSE_URL.to_string()
}

fn default_output_path() -> String {
    "./output".to_string()
}

fn default_format() -> String {
    "xlsx".to_string()
}

fn default_country_code() -> String {
    DEFAULT_COUNTRY_CODE.to_string()
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GeocoderError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| GeocoderError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${LOCATIONIQ_API_KEY})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn output_path(&self) -> &str {
        &self.export.output_path
    }

    fn api_endpoint(&self) -> &str {
        &self.api.endpoint
    }

    fn api_key(&self) -> &str {
        &self.api.key
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds.unwrap_or(10))
    }

    fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.api.throttle_interval_ms.unwrap_or(1000))
    }

    fn latitude_column(&self) -> Option<&str> {
        self.input.latitude_column.as_deref()
    }

    fn longitude_column(&self) -> Option<&str> {
        self.input.longitude_column.as_deref()
    }

    fn export_columns(&self) -> &[String] {
        &self.export.columns
    }

    fn location_columns(&self) -> &[String] {
        &self.export.location_columns
    }

    fn export_format(&self) -> ExportFormat {
        self.export.format.parse().unwrap_or_default()
    }

    fn phone_country_code(&self) -> &str {
        &self.export.phone_country_code
    }

    fn include_address_debug(&self) -> bool {
        self.export.include_address_debug
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api.endpoint", &self.api.endpoint)?;

        if self.api.key.trim().is_empty() || self.api.key.starts_with("${") {
            return Err(GeocoderError::MissingConfigError {
                field: "api.key".to_string(),
            });
        }

        if let Some(timeout) = self.api.timeout_seconds {
            validation::validate_range("api.timeout_seconds", timeout, 1, 300)?;
        }
        if let Some(interval) = self.api.throttle_interval_ms {
            validation::validate_range("api.throttle_interval_ms", interval, 0, 60_000)?;
        }

        validation::validate_path("input.path", &self.input.path)?;
        validation::validate_file_extension("input.path", &self.input.path, SUPPORTED_INPUT_EXTENSIONS)?;
        validation::validate_path("export.output_path", &self.export.output_path)?;
        validation::validate_country_code("export.phone_country_code", &self.export.phone_country_code)?;

        self.export
            .format
            .parse::<ExportFormat>()
            .map_err(|reason| GeocoderError::InvalidConfigValueError {
                field: "export.format".to_string(),
                value: self.export.format.clone(),
                reason,
            })?;

        Ok(())
    }
}
