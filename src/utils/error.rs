use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeocoderError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Spreadsheet read error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Failed to parse input file: {message}")]
    InputParseError { message: String },

    #[error("Column '{column}' not found in input table")]
    ColumnNotFound { column: String },

    #[error("No valid coordinates found in columns '{latitude}' / '{longitude}' ({total_rows} rows)")]
    NoValidCoordinates {
        latitude: String,
        longitude: String,
        total_rows: usize,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Export error: {message}")]
    ExportError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Network,
    Processing,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl GeocoderError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GeocoderError::ConfigError { .. }
            | GeocoderError::ConfigValidationError { .. }
            | GeocoderError::InvalidConfigValueError { .. }
            | GeocoderError::MissingConfigError { .. } => ErrorCategory::Configuration,
            GeocoderError::CsvError(_)
            | GeocoderError::SpreadsheetError(_)
            | GeocoderError::InputParseError { .. }
            | GeocoderError::ColumnNotFound { .. }
            | GeocoderError::NoValidCoordinates { .. } => ErrorCategory::Input,
            GeocoderError::HttpError(_) => ErrorCategory::Network,
            GeocoderError::SerializationError(_) | GeocoderError::ValidationError { .. } => {
                ErrorCategory::Processing
            }
            GeocoderError::ZipError(_)
            | GeocoderError::IoError(_)
            | GeocoderError::ExportError { .. } => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            GeocoderError::HttpError(_) => ErrorSeverity::Medium,
            GeocoderError::IoError(_) | GeocoderError::ZipError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            GeocoderError::MissingConfigError { field } => {
                format!("Provide '{}' via command line, config file or environment", field)
            }
            GeocoderError::InvalidConfigValueError { field, .. }
            | GeocoderError::ConfigValidationError { field, .. } => {
                format!("Check the value of '{}' and try again", field)
            }
            GeocoderError::ConfigError { .. } => {
                "Check the configuration file syntax and required sections".to_string()
            }
            GeocoderError::CsvError(_)
            | GeocoderError::SpreadsheetError(_)
            | GeocoderError::InputParseError { .. } => {
                "Please make sure the file is a valid Excel file (.xlsx or .xls) or CSV".to_string()
            }
            GeocoderError::ColumnNotFound { .. } => {
                "Run with --dry-run to list the detected coordinate columns".to_string()
            }
            GeocoderError::NoValidCoordinates { .. } => {
                "Please check your latitude/longitude column selection".to_string()
            }
            GeocoderError::HttpError(_) => {
                "Check network connectivity and the API endpoint, then retry".to_string()
            }
            GeocoderError::ValidationError { .. } => {
                "Adjust the requested options and try again".to_string()
            }
            GeocoderError::SerializationError(_) => {
                "The data could not be serialized; inspect the input for unusual values".to_string()
            }
            GeocoderError::ZipError(_)
            | GeocoderError::IoError(_)
            | GeocoderError::ExportError { .. } => {
                "Check that the output directory exists and is writable".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => format!("Error reading the input file: {}", self),
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Processing => format!("Processing failed: {}", self),
            ErrorCategory::Output => format!("Could not write the output: {}", self),
        }
    }

    /// Two-line report printed to stderr by the binaries.
    pub fn cli_report(&self) -> String {
        format!(
            "❌ {}\n💡 Suggestion: {}",
            self.user_friendly_message(),
            self.recovery_suggestion()
        )
    }

    /// 依嚴重程度決定程序結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, GeocoderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_and_severity() {
        let err = GeocoderError::ColumnNotFound {
            column: "Lat".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);

        let err = GeocoderError::IoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(err.category(), ErrorCategory::Output);
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_user_friendly_message_mentions_cause() {
        let err = GeocoderError::MissingConfigError {
            field: "api_key".to_string(),
        };
        assert!(err.user_friendly_message().contains("api_key"));
        assert!(err.recovery_suggestion().contains("api_key"));
    }

    #[test]
    fn test_cli_report_lines() {
        let err = GeocoderError::NoValidCoordinates {
            latitude: "Lat".to_string(),
            longitude: "Long".to_string(),
            total_rows: 4,
        };
        let report = err.cli_report();
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], format!("❌ {}", err.user_friendly_message()));
        assert_eq!(lines[1], format!("💡 Suggestion: {}", err.recovery_suggestion()));
    }
}
