use crate::adapters::spreadsheet::{write_csv, write_xlsx, EXPORT_SHEET_NAME};
use crate::domain::model::GeocodeSession;
use crate::domain::ports::ExportFormat;
use crate::utils::error::{GeocoderError, Result};
use chrono::{DateTime, Local};

pub const DEFAULT_COUNTRY_CODE: &str = "+213";

const PHONE_TERMS: &[&str] = &["tél", "tel", "phone", "portable", "mobile", "telephone"];
const PHONE_SEPARATOR: char = '.';

/// Columns the user chose to export. Empty lists mean "everything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSelection {
    pub original: Vec<String>,
    pub location: Vec<String>,
}

impl ColumnSelection {
    pub fn new(original: Vec<String>, location: Vec<String>) -> Self {
        Self { original, location }
    }

    /// Ordered union of both lists, without duplicates, keeping only columns the session has.
    pub fn resolve(&self, session: &GeocodeSession) -> Vec<String> {
        let original = if self.original.is_empty() {
            session.original_columns.clone()
        } else {
            self.original.clone()
        };
        let location = if self.location.is_empty() {
            session.location_columns()
        } else {
            self.location.clone()
        };

        let mut resolved: Vec<String> = Vec::new();
        for column in original.into_iter().chain(location) {
            if session.output.has_column(&column) && !resolved.contains(&column) {
                resolved.push(column);
            }
        }
        resolved
    }
}

#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub rows: usize,
    pub columns: Vec<String>,
}

pub fn is_phone_column(name: &str) -> bool {
    let lower = name.to_lowercase();
    PHONE_TERMS.iter().any(|term| lower.contains(term))
}

/// 0 開頭、長度至少 9、去掉 '.' 後全為數字時，把開頭的 0 換成國碼
pub fn format_phone_number(value: &str, country_code: &str) -> String {
    let trimmed = value.trim();
    let digits: String = trimmed
        .chars()
        .filter(|&c| c != PHONE_SEPARATOR)
        .collect();

    let qualifies = trimmed.starts_with('0')
        && trimmed.chars().count() >= 9
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit());

    if qualifies {
        format!("{}{}", country_code, &trimmed[1..])
    } else {
        value.to_string()
    }
}

pub fn export_file_name(timestamp: DateTime<Local>, format: ExportFormat) -> String {
    format!(
        "processed_addresses_{}.{}",
        timestamp.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Projects the selected columns, normalizes phone numbers and serializes the sheet.
#[derive(Debug, Clone)]
pub struct ExportFormatter {
    format: ExportFormat,
    country_code: String,
}

impl Default for ExportFormatter {
    fn default() -> Self {
        Self::new(ExportFormat::Xlsx, DEFAULT_COUNTRY_CODE)
    }
}

impl ExportFormatter {
    pub fn new(format: ExportFormat, country_code: impl Into<String>) -> Self {
        Self {
            format,
            country_code: country_code.into(),
        }
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// Selected rows with phone columns rewritten. The session itself is not modified.
    pub fn project(&self, session: &GeocodeSession, columns: &[String]) -> Vec<Vec<String>> {
        let plan: Vec<(usize, bool)> = columns
            .iter()
            .filter_map(|name| {
                session
                    .output
                    .column_index(name)
                    .map(|index| (index, is_phone_column(name)))
            })
            .collect();

        session
            .output
            .rows()
            .iter()
            .map(|row| {
                plan.iter()
                    .map(|&(index, is_phone)| {
                        if is_phone {
                            format_phone_number(&row[index], &self.country_code)
                        } else {
                            row[index].clone()
                        }
                    })
                    .collect()
            })
            .collect()
    }

    pub fn export(
        &self,
        session: &GeocodeSession,
        selection: &ColumnSelection,
        timestamp: DateTime<Local>,
    ) -> Result<ExportedFile> {
        let columns = selection.resolve(session);
        if columns.is_empty() {
            return Err(GeocoderError::ValidationError {
                message: "Please select at least one column to export".to_string(),
            });
        }

        let phone_columns: Vec<&String> = columns.iter().filter(|c| is_phone_column(c)).collect();
        if !phone_columns.is_empty() {
            tracing::debug!(
                "Applying {} prefix to phone columns: {:?}",
                self.country_code,
                phone_columns
            );
        }

        let rows = self.project(session, &columns);
        let bytes = match self.format {
            ExportFormat::Xlsx => write_xlsx(EXPORT_SHEET_NAME, &columns, &rows)?,
            ExportFormat::Csv => write_csv(&columns, &rows)?,
        };

        tracing::info!(
            "📦 Export ready with {} rows and {} columns ({} bytes)",
            rows.len(),
            columns.len(),
            bytes.len()
        );

        Ok(ExportedFile {
            file_name: export_file_name(timestamp, self.format),
            bytes,
            rows: rows.len(),
            columns,
        })
    }
}
