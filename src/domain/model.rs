use crate::utils::error::{GeocoderError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 地理編碼新增的欄位，依寫入順序
pub const RESULT_COLUMNS: [&str; 10] = [
    "commune",
    "full_address",
    "country",
    "state",
    "city",
    "postcode",
    "municipality",
    "town",
    "district",
    "suburb",
];

pub const STATUS_COLUMN: &str = "geocoding_status";
pub const ADDRESS_DEBUG_COLUMN: &str = "address_debug";

/// Table read from the uploaded spreadsheet. Every cell is kept as the literal string.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl InputTable {
    /// Rows shorter than the header are padded with empty cells, longer rows are an error.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        for (i, name) in columns.iter().enumerate() {
            if columns[..i].contains(name) {
                return Err(GeocoderError::InputParseError {
                    message: format!("Duplicate column name '{}'", name),
                });
            }
        }

        let width = columns.len();
        let mut normalized = Vec::with_capacity(rows.len());
        for (index, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(GeocoderError::InputParseError {
                    message: format!(
                        "Row {} has {} cells but the header has {} columns",
                        index + 1,
                        row.len(),
                        width
                    ),
                });
            }
            row.resize(width, String::new());
            normalized.push(row);
        }

        Ok(Self {
            columns,
            rows: normalized,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| GeocoderError::ColumnNotFound {
                column: name.to_string(),
            })
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatePair {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for CoordinatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeocodeStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Success,
    Error,
    Skipped,
}

impl RowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowStatus::Success => "success",
            RowStatus::Error => "error",
            RowStatus::Skipped => "skipped",
        }
    }
}

impl From<GeocodeStatus> for RowStatus {
    fn from(status: GeocodeStatus) -> Self {
        match status {
            GeocodeStatus::Success => RowStatus::Success,
            GeocodeStatus::Error => RowStatus::Error,
        }
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized outcome of one reverse-geocoding call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub commune: String,
    pub full_address: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub postcode: String,
    pub municipality: String,
    pub town: String,
    pub district: String,
    pub suburb: String,
    pub status: GeocodeStatus,
    /// Raw `address` object, kept for the optional diagnostic column.
    pub address_debug: Option<String>,
}

impl GeocodeResult {
    /// 失敗時只填 commune 與 full_address，其餘留空
    pub fn failure(commune: &str, full_address: String) -> Self {
        Self {
            commune: commune.to_string(),
            full_address,
            country: String::new(),
            state: String::new(),
            city: String::new(),
            postcode: String::new(),
            municipality: String::new(),
            town: String::new(),
            district: String::new(),
            suburb: String::new(),
            status: GeocodeStatus::Error,
            address_debug: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == GeocodeStatus::Success
    }

    /// Column name / value pairs in `RESULT_COLUMNS` order.
    pub fn fields(&self) -> [(&'static str, &str); 10] {
        [
            (RESULT_COLUMNS[0], self.commune.as_str()),
            (RESULT_COLUMNS[1], self.full_address.as_str()),
            (RESULT_COLUMNS[2], self.country.as_str()),
            (RESULT_COLUMNS[3], self.state.as_str()),
            (RESULT_COLUMNS[4], self.city.as_str()),
            (RESULT_COLUMNS[5], self.postcode.as_str()),
            (RESULT_COLUMNS[6], self.municipality.as_str()),
            (RESULT_COLUMNS[7], self.town.as_str()),
            (RESULT_COLUMNS[8], self.district.as_str()),
            (RESULT_COLUMNS[9], self.suburb.as_str()),
        ]
    }
}

/// Input rows extended with the geocoding columns.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl OutputTable {
    /// 建立與輸入同樣列數、新欄位為空字串的輸出表
    pub fn from_input(input: &InputTable, include_address_debug: bool) -> Self {
        let mut columns = input.columns().to_vec();
        for name in RESULT_COLUMNS.iter().chain(std::iter::once(&STATUS_COLUMN)) {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
        if include_address_debug && !columns.iter().any(|c| c == ADDRESS_DEBUG_COLUMN) {
            columns.push(ADDRESS_DEBUG_COLUMN.to_string());
        }

        // 既有的同名欄位也一併清空
        let generated: Vec<usize> = columns
            .iter()
            .enumerate()
            .filter(|(_, name)| {
                RESULT_COLUMNS.contains(&name.as_str())
                    || name.as_str() == STATUS_COLUMN
                    || (include_address_debug && name.as_str() == ADDRESS_DEBUG_COLUMN)
            })
            .map(|(index, _)| index)
            .collect();

        let width = columns.len();
        let rows = input
            .rows()
            .iter()
            .map(|row| {
                let mut extended = row.clone();
                extended.resize(width, String::new());
                for &index in &generated {
                    extended[index].clear();
                }
                extended
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    /// Writes `value` when both the row and the column exist.
    pub fn set(&mut self, row: usize, column: &str, value: impl Into<String>) {
        if let Some(col) = self.column_index(column) {
            if let Some(cells) = self.rows.get_mut(row) {
                cells[col] = value.into();
            }
        }
    }

    pub fn set_status(&mut self, row: usize, status: RowStatus) {
        self.set(row, STATUS_COLUMN, status.as_str());
    }

    /// The one place a `GeocodeResult` is copied into a row.
    pub fn apply_result(&mut self, row: usize, result: &GeocodeResult) {
        for (column, value) in result.fields() {
            self.set(row, column, value);
        }
        if let Some(debug) = &result.address_debug {
            self.set(row, ADDRESS_DEBUG_COLUMN, debug.as_str());
        }
        self.set_status(row, result.status.into());
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub successful: usize,
    pub failed: usize,
}

impl RunCounters {
    pub fn record(&mut self, status: RowStatus) {
        match status {
            RowStatus::Success => self.successful += 1,
            RowStatus::Error | RowStatus::Skipped => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.successful + self.failed
    }

    pub fn success_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.successful as f64 / self.total() as f64 * 100.0
        }
    }
}

/// Result of one geocoding run, handed from the pipeline to the export step.
#[derive(Debug, Clone)]
pub struct GeocodeSession {
    pub output: OutputTable,
    pub original_columns: Vec<String>,
    pub latitude_column: String,
    pub longitude_column: String,
    pub counters: RunCounters,
}

impl GeocodeSession {
    /// Location columns present in the output, in export order.
    pub fn location_columns(&self) -> Vec<String> {
        [
            "commune",
            "municipality",
            "town",
            "district",
            "suburb",
            "full_address",
            "country",
            "state",
            "city",
            "postcode",
            STATUS_COLUMN,
            ADDRESS_DEBUG_COLUMN,
        ]
        .iter()
        .filter(|name| self.output.has_column(name))
        .map(|name| name.to_string())
        .collect()
    }
}
