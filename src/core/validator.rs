use crate::domain::model::{CoordinatePair, InputTable, RowStatus};
use thiserror::Error;

/// Why a raw cell pair cannot be geocoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidCoordinate {
    #[error("coordinate cell is empty")]
    Empty,

    #[error("coordinate '{value}' is not a number")]
    NonNumeric { value: String },

    #[error("coordinate is zero or not a number")]
    ZeroOrNull,
}

impl InvalidCoordinate {
    pub fn row_status(&self) -> RowStatus {
        match self {
            InvalidCoordinate::Empty | InvalidCoordinate::ZeroOrNull => RowStatus::Skipped,
            InvalidCoordinate::NonNumeric { .. } => RowStatus::Error,
        }
    }

    /// commune 欄位要填入的佔位文字
    pub fn placeholder(&self) -> &'static str {
        match self {
            InvalidCoordinate::Empty | InvalidCoordinate::ZeroOrNull => "Invalid Coordinates",
            InvalidCoordinate::NonNumeric { .. } => "Invalid Data",
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.is_empty() || value == "nan"
}

fn parse(value: &str) -> Result<f64, InvalidCoordinate> {
    value.parse::<f64>().map_err(|_| InvalidCoordinate::NonNumeric {
        value: value.to_string(),
    })
}

fn is_zero_or_null(value: f64) -> bool {
    value.is_nan() || value == 0.0
}

pub fn validate_coordinates(latitude: &str, longitude: &str) -> Result<CoordinatePair, InvalidCoordinate> {
    let latitude = latitude.trim();
    let longitude = longitude.trim();

    if is_blank(latitude) || is_blank(longitude) {
        return Err(InvalidCoordinate::Empty);
    }

    let latitude = parse(latitude)?;
    let longitude = parse(longitude)?;

    if is_zero_or_null(latitude) || is_zero_or_null(longitude) {
        return Err(InvalidCoordinate::ZeroOrNull);
    }

    Ok(CoordinatePair {
        latitude,
        longitude,
    })
}

/// Number of rows whose coordinate cells would be sent to the API.
pub fn count_valid_coordinates(table: &InputTable, latitude_column: &str, longitude_column: &str) -> usize {
    (0..table.len())
        .filter(|&row| {
            let latitude = table.cell(row, latitude_column).unwrap_or("");
            let longitude = table.cell(row, longitude_column).unwrap_or("");
            validate_coordinates(latitude, longitude).is_ok()
        })
        .count()
}
