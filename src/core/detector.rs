const LATITUDE_TERMS: &[&str] = &["lat", "latitude", "y"];
const LONGITUDE_TERMS: &[&str] = &["lng", "lon", "long", "longitude", "x"];

/// Suggested coordinate columns, in original column order. The first entry is the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnCandidates {
    pub latitude: Vec<String>,
    pub longitude: Vec<String>,
}

impl ColumnCandidates {
    /// 沒有候選時退回第一欄
    pub fn default_latitude<'a>(&'a self, columns: &'a [String]) -> Option<&'a str> {
        self.latitude
            .first()
            .or_else(|| columns.first())
            .map(String::as_str)
    }

    pub fn default_longitude<'a>(&'a self, columns: &'a [String]) -> Option<&'a str> {
        self.longitude
            .first()
            .or_else(|| columns.first())
            .map(String::as_str)
    }
}

fn matches_any(column: &str, terms: &[&str]) -> bool {
    let lower = column.to_lowercase();
    terms.iter().any(|term| lower.contains(term))
}

pub fn detect_coordinate_columns(columns: &[String]) -> ColumnCandidates {
    let mut candidates = ColumnCandidates::default();

    for column in columns {
        if matches_any(column, LATITUDE_TERMS) {
            candidates.latitude.push(column.clone());
        }
        if matches_any(column, LONGITUDE_TERMS) {
            candidates.longitude.push(column.clone());
        }
    }

    tracing::debug!(
        "Detected coordinate candidates - latitude: {:?}, longitude: {:?}",
        candidates.latitude,
        candidates.longitude
    );

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_detects_lat_long_name() {
        let columns = cols(&["Lat", "Long", "Name"]);
        let candidates = detect_coordinate_columns(&columns);

        assert!(candidates.latitude.contains(&"Lat".to_string()));
        assert!(candidates.longitude.contains(&"Long".to_string()));
        assert!(!candidates.latitude.contains(&"Name".to_string()));
        assert_eq!(candidates.default_latitude(&columns), Some("Lat"));
        assert_eq!(candidates.default_longitude(&columns), Some("Long"));
    }

    #[test]
    fn test_multiple_matches_keep_column_order() {
        let columns = cols(&["GPS_X", "Latitude", "Longitude", "lat_backup"]);
        let candidates = detect_coordinate_columns(&columns);

        assert_eq!(candidates.latitude, cols(&["Latitude", "lat_backup"]));
        assert_eq!(candidates.longitude, cols(&["GPS_X", "Longitude"]));
    }

    #[test]
    fn test_substring_vocabulary_is_case_insensitive() {
        let columns = cols(&["COORD_Y", "COORD_X"]);
        let candidates = detect_coordinate_columns(&columns);

        assert_eq!(candidates.latitude, cols(&["COORD_Y"]));
        assert_eq!(candidates.longitude, cols(&["COORD_X"]));
    }

    #[test]
    fn test_no_match_falls_back_to_first_column() {
        let columns = cols(&["Name", "Code"]);
        let candidates = detect_coordinate_columns(&columns);

        assert!(candidates.latitude.is_empty());
        assert!(candidates.longitude.is_empty());
        assert_eq!(candidates.default_latitude(&columns), Some("Name"));
        assert_eq!(candidates.default_longitude(&columns), Some("Name"));
        assert_eq!(candidates.default_latitude(&[]), None);
    }
}
