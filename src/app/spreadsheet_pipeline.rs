use crate::adapters::http::LocationIqClient;
use crate::adapters::spreadsheet::read_table;
use crate::adapters::storage::join_output_path;
use crate::core::detector::{detect_coordinate_columns, ColumnCandidates};
use crate::core::export::{ColumnSelection, ExportFormatter};
use crate::core::row_pipeline::RowPipeline;
use crate::core::validator::count_valid_coordinates;
use crate::core::{ConfigProvider, GeocodeSession, InputTable, Pipeline, ReverseGeocoder, Storage};
use crate::domain::ports::{ProgressReporter, TracingProgress};
use crate::utils::error::{GeocoderError, Result};
use chrono::Local;

const PREVIEW_ROWS: usize = 10;

/// What a dry run shows before any API call is made.
#[derive(Debug, Clone)]
pub struct TableInspection {
    pub candidates: ColumnCandidates,
    pub latitude_column: String,
    pub longitude_column: String,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub preview: Vec<(String, String)>,
}

/// 指定欄位優先，否則採用偵測到的第一個候選 (再退回第一欄)
pub fn resolve_coordinate_columns(
    table: &InputTable,
    latitude_override: Option<&str>,
    longitude_override: Option<&str>,
) -> Result<(String, String)> {
    let candidates = detect_coordinate_columns(table.columns());

    let latitude = latitude_override
        .or_else(|| candidates.default_latitude(table.columns()))
        .ok_or_else(|| GeocoderError::InputParseError {
            message: "Input table has no columns".to_string(),
        })?
        .to_string();
    let longitude = longitude_override
        .or_else(|| candidates.default_longitude(table.columns()))
        .ok_or_else(|| GeocoderError::InputParseError {
            message: "Input table has no columns".to_string(),
        })?
        .to_string();

    table.require_column(&latitude)?;
    table.require_column(&longitude)?;

    Ok((latitude, longitude))
}

pub fn inspect_table(
    table: &InputTable,
    latitude_override: Option<&str>,
    longitude_override: Option<&str>,
) -> Result<TableInspection> {
    let candidates = detect_coordinate_columns(table.columns());
    let (latitude_column, longitude_column) =
        resolve_coordinate_columns(table, latitude_override, longitude_override)?;

    let preview = (0..table.len().min(PREVIEW_ROWS))
        .map(|row| {
            (
                table.cell(row, &latitude_column).unwrap_or("").to_string(),
                table.cell(row, &longitude_column).unwrap_or("").to_string(),
            )
        })
        .collect();

    Ok(TableInspection {
        valid_rows: count_valid_coordinates(table, &latitude_column, &longitude_column),
        total_rows: table.len(),
        candidates,
        latitude_column,
        longitude_column,
        preview,
    })
}

/// Reads the configured spreadsheet, geocodes it row by row and writes the export.
pub struct SpreadsheetPipeline<S: Storage, C: ConfigProvider, G: ReverseGeocoder> {
    storage: S,
    config: C,
    rows: RowPipeline<G>,
    progress: Box<dyn ProgressReporter>,
}

impl<S: Storage, C: ConfigProvider> SpreadsheetPipeline<S, C, LocationIqClient> {
    pub fn with_locationiq(storage: S, config: C) -> Self {
        let client = LocationIqClient::new(config.api_endpoint(), config.api_key())
            .with_timeout(config.request_timeout());
        Self::new(storage, config, client)
    }
}

impl<S: Storage, C: ConfigProvider, G: ReverseGeocoder> SpreadsheetPipeline<S, C, G> {
    pub fn new(storage: S, config: C, geocoder: G) -> Self {
        let rows = RowPipeline::new(geocoder)
            .with_throttle_interval(config.throttle_interval())
            .with_address_debug(config.include_address_debug());

        Self {
            storage,
            config,
            rows,
            progress: Box::new(TracingProgress),
        }
    }

    pub fn with_progress(mut self, progress: impl ProgressReporter + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// Loads the input and reports column choices and valid rows without calling the API.
    pub async fn inspect(&self) -> Result<TableInspection> {
        let table = self.extract().await?;
        inspect_table(
            &table,
            self.config.latitude_column(),
            self.config.longitude_column(),
        )
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, G: ReverseGeocoder> Pipeline for SpreadsheetPipeline<S, C, G> {
    async fn extract(&self) -> Result<InputTable> {
        let input_path = self.config.input_path();
        tracing::debug!("Loading input file: {}", input_path);

        let bytes = self.storage.read_file(input_path).await?;
        read_table(&bytes, input_path)
    }

    async fn transform(&self, table: InputTable) -> Result<GeocodeSession> {
        let inspection = inspect_table(
            &table,
            self.config.latitude_column(),
            self.config.longitude_column(),
        )?;

        tracing::info!(
            "🎯 Coordinate columns: latitude='{}', longitude='{}'",
            inspection.latitude_column,
            inspection.longitude_column
        );

        if inspection.valid_rows == 0 {
            return Err(GeocoderError::NoValidCoordinates {
                latitude: inspection.latitude_column,
                longitude: inspection.longitude_column,
                total_rows: inspection.total_rows,
            });
        }

        tracing::info!(
            "Found {} valid coordinate pairs out of {} total rows.",
            inspection.valid_rows,
            inspection.total_rows
        );

        self.rows
            .run(
                &table,
                &inspection.latitude_column,
                &inspection.longitude_column,
                self.progress.as_ref(),
            )
            .await
    }

    async fn load(&self, session: GeocodeSession) -> Result<String> {
        let formatter =
            ExportFormatter::new(self.config.export_format(), self.config.phone_country_code());
        let selection = ColumnSelection::new(
            self.config.export_columns().to_vec(),
            self.config.location_columns().to_vec(),
        );

        let file = formatter.export(&session, &selection, Local::now())?;
        let output_path = join_output_path(self.config.output_path(), &file.file_name);

        self.storage.write_file(&output_path, &file.bytes).await?;
        tracing::debug!("Export written to {}", output_path);

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CoordinatePair, GeocodeResult, GeocodeStatus};
    use crate::domain::ports::{ExportFormat, NoProgress};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &[u8]) {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
        }

        async fn paths(&self) -> Vec<String> {
            self.files.lock().await.keys().cloned().collect()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                GeocoderError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        latitude_column: Option<String>,
        export_format: ExportFormat,
        no_columns: Vec<String>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                latitude_column: None,
                export_format: ExportFormat::Csv,
                no_columns: vec![],
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input_path(&self) -> &str {
            "input.csv"
        }
        fn output_path(&self) -> &str {
            "out"
        }
        fn api_endpoint(&self) -> &str {
            "http://unused.test"
        }
        fn api_key(&self) -> &str {
            "key"
        }
        fn request_timeout(&self) -> Duration {
            Duration::from_secs(10)
        }
        fn throttle_interval(&self) -> Duration {
            Duration::ZERO
        }
        fn latitude_column(&self) -> Option<&str> {
            self.latitude_column.as_deref()
        }
        fn longitude_column(&self) -> Option<&str> {
            None
        }
        fn export_columns(&self) -> &[String] {
            &self.no_columns
        }
        fn location_columns(&self) -> &[String] {
            &self.no_columns
        }
        fn export_format(&self) -> ExportFormat {
            self.export_format
        }
        fn phone_country_code(&self) -> &str {
            "+213"
        }
        fn include_address_debug(&self) -> bool {
            false
        }
    }

    struct FixedGeocoder;

    #[async_trait]
    impl ReverseGeocoder for FixedGeocoder {
        async fn reverse_geocode(&self, _coordinates: CoordinatePair) -> GeocodeResult {
            let mut result = GeocodeResult::failure("Bab El Oued", "Bab El Oued, Alger".to_string());
            result.status = GeocodeStatus::Success;
            result
        }
    }

    const INPUT: &str = "Name,Latitude,Longitude,Phone\nA,36.79,3.05,0555123456\nB,,,0666\n";

    #[tokio::test]
    async fn test_extract_transform_load() {
        let storage = MockStorage::default();
        storage.put("input.csv", INPUT.as_bytes()).await;
        let pipeline = SpreadsheetPipeline::new(storage.clone(), MockConfig::new(), FixedGeocoder)
            .with_progress(NoProgress);

        let table = pipeline.extract().await.unwrap();
        assert_eq!(table.len(), 2);

        let session = pipeline.transform(table).await.unwrap();
        assert_eq!(session.latitude_column, "Latitude");
        assert_eq!(session.longitude_column, "Longitude");
        assert_eq!(session.counters.successful, 1);
        assert_eq!(session.counters.failed, 1);

        let path = pipeline.load(session).await.unwrap();
        assert!(path.starts_with("out"));
        assert!(path.ends_with(".csv"));
        assert!(storage.paths().await.contains(&path));

        let written = storage.read_file(&path).await.unwrap();
        let text = String::from_utf8(written).unwrap();
        assert!(text.starts_with("Name,Latitude,Longitude,Phone,commune,"));
        assert!(text.contains("+213555123456"));
        assert!(text.contains("Bab El Oued"));
        assert!(text.contains("Invalid Coordinates"));
    }

    #[tokio::test]
    async fn test_transform_without_valid_coordinates_fails() {
        let storage = MockStorage::default();
        storage
            .put("input.csv", b"Name,Lat,Lng\nA,,\nB,0,0\nC,nan,nan\n")
            .await;
        let pipeline = SpreadsheetPipeline::new(storage, MockConfig::new(), FixedGeocoder)
            .with_progress(NoProgress);

        let table = pipeline.extract().await.unwrap();
        let result = pipeline.transform(table).await;

        assert!(matches!(
            result,
            Err(GeocoderError::NoValidCoordinates { total_rows: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_configured_column_fails() {
        let storage = MockStorage::default();
        storage.put("input.csv", INPUT.as_bytes()).await;
        let mut config = MockConfig::new();
        config.latitude_column = Some("Breite".to_string());
        let pipeline = SpreadsheetPipeline::new(storage, config, FixedGeocoder);

        let table = pipeline.extract().await.unwrap();
        let result = pipeline.transform(table).await;

        assert!(matches!(result, Err(GeocoderError::ColumnNotFound { column }) if column == "Breite"));
    }

    #[tokio::test]
    async fn test_missing_input_file() {
        let pipeline = SpreadsheetPipeline::new(MockStorage::default(), MockConfig::new(), FixedGeocoder);
        assert!(matches!(
            pipeline.extract().await,
            Err(GeocoderError::IoError(_))
        ));
    }

    #[tokio::test]
    async fn test_inspect_makes_no_api_call() {
        struct PanickingGeocoder;

        #[async_trait]
        impl ReverseGeocoder for PanickingGeocoder {
            async fn reverse_geocode(&self, _coordinates: CoordinatePair) -> GeocodeResult {
                panic!("dry run must not geocode");
            }
        }

        let storage = MockStorage::default();
        storage.put("input.csv", INPUT.as_bytes()).await;
        let pipeline = SpreadsheetPipeline::new(storage, MockConfig::new(), PanickingGeocoder);

        let inspection = pipeline.inspect().await.unwrap();
        assert_eq!(inspection.valid_rows, 1);
        assert_eq!(inspection.latitude_column, "Latitude");
    }

    #[test]
    fn test_inspect_table() {
        let table = read_table(INPUT.as_bytes(), "input.csv").unwrap();
        let inspection = inspect_table(&table, None, None).unwrap();

        assert_eq!(inspection.candidates.latitude, vec!["Latitude"]);
        assert_eq!(inspection.candidates.longitude, vec!["Longitude"]);
        assert_eq!(inspection.total_rows, 2);
        assert_eq!(inspection.valid_rows, 1);
        assert_eq!(
            inspection.preview[0],
            ("36.79".to_string(), "3.05".to_string())
        );
    }

    #[test]
    fn test_resolve_columns_prefers_overrides() {
        let table = read_table(INPUT.as_bytes(), "input.csv").unwrap();
        let (lat, lng) = resolve_coordinate_columns(&table, Some("Name"), None).unwrap();
        assert_eq!(lat, "Name");
        assert_eq!(lng, "Longitude");
    }
}
