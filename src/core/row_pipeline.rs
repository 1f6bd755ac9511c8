use crate::core::throttle::Throttle;
use crate::core::validator::validate_coordinates;
use crate::domain::model::{GeocodeSession, InputTable, OutputTable, RunCounters};
use crate::domain::ports::{ProgressReporter, ReverseGeocoder};
use crate::utils::error::Result;
use std::time::Duration;

/// Runs validation and reverse geocoding over every row, in order, one request at a time.
pub struct RowPipeline<G: ReverseGeocoder> {
    geocoder: G,
    throttle_interval: Duration,
    include_address_debug: bool,
}

impl<G: ReverseGeocoder> RowPipeline<G> {
    pub fn new(geocoder: G) -> Self {
        Self {
            geocoder,
            throttle_interval: Throttle::DEFAULT_INTERVAL,
            include_address_debug: false,
        }
    }

    pub fn with_throttle_interval(mut self, interval: Duration) -> Self {
        self.throttle_interval = interval;
        self
    }

    pub fn with_address_debug(mut self, enabled: bool) -> Self {
        self.include_address_debug = enabled;
        self
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    pub async fn run(
        &self,
        table: &InputTable,
        latitude_column: &str,
        longitude_column: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<GeocodeSession> {
        // 欄位不存在時在任何 API 呼叫前就失敗
        let lat_index = table.require_column(latitude_column)?;
        let lng_index = table.require_column(longitude_column)?;

        let total_rows = table.len();
        let mut output = OutputTable::from_input(table, self.include_address_debug);
        let mut counters = RunCounters::default();
        let mut throttle = Throttle::new(self.throttle_interval);

        tracing::info!(
            "🚀 Geocoding {} rows using columns '{}' / '{}'",
            total_rows,
            latitude_column,
            longitude_column
        );

        for (index, row) in table.rows().iter().enumerate() {
            let status_text = match validate_coordinates(&row[lat_index], &row[lng_index]) {
                Err(invalid) => {
                    let status = invalid.row_status();
                    tracing::debug!("Row {} not geocoded: {}", index + 1, invalid);
                    output.set(index, "commune", invalid.placeholder());
                    output.set_status(index, status);
                    counters.record(status);
                    format!(
                        "Row {} of {}: {} ({})",
                        index + 1,
                        total_rows,
                        status,
                        invalid
                    )
                }
                Ok(coordinates) => {
                    throttle.acquire().await;
                    tracing::debug!("Row {}: reverse geocoding {}", index + 1, coordinates);

                    let result = self.geocoder.reverse_geocode(coordinates).await;
                    if !result.is_success() {
                        tracing::warn!(
                            "⚠️ Row {} geocoding failed: {} - {}",
                            index + 1,
                            result.commune,
                            result.full_address
                        );
                    }
                    output.apply_result(index, &result);
                    counters.record(result.status.into());
                    format!(
                        "Processing row {} of {}: Geocoding coordinates...",
                        index + 1,
                        total_rows
                    )
                }
            };

            progress.on_progress(index + 1, total_rows, &status_text);
        }

        tracing::info!(
            "✅ Processing complete! {} successful, {} failed geocodes ({:.1}% success rate)",
            counters.successful,
            counters.failed,
            counters.success_rate()
        );

        Ok(GeocodeSession {
            output,
            original_columns: table.columns().to_vec(),
            latitude_column: latitude_column.to_string(),
            longitude_column: longitude_column.to_string(),
            counters,
        })
    }
}
