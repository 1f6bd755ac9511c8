use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Runs read → geocode → export and reports resource usage between phases.
pub struct GeocodeEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> GeocodeEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("📄 Reading input spreadsheet...");
        let table = self.pipeline.extract().await?;
        tracing::info!(
            "✅ File loaded: {} rows and {} columns",
            table.len(),
            table.columns().len()
        );
        self.monitor.log_stats("Read");

        tracing::info!("🌍 Geocoding rows...");
        let session = self.pipeline.transform(table).await?;
        tracing::info!(
            "📈 {} successful, {} failed ({:.1}% success rate)",
            session.counters.successful,
            session.counters.failed,
            session.counters.success_rate()
        );
        self.monitor.log_stats("Geocode");

        tracing::info!("💾 Exporting results...");
        let output_path = self.pipeline.load(session).await?;
        self.monitor.log_stats("Export");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
