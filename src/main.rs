use clap::Parser;
use sheet_geocoder::app::spreadsheet_pipeline::TableInspection;
use sheet_geocoder::utils::{logger, validation::Validate};
use sheet_geocoder::{CliConfig, GeocodeEngine, LocalStorage, SpreadsheetPipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("📍 Starting sheet-geocoder");
    if config.verbose {
        tracing::debug!("CLI config: input={}, output={}", config.input, config.output_path);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitor;
    let dry_run = config.dry_run;

    let pipeline = SpreadsheetPipeline::with_locationiq(LocalStorage::default(), config);

    if dry_run {
        tracing::info!("🔍 DRY RUN MODE - no API requests will be made");
        match pipeline.inspect().await {
            Ok(inspection) => {
                print_inspection(&inspection);
                return Ok(());
            }
            Err(e) => {
                eprintln!("{}", e.cli_report());
                std::process::exit(e.exit_code());
            }
        }
    }

    let engine = GeocodeEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Geocoding completed successfully!");
            println!("✅ Geocoding completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Geocoding failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("{}", e.cli_report());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn print_inspection(inspection: &TableInspection) {
    println!("🎯 Latitude candidates:  {:?}", inspection.candidates.latitude);
    println!("🎯 Longitude candidates: {:?}", inspection.candidates.longitude);
    println!(
        "📌 Using latitude='{}', longitude='{}'",
        inspection.latitude_column, inspection.longitude_column
    );

    println!("📊 Data preview:");
    for (lat, lng) in &inspection.preview {
        println!("   {:>14} | {}", lat, lng);
    }

    if inspection.valid_rows > 0 {
        println!(
            "Found {} valid coordinate pairs out of {} total rows.",
            inspection.valid_rows, inspection.total_rows
        );
    } else {
        println!("⚠️ No valid coordinates found. Please check your column selection.");
    }
}
