use clap::Parser;
use sheet_geocoder::core::ConfigProvider;
use sheet_geocoder::utils::{logger, validation::Validate};
use sheet_geocoder::{GeocodeEngine, LocalStorage, SpreadsheetPipeline, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-geocode")]
#[command(about = "Geocode a spreadsheet using a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "geocoder.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the input file from config
    #[arg(long)]
    input: Option<String>,

    /// Inspect the input without calling the API
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    let verbose = args.verbose || config.log_level() == Some("debug");
    logger::init_cli_logger(verbose);

    tracing::info!("🚀 Starting TOML-based geocoder");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(input) = args.input {
        tracing::info!("🔧 Input overridden to: {}", input);
        config.input.path = input;
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config);

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let pipeline = SpreadsheetPipeline::with_locationiq(LocalStorage::default(), config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no API requests will be made");
        let inspection = pipeline.inspect().await?;
        println!(
            "📌 latitude='{}' longitude='{}': {} valid coordinate pairs out of {} rows",
            inspection.latitude_column,
            inspection.longitude_column,
            inspection.valid_rows,
            inspection.total_rows
        );
        return Ok(());
    }

    let engine = GeocodeEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            println!("✅ Geocoding completed successfully!");
            println!("📁 Output saved to: {}", output_path);
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ Geocoding failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("{}", e.cli_report());
            std::process::exit(e.exit_code());
        }
    }
}

fn display_config_summary(config: &TomlConfig) {
    tracing::info!("📋 Configuration Summary:");
    tracing::info!("  Input: {}", config.input_path());
    tracing::info!("  Endpoint: {}", config.api_endpoint());
    tracing::info!("  Timeout: {:?}", config.request_timeout());
    tracing::info!("  Throttle: {:?} between requests", config.throttle_interval());
    tracing::info!(
        "  Export: {} ({:?})",
        config.output_path(),
        config.export_format()
    );
}
