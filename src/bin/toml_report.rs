use clap::Parser;
use std::collections::BTreeSet;
use tripsplit::core::{ConfigProvider, Pipeline};
use tripsplit::utils::{logger, validation::Validate};
use tripsplit::{LocalStorage, ReportEngine, ReportPipeline, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-report")]
#[command(about = "Settlement reports driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "tripsplit.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the display currency from config
    #[arg(long)]
    currency: Option<String>,

    /// Dry run - load and check the trip without writing a report
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based settlement report");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(currency) = args.currency {
        tracing::info!("🔧 Display currency overridden to: {}", currency);
        config.currency.display = Some(currency);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config);

    let pipeline = ReportPipeline::new(LocalStorage::default(), config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No report will be written");
        perform_dry_run(&pipeline).await?;
        return Ok(());
    }

    let engine = ReportEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Settlement report completed successfully!");
            println!("✅ Settlement report completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Settlement report failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig) {
    tracing::info!("📋 Report: {}", config.report.name);
    if let Some(description) = &config.report.description {
        tracing::info!("   {}", description);
    }
    tracing::info!("   Input: {:?}", config.input());
    tracing::info!(
        "   Display currency: {}",
        config.display_currency().unwrap_or("(trip default)")
    );
    tracing::info!("   Known currencies: {}", config.rate_table().codes().join(", "));
    tracing::info!(
        "   Policy: unknown_currency={}, empty_payers={}, dangling_member={}",
        config.policy.unknown_currency,
        config.policy.empty_payers,
        config.policy.dangling_member
    );
    if !config.filter().is_empty() {
        tracing::info!("   Filters: {:?}", config.filter());
    }
    let formats: Vec<String> = config
        .output_formats()
        .iter()
        .map(|format| format.to_string())
        .collect();
    tracing::info!("   Output: {} ({})", config.output_path(), formats.join(", "));
    if let Some(bundle) = config.bundle_name() {
        tracing::info!("   Bundle: {}", bundle);
    }
}

async fn perform_dry_run(pipeline: &ReportPipeline<LocalStorage, TomlConfig>) -> anyhow::Result<()> {
    let snapshot = pipeline.extract().await?;
    let display_currency = pipeline.resolve_display_currency(&snapshot);
    let in_scope = pipeline.config().filter().apply(&snapshot.expenses);

    println!("🔍 Dry run summary");
    if let Some(trip) = &snapshot.trip {
        println!("   Trip: {}", trip.name);
    }
    println!("   Members: {}", snapshot.members.len());
    println!(
        "   Expenses: {} ({} after filters)",
        snapshot.expenses.len(),
        in_scope.len()
    );
    println!("   Display currency: {}", display_currency);

    let unknown: BTreeSet<&str> = in_scope
        .iter()
        .map(|expense| expense.currency.as_str())
        .filter(|code| !pipeline.config().rate_table().contains(code))
        .collect();
    if !unknown.is_empty() {
        let codes: Vec<&str> = unknown.into_iter().collect();
        println!("   ⚠️ Currencies without a rate: {}", codes.join(", "));
    }

    Ok(())
}
