use anyhow::Context;
use clap::Parser;
use mtd_collector::utils::error::CollectorError;
use mtd_collector::utils::{logger, validation::Validate};
use mtd_collector::{CliArgs, Collector, CollectorConfig, JsonlStorage, MtdClient, WeatherClient};
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    logger::init_logger(args.verbose, args.log_format);

    match args.load_env_file() {
        Ok(Some(path)) => tracing::debug!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => exit_fatal(&e),
    }

    // 載入並驗證配置，失敗就不啟動
    let config = match CollectorConfig::from_env().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => exit_fatal(&e),
    };

    if args.verbose {
        tracing::debug!("Collector config: {:?}", config);
    }

    if !config.weather_enabled() {
        tracing::info!(
            "MTDDATA_WEATHER_OUTPUT_PATH not set, so weather will not be saved"
        );
    }

    let departures = MtdClient::from_config(&config).unwrap_or_else(|e| exit_fatal(&e));
    let weather = if config.weather_enabled() {
        Some(WeatherClient::new().unwrap_or_else(|e| exit_fatal(&e)))
    } else {
        None
    };

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No requests will be made");
        perform_dry_run(&config, &departures, weather.as_ref());
        return Ok(());
    }

    let cancel = CancellationToken::new();
    watch_for_shutdown(cancel.clone())?;

    let collector = Collector::new(&config, departures, weather, JsonlStorage::new());
    collector.run(cancel).await;

    Ok(())
}

fn exit_fatal(e: &CollectorError) -> ! {
    tracing::error!("❌ {} (Severity: {:?})", e, e.severity());
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e);
    std::process::exit(1);
}

/// Cancels `cancel` on Ctrl-C, and on SIGTERM where available.
fn watch_for_shutdown(cancel: CancellationToken) -> anyhow::Result<()> {
    #[cfg(unix)]
    let mut terminate =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?;

    tokio::spawn(async move {
        #[cfg(unix)]
        let terminated = terminate.recv();
        #[cfg(not(unix))]
        let terminated = std::future::pending::<Option<()>>();

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!("Failed to listen for Ctrl-C: {}", e);
                    return;
                }
                tracing::info!("Received Ctrl-C, shutting down");
            }
            _ = terminated => tracing::info!("Received SIGTERM, shutting down"),
        }
        cancel.cancel();
    });

    Ok(())
}

fn perform_dry_run(
    config: &CollectorConfig,
    departures: &MtdClient,
    weather: Option<&WeatherClient>,
) {
    println!("🔍 Dry Run Analysis:");
    println!();
    println!("⏱️ Schedule:");
    println!("  Interval: {:?}", config.update_interval);
    println!("  First fetch: one interval after startup");
    println!();
    println!("📡 Departures ({} requests per tick):", config.stop_ids.len());
    for stop_id in &config.stop_ids {
        println!("  GET {}?key=<redacted>&stop_id={}&pt=60", departures.endpoint(), stop_id);
    }
    println!("  Output: {}", config.output_path.display());
    println!();
    match (weather, &config.weather_output_path) {
        (Some(client), Some(path)) => {
            println!("🌤️ Weather:");
            println!(
                "  GET {}?current={}",
                client.endpoint(),
                WeatherClient::current_fields()
            );
            println!("  Output: {}", path.display());
        }
        _ => println!("🌤️ Weather: disabled"),
    }
    println!();
    println!("✅ Dry run analysis complete.");
}
