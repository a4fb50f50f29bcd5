use attempt_etl::config::LoggingConfig;
use attempt_etl::core::sink::PreviewSink;
use attempt_etl::core::RecordSink;
use attempt_etl::utils::{logger, retention, validation::Validate};
use attempt_etl::{
    AppConfig, AttemptPipeline, CliConfig, EtlEngine, EtlError, HttpFetcher, PostgresSink,
    RunReport,
};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;

const PREVIEW_ROWS: usize = 5;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = CliConfig::parse();

    let mut config = match AppConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            let context = format!("Failed to load config file '{}'", cli.config);
            let log_dir = LoggingConfig::default().log_dir;
            if let Err(log_err) = logger::log_startup_failure(Path::new(&log_dir), &context, &e) {
                eprintln!("⚠️ Could not write the failure to {}: {}", log_dir, log_err);
            }
            return ExitCode::from(1);
        }
    };

    // 初始化日誌
    let log_dir = config.log_dir();
    let _guard = match logger::init_cli_logger(&config.logging, cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            return ExitCode::from(1);
        }
    };

    tracing::info!("Starting attempt-etl with config {}", cli.config);
    config.override_dates(cli.start_date.clone(), cli.end_date.clone());

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        return ExitCode::from(1);
    }

    if !cli.skip_retention {
        let now = chrono::Local::now().naive_local();
        match retention::prune_logs(&log_dir, config.logging.retention_days, now) {
            Ok(report) => tracing::info!(
                "Log retention: {} removed, {} kept, {} skipped, {} failed",
                report.deleted.len(),
                report.kept,
                report.skipped.len(),
                report.failed.len()
            ),
            Err(e) => tracing::warn!("Log retention failed: {}", e),
        }
    }

    tracing::info!(
        "Rows are appended without deduplication; overlapping date ranges insert duplicates"
    );

    let fetcher = match HttpFetcher::new(config.api.clone()) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            tracing::error!("❌ {}", e);
            return ExitCode::from(1);
        }
    };

    let outcome = if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be written to the database");
        run(fetcher, PreviewSink { limit: PREVIEW_ROWS }).await
    } else {
        run(fetcher, PostgresSink::from_config(&config.database)).await
    };

    match outcome {
        Ok(report) => {
            if let Some(stage) = report.degraded {
                println!("⚠️ ETL run finished without data ({:?} stage failed, see log)", stage);
            } else {
                println!(
                    "✅ ETL run finished: {} fetched, {} rows written",
                    report.fetched, report.rows_written
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            ExitCode::from(2)
        }
    }
}

async fn run<K: RecordSink>(fetcher: HttpFetcher, sink: K) -> Result<RunReport, EtlError> {
    let engine = EtlEngine::new(AttemptPipeline::new(fetcher, sink));
    engine.run().await
}
