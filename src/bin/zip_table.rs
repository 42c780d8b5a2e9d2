use clap::Parser;
use txpower::config::TableArgs;
use txpower::core::zip_mapper::{MapperSettings, DEFAULT_VERIFY_BELOW};
use txpower::utils::error::ErrorSeverity;
use txpower::utils::{logger, validation::Validate};
use txpower::{LocalStorage, TableEngine, ZipTablePipeline};

/// Inputs are read relative to the working directory, not the output root.
fn absolute(path: &str) -> std::io::Result<String> {
    Ok(std::path::absolute(path)?.to_string_lossy().into_owned())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = TableArgs::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);
    tracing::info!("Starting ZIP table build");
    if args.verbose {
        tracing::debug!("Table args: {:?}", args);
    }

    // 驗證參數
    if let Err(e) = args.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    args.input = absolute(&args.input)?;
    if let Some(overrides) = &args.overrides {
        args.overrides = Some(absolute(overrides)?);
    }

    let monitor_enabled = args.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 建立存儲和管道
    let settings = MapperSettings {
        neighbor_window: args.neighbor_window,
        verify_below: DEFAULT_VERIFY_BELOW,
    };
    let storage = LocalStorage::new(args.output_path.clone());
    let output_root = args.output_path.clone();
    let pipeline = ZipTablePipeline::with_settings(storage, args, settings);
    let engine = TableEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok((bundle, stats)) => {
            let location = std::path::Path::new(&output_root).join(&bundle);
            tracing::info!("✅ ZIP table build completed");
            tracing::info!("📁 Bundle saved to: {}", location.display());
            println!(
                "✅ Built {} mappings ({} deregulated, {} low confidence, {} rejected)",
                stats.total, stats.deregulated, stats.low_confidence, stats.rejected
            );
            println!("📁 Bundle saved to: {}", location.display());
        }
        Err(e) => {
            tracing::error!(
                "❌ ZIP table build failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
