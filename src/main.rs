use clap::Parser;
use txpower::config::ServeArgs;
use txpower::utils::error::{AppError, ErrorSeverity};
use txpower::utils::{logger, validation::Validate};
use txpower::{start_server, AppState};

fn exit_code(e: &AppError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn report(context: &str, e: &AppError) -> ! {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(e).max(1));
}

#[tokio::main]
async fn main() {
    let args = ServeArgs::parse();

    // 載入配置：預設值 → TOML → 環境變數 → 命令列
    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            logger::init_cli_logger(args.verbose);
            report("Failed to load configuration", &e);
        }
    };

    // 初始化日誌
    logger::init_logger(config.logging.verbose, config.log_format());
    tracing::info!("Starting txpower {}", env!("CARGO_PKG_VERSION"));
    if config.logging.verbose {
        tracing::debug!("Server config: {:?}", config.server);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        report("Configuration validation failed", &e);
    }
    tracing::info!("✅ Configuration loaded and validated");

    // 建立共享狀態並啟動服務
    let state = match AppState::from_config(config).await {
        Ok(state) => state,
        Err(e) => report("Failed to initialise application state", &e),
    };

    if let Err(e) = start_server(state).await {
        report("Server error", &e);
    }
}
