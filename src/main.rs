use clap::Parser;
use glow_atelier::utils::error::BookingError;
use glow_atelier::utils::{logger, validation::Validate};
use glow_atelier::{server, AppConfig, AppState, CliConfig};

fn exit_with(e: &BookingError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    std::process::exit(e.severity().exit_code());
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting glow-atelier");
    tracing::debug!("CLI config: {:?}", cli);

    let mut config = match AppConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };
    if let Some(port) = cli.port {
        config.server.port = Some(port);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(&e);
    }
    tracing::info!("✅ Configuration loaded from {}", cli.config);

    let state = match AppState::from_config(config) {
        Ok(state) => state,
        Err(e) => exit_with(&e),
    };

    if let Err(e) = server::serve(state).await {
        exit_with(&e);
    }
}
