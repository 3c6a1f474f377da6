use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use liftover_annotator::utils::{logger, validation::Validate};
use liftover_annotator::{build_router, AppState, ChainMappings, CliConfig, CoordinateConverter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting liftover-annotator v{}", env!("CARGO_PKG_VERSION"));

    let config = match cli.load().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    if cli.verbose {
        tracing::debug!("Loaded config: {:?}", config);
    }

    // 鏈檔一次載入，之後唯讀共享
    let mappings = ChainMappings::from_files(&config.liftover.grch37_to_38, &config.liftover.grch38_to_37)
        .context("failed to load chain files")?;
    let converter = Arc::new(CoordinateConverter::new(mappings));

    let state = AppState::from_config(&config, converter);
    let app = build_router(state, config.server.max_upload_bytes);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    tracing::info!("🚀 Listening on http://{}", address);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
