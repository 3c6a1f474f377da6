use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use liftover_annotator::config::load_config;
use liftover_annotator::core::batch::{self, BatchFormat};
use liftover_annotator::utils::{logger, validation::Validate};
use liftover_annotator::{
    ChainMappings, ConversionDirection, CoordinateConverter, EnsemblClient, LiftoverPipeline,
};

#[derive(Parser)]
#[command(name = "batch_lift")]
#[command(about = "Convert and annotate a CSV/TSV file of coordinates without the web server")]
struct Args {
    /// Input table with `chromosome` and `position` columns (.csv, .txt, .tsv)
    #[arg(short, long)]
    input: PathBuf,

    /// Conversion direction: 37_to_38 or 38_to_37
    #[arg(short, long)]
    direction: String,

    /// Output CSV path (defaults to converted_coordinates_{direction}.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to TOML configuration file (optional)
    #[arg(short, long)]
    config: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    match run(&args).await {
        Ok(output) => {
            tracing::info!("✅ Batch conversion completed");
            println!("✅ Results written to: {}", output.display());
        }
        Err(e) => {
            tracing::error!("❌ Batch conversion failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    }
}

async fn run(args: &Args) -> liftover_annotator::Result<PathBuf> {
    let direction: ConversionDirection = args.direction.parse()?;

    let config = load_config(args.config.as_deref())?;
    config.validate()?;

    let filename = file_name(&args.input);
    let format = BatchFormat::from_filename(&filename)?;
    let data = std::fs::read(&args.input)?;
    let coordinates = batch::read_coordinates(&data, format, config.limits.max_batch_rows)?;
    tracing::info!("📁 Read {} coordinates from {}", coordinates.len(), args.input.display());

    let mappings = ChainMappings::from_files(&config.liftover.grch37_to_38, &config.liftover.grch38_to_37)?;
    let annotator = EnsemblClient::new(
        config.annotation.server.clone(),
        config.annotation.failure_policy,
    );
    let pipeline = LiftoverPipeline::new(Arc::new(CoordinateConverter::new(mappings)), annotator);

    let rows = pipeline.run_batch(direction, &coordinates).await?;
    let output = batch::write_results(&rows)?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(batch::output_filename(direction)));
    std::fs::write(&output_path, output)?;
    Ok(output_path)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
