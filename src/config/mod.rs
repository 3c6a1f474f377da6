pub mod toml_config;

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use toml_config::TomlConfig;

/// 未指定 --config 時，若工作目錄有此檔就載入
pub const DEFAULT_CONFIG_FILE: &str = "liftover.toml";

/// 設定檔來源：明確指定的路徑 > 工作目錄的 liftover.toml > 內建預設值
pub fn load_config(path: Option<&str>) -> crate::Result<TomlConfig> {
    load_config_from(path, Path::new(DEFAULT_CONFIG_FILE))
}

fn load_config_from(path: Option<&str>, fallback: &Path) -> crate::Result<TomlConfig> {
    match path {
        Some(path) => TomlConfig::from_file(path),
        None if fallback.exists() => {
            tracing::info!("📁 Loading configuration from: {}", fallback.display());
            TomlConfig::from_file(fallback)
        }
        None => Ok(TomlConfig::default()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "liftover-annotator")]
#[command(about = "GRCh37/GRCh38 coordinate conversion with gene, variant and allele-frequency annotation")]
pub struct CliConfig {
    /// Path to TOML configuration file (optional)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override server.host
    #[arg(long)]
    pub host: Option<String>,

    /// Override server.port
    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    /// 載入設定檔並套用命令列覆蓋
    pub fn load(&self) -> crate::Result<TomlConfig> {
        let mut config = load_config(self.config.as_deref())?;

        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }

        Ok(config)
    }
}
