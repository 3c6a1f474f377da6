use crate::adapters::ensembl::DEFAULT_ENSEMBL_SERVER;
use crate::adapters::gnomad::{DEFAULT_GNOMAD_DATASET, DEFAULT_GNOMAD_ENDPOINT};
use crate::domain::FailurePolicy;
use crate::utils::error::{LiftoverError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub liftover: LiftoverConfig,
    pub annotation: AnnotationConfig,
    pub frequency: FrequencyConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Chain files for each direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiftoverConfig {
    pub grch37_to_38: PathBuf,
    pub grch38_to_37: PathBuf,
}

impl Default for LiftoverConfig {
    fn default() -> Self {
        Self {
            grch37_to_38: PathBuf::from("data/hg19ToHg38.over.chain.gz"),
            grch38_to_37: PathBuf::from("data/hg38ToHg19.over.chain.gz"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    pub server: String,
    pub failure_policy: FailurePolicy,
    /// Also annotate the submitted coordinate in single lookups.
    pub annotate_source: bool,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_ENSEMBL_SERVER.to_string(),
            failure_policy: FailurePolicy::DegradeToEmpty,
            annotate_source: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyConfig {
    pub endpoint: String,
    pub dataset: String,
    pub failure_policy: FailurePolicy,
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GNOMAD_ENDPOINT.to_string(),
            dataset: DEFAULT_GNOMAD_DATASET.to_string(),
            failure_policy: FailurePolicy::Propagate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_batch_rows: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_batch_rows: 10_000,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| LiftoverError::ConfigError {
            message: format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LiftoverError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ENSEMBL_SERVER})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LiftoverError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("server.host", &self.server.host)?;
        validation::validate_positive_number("server.max_upload_bytes", self.server.max_upload_bytes, 1)?;

        validation::validate_path(
            "liftover.grch37_to_38",
            &self.liftover.grch37_to_38.to_string_lossy(),
        )?;
        validation::validate_path(
            "liftover.grch38_to_37",
            &self.liftover.grch38_to_37.to_string_lossy(),
        )?;

        validation::validate_url("annotation.server", &self.annotation.server)?;
        validation::validate_url("frequency.endpoint", &self.frequency.endpoint)?;
        validation::validate_non_empty_string("frequency.dataset", &self.frequency.dataset)?;

        validation::validate_positive_number("limits.max_batch_rows", self.limits.max_batch_rows, 1)?;
        Ok(())
    }
}
