use thiserror::Error;

#[derive(Error, Debug)]
pub enum LiftoverError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Chain file error at line {line}: {message}")]
    ChainParseError { line: usize, message: String },

    #[error("Invalid input for {field}: {message}")]
    InvalidInputError { field: String, message: String },

    #[error("Batch input error: {message}")]
    BatchError { message: String },

    #[error("{service} query failed with status {status}: {body}")]
    UpstreamStatusError {
        service: String,
        status: u16,
        body: String,
    },

    #[error("{service} query returned errors: {message}")]
    UpstreamQueryError { service: String, message: String },
}

/// 錯誤分類，決定回應的 HTTP 狀態碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Upstream,
    Configuration,
    Internal,
}

impl LiftoverError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInputError { .. } | Self::BatchError { .. } | Self::CsvError(_) => {
                ErrorCategory::Input
            }
            Self::ApiError(_) | Self::UpstreamStatusError { .. } | Self::UpstreamQueryError { .. } => {
                ErrorCategory::Upstream
            }
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ChainParseError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::Internal,
        }
    }

    /// 給使用者看的訊息，內部細節只寫進日誌
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidInputError { .. } | Self::UpstreamStatusError { .. } => self.to_string(),
            Self::UpstreamQueryError { message, .. } => message.clone(),
            Self::BatchError { message } => message.clone(),
            Self::CsvError(_) => "Could not read the uploaded file".to_string(),
            Self::ApiError(_) => "An external service could not be reached".to_string(),
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ChainParseError { .. } => self.to_string(),
            Self::IoError(_) | Self::SerializationError(_) => {
                "An unexpected error occurred".to_string()
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Check the submitted chromosome, position and file format",
            ErrorCategory::Upstream => "The remote service may be unavailable, try again later",
            ErrorCategory::Configuration => "Check the configuration file and chain file paths",
            ErrorCategory::Internal => "Re-run with --verbose and inspect the logs",
        }
    }

    pub fn invalid_input(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidInputError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LiftoverError>;
