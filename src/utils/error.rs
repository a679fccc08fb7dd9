use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Token signing failed: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Telegram API error {code}: {description}")]
    TelegramError { code: i64, description: String },

    #[error("{service} responded with status {status}: {body}")]
    UpstreamError {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Timed out waiting for {what}")]
    TimeoutError { what: String },

    #[error("Catalog error: {message}")]
    CatalogError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Upstream,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BotError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BotError::MissingConfigError { .. } | BotError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            BotError::HttpError(_) | BotError::TimeoutError { .. } => ErrorCategory::Network,
            BotError::TelegramError { .. } | BotError::UpstreamError { .. } => {
                ErrorCategory::Upstream
            }
            BotError::SerializationError(_)
            | BotError::CsvError(_)
            | BotError::CatalogError { .. } => ErrorCategory::Data,
            BotError::IoError(_) | BotError::JwtError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BotError::TimeoutError { .. } => ErrorSeverity::Low,
            BotError::HttpError(_)
            | BotError::TelegramError { .. }
            | BotError::UpstreamError { .. } => ErrorSeverity::Medium,
            BotError::SerializationError(_)
            | BotError::CsvError(_)
            | BotError::CatalogError { .. } => ErrorSeverity::High,
            BotError::MissingConfigError { .. }
            | BotError::InvalidConfigValueError { .. }
            | BotError::IoError(_)
            | BotError::JwtError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            BotError::MissingConfigError { field } => {
                format!("Set {} in the environment or in the config file", field)
            }
            BotError::InvalidConfigValueError { field, .. } => {
                format!("Check the value of {}", field)
            }
            BotError::HttpError(_) => "Check network connectivity and retry".to_string(),
            BotError::TelegramError { code: 401, .. } => {
                "Check TELEGRAM_BOT_TOKEN, the bot token was rejected".to_string()
            }
            BotError::TelegramError { .. } => {
                "Inspect the Telegram error description; the request may be malformed".to_string()
            }
            BotError::UpstreamError { service, .. } => {
                format!("Check the {} credentials and quota", service)
            }
            BotError::TimeoutError { .. } => "The service was slow; retry later".to_string(),
            BotError::JwtError(_) => {
                "Check that GOOGLE_CREDENTIALS_JSON holds a valid service-account private key"
                    .to_string()
            }
            BotError::SerializationError(_) | BotError::CsvError(_) => {
                "The upstream payload could not be parsed; check the sheet layout".to_string()
            }
            BotError::CatalogError { .. } => {
                "Make sure the sheet has a header row and at least one venue".to_string()
            }
            BotError::IoError(_) => "Check file paths and permissions".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Upstream => format!("External service problem: {}", self),
            ErrorCategory::Data => format!("Data problem: {}", self),
            ErrorCategory::System => format!("System problem: {}", self),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
