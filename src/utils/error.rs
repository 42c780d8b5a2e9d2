use axum::http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Zip archive operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid ZIP code '{value}': {reason}")]
    InvalidZip { value: String, reason: String },

    #[error("ZIP code {zip} is outside Texas")]
    NotTexas { zip: String },

    #[error("Unknown filter segment '{segment}'")]
    UnknownFacet { segment: String },

    #[error("Conflicting filters: {message}")]
    FacetConflict { message: String },

    #[error("Validation error on '{field}': {message}")]
    ValidationError { field: String, message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Upstream {service} failed: {message}")]
    UpstreamError {
        service: String,
        status: Option<u16>,
        message: String,
    },

    #[error("{service} is not configured")]
    NotConfigured { service: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}' = '{value}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Network,
    Upstream,
    Configuration,
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

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn upstream(service: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        AppError::UpstreamError {
            service: service.into(),
            status,
            message: message.into(),
        }
    }

    /// Machine-readable code carried in the JSON error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidZip { .. } => "INVALID_ZIP",
            AppError::NotTexas { .. } => "NOT_TEXAS",
            AppError::UnknownFacet { .. } => "UNKNOWN_FILTER",
            AppError::FacetConflict { .. } => "FILTER_CONFLICT",
            AppError::ValidationError { .. } => "VALIDATION_FAILED",
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::RateLimited { .. } => "RATE_LIMITED",
            AppError::UpstreamError { .. } | AppError::ApiError(_) => "UPSTREAM_UNAVAILABLE",
            AppError::NotConfigured { .. } => "SERVICE_NOT_CONFIGURED",
            AppError::ConfigError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::MissingConfigError { .. } => "CONFIGURATION_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::InvalidZip { .. }
            | AppError::NotTexas { .. }
            | AppError::UnknownFacet { .. }
            | AppError::FacetConflict { .. }
            | AppError::ValidationError { .. }
            | AppError::NotFound { .. }
            | AppError::RateLimited { .. } => ErrorCategory::Input,
            AppError::ApiError(_) => ErrorCategory::Network,
            AppError::UpstreamError { .. } | AppError::NotConfigured { .. } => {
                ErrorCategory::Upstream
            }
            AppError::ConfigError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::MissingConfigError { .. } => ErrorCategory::Configuration,
            AppError::CsvError(_)
            | AppError::SerializationError(_)
            | AppError::ProcessingError { .. } => ErrorCategory::Data,
            AppError::ZipError(_) | AppError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidZip { .. }
            | AppError::NotTexas { .. }
            | AppError::UnknownFacet { .. }
            | AppError::FacetConflict { .. }
            | AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::UpstreamError { .. } | AppError::ApiError(_) => StatusCode::BAD_GATEWAY,
            AppError::NotConfigured { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to a site visitor. Internal details stay in the logs.
    pub fn user_friendly_message(&self) -> String {
        match self {
            AppError::InvalidZip { .. } => "Please enter a valid 5-digit ZIP code.".to_string(),
            AppError::NotTexas { zip } => {
                format!("ZIP code {} is not in Texas. We only compare Texas electricity plans.", zip)
            }
            AppError::UnknownFacet { segment } => format!("'{}' is not a recognized filter.", segment),
            AppError::FacetConflict { message } => message.clone(),
            AppError::ValidationError { field, message } => format!("{}: {}", field, message),
            AppError::NotFound { message } => message.clone(),
            AppError::RateLimited { .. } => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            AppError::UpstreamError { .. } | AppError::ApiError(_) => {
                "Plan data is temporarily unavailable. Please try again shortly.".to_string()
            }
            AppError::NotConfigured { .. } => {
                "This lookup is not available right now.".to_string()
            }
            AppError::ConfigError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::MissingConfigError { .. } => format!("Configuration problem: {}", self),
            _ => "Something went wrong on our end.".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Check the request parameters and try again",
            ErrorCategory::Network => "Check network connectivity to the upstream API",
            ErrorCategory::Upstream => "Verify upstream API endpoints and credentials, then retry",
            ErrorCategory::Configuration => "Review the config file and environment variables",
            ErrorCategory::Data => "Inspect the input data files for malformed rows",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    /// Whether an upstream call that produced this error is worth repeating.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::ApiError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AppError::UpstreamError { status, .. } => match status {
                Some(code) => *code == 429 || *code >= 500,
                None => true,
            },
            _ => false,
        }
    }
}
