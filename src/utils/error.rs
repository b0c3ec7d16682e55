use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("CSV parse error: {message}")]
    ParseError { message: String },

    #[error("Missing required columns: {}", missing.join(", "))]
    SchemaError { missing: Vec<String> },

    #[error("API error{}: {message}", status.map(|s| format!(" (status {})", s)).unwrap_or_default())]
    ApiError { status: Option<u16>, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error on '{field}': {message}")]
    ValidationError { field: String, message: String },

    #[error("Unknown command: {input}")]
    UnknownCommand { input: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Schema,
    Remote,
    Configuration,
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
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::ParseError { .. }
            | AppError::ValidationError { .. }
            | AppError::UnknownCommand { .. } => ErrorCategory::Input,
            AppError::SchemaError { .. } => ErrorCategory::Schema,
            AppError::ApiError { .. } => ErrorCategory::Remote,
            AppError::ConfigError { .. } | AppError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            AppError::IoError(_) | AppError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Schema => ErrorSeverity::High,
            ErrorCategory::Remote => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 給使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            AppError::ParseError { message } => format!("Error processing file: {}", message),
            AppError::SchemaError { missing } => missing
                .iter()
                .map(|col| format!("'{}' column is required but not found in the CSV!", col))
                .collect::<Vec<_>>()
                .join("\n"),
            AppError::ApiError { message, .. } => format!("API call failed: {}", message),
            AppError::ValidationError { field, message } => format!("{} ({})", message, field),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AppError::ParseError { .. } => {
                "Please make sure your CSV file is properly formatted and contains the required columns."
            }
            AppError::SchemaError { .. } => {
                "Add the missing columns to the CSV header or adjust csv.required_columns in the config."
            }
            AppError::ApiError { status: None, .. } => {
                "Check network connectivity and the api.base_url setting, then try again."
            }
            AppError::ApiError { .. } => {
                "Check the request payload and that the API key is valid."
            }
            AppError::ConfigError { .. } | AppError::InvalidConfigValueError { .. } => {
                "Review the configuration file and required environment variables such as AGENT_HIVE_API_KEY."
            }
            AppError::ValidationError { .. } => "Provide all required input fields and try again.",
            AppError::UnknownCommand { .. } => "Type 'help' to list available commands.",
            AppError::IoError(_) => "Check that the file exists and the output directory is writable.",
            AppError::SerializationError(_) => "Check that the input is valid JSON.",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_missing_columns() {
        let err = AppError::SchemaError {
            missing: vec!["email".to_string(), "name".to_string()],
        };
        assert_eq!(err.to_string(), "Missing required columns: email, name");
        assert_eq!(err.category(), ErrorCategory::Schema);
        assert!(err.user_friendly_message().contains("'email' column is required"));
    }

    #[test]
    fn test_api_error_display_with_and_without_status() {
        assert_eq!(
            AppError::api(Some(502), "bad gateway").to_string(),
            "API error (status 502): bad gateway"
        );
        assert_eq!(
            AppError::api(None, "timed out").to_string(),
            "API error: timed out"
        );
    }

    #[test]
    fn test_every_variant_is_classified() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let cases = [
            (AppError::parse("x"), ErrorCategory::Input),
            (AppError::SchemaError { missing: vec!["Email".to_string()] }, ErrorCategory::Schema),
            (AppError::api(None, "x"), ErrorCategory::Remote),
            (AppError::IoError(io), ErrorCategory::System),
            (AppError::SerializationError(json), ErrorCategory::System),
            (AppError::config("x"), ErrorCategory::Configuration),
            (
                AppError::InvalidConfigValueError {
                    field: "api.timeout_seconds".to_string(),
                    value: "0".to_string(),
                    reason: "must be positive".to_string(),
                },
                ErrorCategory::Configuration,
            ),
            (AppError::validation("input", "x"), ErrorCategory::Input),
            (AppError::UnknownCommand { input: "dance".to_string() }, ErrorCategory::Input),
        ];

        for (err, category) in cases {
            assert_eq!(err.category(), category, "{:?}", err);
            assert!(!err.user_friendly_message().is_empty());
            assert!(!err.recovery_suggestion().is_empty());
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert_eq!(AppError::api(Some(500), "x").severity(), ErrorSeverity::Medium);
        assert_eq!(AppError::config("x").severity(), ErrorSeverity::Critical);
        assert_eq!(AppError::parse("x").severity(), ErrorSeverity::High);
        assert!(ErrorSeverity::Critical > ErrorSeverity::Low);
    }
}
