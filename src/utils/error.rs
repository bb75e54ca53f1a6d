use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("{feature} is not enabled for this site")]
    FeatureDisabled { feature: &'static str },

    #[error("Too many requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// 上游 API 回傳非 2xx，狀態碼與內容原樣轉發
    #[error("{service} responded with {status}")]
    UpstreamError {
        service: &'static str,
        status: u16,
        body: serde_json::Value,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Validation,
    Network,
    Upstream,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 根據錯誤嚴重程度決定退出碼
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,      // 警告，但成功
            ErrorSeverity::Medium => 2,   // 重試錯誤
            ErrorSeverity::High => 1,     // 處理錯誤
            ErrorSeverity::Critical => 3, // 系統錯誤
        }
    }
}

impl BookingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BookingError::ValidationError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        BookingError::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BookingError::ConfigError { .. }
            | BookingError::MissingConfigError { .. }
            | BookingError::InvalidConfigValueError { .. }
            | BookingError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            BookingError::ValidationError { .. }
            | BookingError::FeatureDisabled { .. }
            | BookingError::RateLimited { .. } => ErrorCategory::Validation,
            BookingError::ApiError(_) => ErrorCategory::Network,
            BookingError::UpstreamError { .. } => ErrorCategory::Upstream,
            BookingError::IoError(_) | BookingError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BookingError::ApiError(e) if e.is_timeout() => {
                "The payment or email provider took too long to respond".to_string()
            }
            BookingError::ApiError(_) => "Could not reach an external service".to_string(),
            BookingError::MissingConfigError { field } => {
                format!("Configuration is missing required field '{}'", field)
            }
            BookingError::UpstreamError { service, status, .. } => {
                format!("{} rejected the request (HTTP {})", service, status)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the TOML file and that every ${VAR} it references is exported"
            }
            ErrorCategory::Validation => "Fix the request payload and try again",
            ErrorCategory::Network => "Check network connectivity and the provider base URLs",
            ErrorCategory::Upstream => "Inspect the provider response body for details",
            ErrorCategory::System => "Check file permissions and disk space",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            BookingError::FeatureDisabled { .. } => StatusCode::NOT_FOUND,
            BookingError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            BookingError::UpstreamError { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            BookingError::ApiError(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            BookingError::ApiError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            BookingError::UpstreamError { body, .. } => (status, Json(body)).into_response(),
            BookingError::RateLimited { retry_after_secs } => {
                let body = serde_json::json!({
                    "error": format!("Too many requests, retry in {}s", retry_after_secs)
                });
                (
                    status,
                    [("retry-after", retry_after_secs.to_string())],
                    Json(body),
                )
                    .into_response()
            }
            other => {
                if status.is_server_error() {
                    tracing::error!("❌ {} (Category: {:?})", other, other.category());
                }
                let body = serde_json::json!({ "error": other.user_friendly_message() });
                (status, Json(body)).into_response()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_is_forwarded() {
        let err = BookingError::UpstreamError {
            service: "square",
            status: 402,
            body: serde_json::json!({"errors": [{"code": "CARD_DECLINED"}]}),
        };
        assert_eq!(err.status_code(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(err.category(), ErrorCategory::Upstream);
    }

    #[test]
    fn test_invalid_upstream_status_falls_back_to_bad_gateway() {
        let err = BookingError::UpstreamError {
            service: "resend",
            status: 1000,
            body: serde_json::Value::Null,
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_exit_codes_follow_severity() {
        assert_eq!(BookingError::validation("bad").severity().exit_code(), 0);
        let upstream = BookingError::UpstreamError {
            service: "square",
            status: 503,
            body: serde_json::Value::Null,
        };
        assert_eq!(upstream.severity().exit_code(), 2);
        assert_eq!(BookingError::config("bad").severity().exit_code(), 1);
        let io = BookingError::IoError(std::io::Error::other("disk full"));
        assert_eq!(io.severity().exit_code(), 3);
    }

    #[test]
    fn test_severity_ordering() {
        assert_eq!(BookingError::validation("bad").severity(), ErrorSeverity::Low);
        assert_eq!(BookingError::config("bad").severity(), ErrorSeverity::High);
        assert!(ErrorSeverity::Critical > ErrorSeverity::Medium);
    }
}
