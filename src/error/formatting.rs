//! Error formatting utilities
//!
//! Formats errors for log lines and JSON API responses. Nothing here ever
//! sees plaintext credentials: errors only carry field names, endpoints
//! and status codes.

use crate::Error;
use std::error::Error as StdError;

/// Format error for display, including nested causes
pub fn format_error(error: &Error) -> String {
    let formatted = match error {
        Error::MissingConfiguration { auth_type, key } => {
            format!("{} strategy is missing configuration '{}'", auth_type, key)
        }

        Error::MissingCredentials { auth_type, field } => {
            format!("{} strategy is missing credential '{}'", auth_type, field)
        }

        Error::Auth { reason, endpoint } => match endpoint {
            Some(endpoint) => format!("Authentication failed at {}: {}", endpoint, reason),
            None => format!("Authentication failed: {}", reason),
        },

        Error::Network { message, endpoint } => match endpoint {
            Some(endpoint) => format!("Network error reaching {}: {}", endpoint, message),
            None => format!("Network error: {}", message),
        },

        Error::Timeout {
            operation,
            duration_secs,
        } => {
            format!(
                "Operation '{}' timed out after {} seconds",
                operation, duration_secs
            )
        }

        Error::Internal { message, context } => match context {
            Some(context) => format!("Internal error in {}: {}", context, message),
            None => format!("Internal error: {}", message),
        },

        // For everything else, use the Display implementation
        _ => error.to_string(),
    };

    let mut result = formatted;
    let mut source = error.source();

    while let Some(cause) = source {
        if !result.contains(&cause.to_string()) {
            result = format!("{} (caused by {})", result, cause);
        }
        source = cause.source();
    }

    result
}

/// Format error for JSON API responses
pub fn format_error_for_api(error: &Error) -> serde_json::Value {
    let mut body = serde_json::json!({
        "error": format_error(error),
        "category": error.category(),
        "retryable": error.is_retryable(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    if let Some(kind) = error.auth_failure() {
        body["failure"] = serde_json::json!(kind);
    }

    body
}

/// Format error for logging with structured data
pub fn format_error_for_logging(error: &Error) -> serde_json::Value {
    let mut log_data = serde_json::json!({
        "message": format_error(error),
        "category": error.category(),
        "retryable": error.is_retryable(),
    });

    match error {
        Error::NonSuccessStatus { status, endpoint } => {
            log_data["status"] = serde_json::Value::Number((*status).into());
            log_data["endpoint"] = serde_json::Value::String(endpoint.clone());
        }
        Error::NoTokenInResponse { endpoint } | Error::NoCookiesReceived { endpoint } => {
            log_data["endpoint"] = serde_json::Value::String(endpoint.clone());
        }
        Error::Timeout { duration_secs, .. } => {
            log_data["timeout_duration"] = serde_json::Value::Number((*duration_secs).into());
        }
        Error::SourceMismatch {
            session_id,
            expected,
            actual,
        } => {
            log_data["session_id"] = serde_json::Value::String(session_id.clone());
            log_data["expected_source"] = serde_json::Value::String(expected.clone());
            log_data["actual_source"] = serde_json::Value::String(actual.clone());
        }
        _ => {}
    }

    log_data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuthType;

    #[test]
    fn test_missing_configuration_formatting() {
        let error = Error::missing_configuration(AuthType::Cookie, "loginUrl");
        let formatted = format_error(&error);

        assert!(formatted.contains("cookie strategy"));
        assert!(formatted.contains("loginUrl"));
    }

    #[test]
    fn test_nested_error_formatting() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let wrapped_error = Error::Io(io_error);

        let formatted = format_error(&wrapped_error);
        assert!(formatted.contains("File not found"));
    }

    #[test]
    fn test_config_error_formatting() {
        let error = Error::config("network.https_proxy", "Invalid URL format");
        let formatted = format_error(&error);

        assert!(formatted.contains("Configuration error in network.https_proxy"));
        assert!(formatted.contains("Invalid URL format"));
    }

    #[test]
    fn test_api_error_formatting() {
        let error = Error::timeout("token request", 10);
        let api_response = format_error_for_api(&error);

        assert!(
            api_response["error"]
                .as_str()
                .unwrap()
                .contains("timed out")
        );
        assert_eq!(api_response["category"].as_str().unwrap(), "network");
        assert_eq!(api_response["failure"].as_str().unwrap(), "network_failure");
        assert!(api_response["retryable"].as_bool().unwrap());
        assert!(api_response["timestamp"].is_string());
    }

    #[test]
    fn test_logging_error_formatting() {
        let error = Error::NonSuccessStatus {
            status: 401,
            endpoint: "https://x.test/login".to_string(),
        };
        let log_data = format_error_for_logging(&error);

        assert!(log_data["message"].as_str().unwrap().contains("401"));
        assert_eq!(log_data["category"].as_str().unwrap(), "authentication");
        assert_eq!(log_data["status"].as_u64().unwrap(), 401);
        assert_eq!(log_data["endpoint"].as_str().unwrap(), "https://x.test/login");
    }
}
