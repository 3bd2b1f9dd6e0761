//! Centralized Error Handling Module
//!
//! Every failure carries a unique string code for log grepping and
//! monitoring. Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - PROVIDER_xxx: Etherscan data provider errors
//! - POLICY_xxx: profile / decision policy errors
//! - API_xxx: API errors
//! - CFG_xxx: configuration errors
//! - WALLET_xxx: wallet input errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Provider Errors
    // ============================================
    /// Provider connection failed
    ProviderConnectionFailed,
    /// Provider request timeout
    ProviderTimeout,
    /// Provider rate limited (retries exhausted)
    ProviderRateLimited,
    /// Provider returned NOTOK / error response
    ProviderError,
    /// Provider response could not be parsed
    ProviderInvalidResponse,

    // ============================================
    // Policy Errors
    // ============================================
    /// Profile name not in the configured set
    PolicyUnknownProfile,

    // ============================================
    // API Errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Rate limit exceeded
    ApiRateLimited,
    /// Internal server error
    ApiInternalError,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Missing environment variable
    ConfigMissingEnv,
    /// Missing API key
    ConfigMissingApiKey,
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // Wallet Input Errors
    // ============================================
    /// Malformed wallet address
    WalletInvalidAddress,

    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProviderConnectionFailed => "PROVIDER_CONNECTION_FAILED",
            Self::ProviderTimeout => "PROVIDER_TIMEOUT",
            Self::ProviderRateLimited => "PROVIDER_RATE_LIMITED",
            Self::ProviderError => "PROVIDER_ERROR",
            Self::ProviderInvalidResponse => "PROVIDER_INVALID_RESPONSE",

            Self::PolicyUnknownProfile => "POLICY_UNKNOWN_PROFILE",

            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiRateLimited => "API_RATE_LIMITED",
            Self::ApiInternalError => "API_INTERNAL_ERROR",

            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigMissingApiKey => "CFG_MISSING_API_KEY",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::WalletInvalidAddress => "WALLET_INVALID_ADDRESS",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest
            | Self::WalletInvalidAddress
            | Self::PolicyUnknownProfile
            | Self::ConfigInvalidValue => 400,
            Self::ApiRateLimited | Self::ProviderRateLimited => 429,
            Self::ProviderTimeout => 504,
            _ => 500,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderTimeout | Self::ProviderRateLimited | Self::ProviderConnectionFailed
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Unknown profile name (client error, never silently defaulted)
    pub fn unknown_profile(name: &str) -> Self {
        Self::new(
            ErrorCode::PolicyUnknownProfile,
            format!("Unknown profile: '{}'. Supported: aave, morpho, conservative", name),
        )
    }

    /// Malformed wallet address
    pub fn invalid_address(addr: &str) -> Self {
        Self::new(
            ErrorCode::WalletInvalidAddress,
            format!("Invalid wallet address format: {}", addr),
        )
    }

    /// Provider returned NOTOK
    pub fn provider_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderError, msg)
    }

    /// Provider rate limited after retries exhausted
    pub fn provider_rate_limited(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderRateLimited, msg)
    }

    /// Missing API key
    pub fn missing_api_key(key_name: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissingApiKey,
            format!("Missing API key: {}", key_name),
        )
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// API internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::ProviderTimeout, "Provider request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::ProviderConnectionFailed, "Provider connection failed")
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::ProviderInvalidResponse, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::unknown_profile("compound");
        assert_eq!(err.code, ErrorCode::PolicyUnknownProfile);
        assert_eq!(err.code_str(), "POLICY_UNKNOWN_PROFILE");
        assert!(err.message.contains("compound"));
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::PolicyUnknownProfile.http_status(), 400);
        assert_eq!(ErrorCode::WalletInvalidAddress.http_status(), 400);
        assert_eq!(ErrorCode::ApiRateLimited.http_status(), 429);
        assert_eq!(ErrorCode::ProviderError.http_status(), 500);
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::ProviderTimeout.is_retryable());
        assert!(ErrorCode::ProviderRateLimited.is_retryable());
        assert!(!ErrorCode::PolicyUnknownProfile.is_retryable());
    }
}
