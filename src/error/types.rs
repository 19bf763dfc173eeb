//! Credential selection error types

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Stable code for "no credential can serve this request"
pub const CODE_AUTH_UNAVAILABLE: &str = "auth_unavailable";
/// Stable code for "no credential with that ID"
pub const CODE_AUTH_NOT_FOUND: &str = "auth_not_found";

/// Why a pick declined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// The candidate list was empty
    NoCandidates,
    /// Every candidate was disabled or cooling down for the model
    AllBlocked,
    /// The top bucket resolved to a total weight of zero
    ZeroWeight,
    /// Summing the top bucket's weights would overflow
    WeightOverflow,
}

impl std::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCandidates => write!(f, "no credentials configured"),
            Self::AllBlocked => write!(f, "all credentials disabled or cooling down"),
            Self::ZeroWeight => write!(f, "total weight is zero"),
            Self::WeightOverflow => write!(f, "total weight overflows"),
        }
    }
}

/// Errors returned by credential selection and the registry
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("no auth available for provider {provider:?} model {model:?}: {reason}")]
    Unavailable {
        provider: String,
        model: String,
        reason: UnavailableReason,
        /// Earliest end of a cooldown, when everything was cooling down
        retry_after: Option<DateTime<Utc>>,
    },

    #[error("auth not found: {0}")]
    NotFound(String),
}

impl AuthError {
    pub fn unavailable(provider: &str, model: &str, reason: UnavailableReason) -> Self {
        AuthError::Unavailable {
            provider: provider.to_string(),
            model: model.to_string(),
            reason,
            retry_after: None,
        }
    }

    /// Machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Unavailable { .. } => CODE_AUTH_UNAVAILABLE,
            AuthError::NotFound(_) => CODE_AUTH_NOT_FOUND,
        }
    }

    /// The caller may try again later or on another provider path
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Unavailable { .. })
    }

    /// Convert to HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::Unavailable { .. } => 503, // Service Unavailable
            AuthError::NotFound(_) => 404,
        }
    }

    pub fn retry_after(&self) -> Option<DateTime<Utc>> {
        match self {
            AuthError::Unavailable { retry_after, .. } => *retry_after,
            AuthError::NotFound(_) => None,
        }
    }
}

/// Result type for credential selection
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AuthError::unavailable("gemini", "m", UnavailableReason::ZeroWeight);
        assert_eq!(err.code(), "auth_unavailable");
        assert_eq!(AuthError::NotFound("x".to_string()).code(), "auth_not_found");
    }

    #[test]
    fn test_error_status_codes() {
        let err = AuthError::unavailable("gemini", "m", UnavailableReason::AllBlocked);
        assert_eq!(err.status_code(), 503);
        assert!(err.is_retryable());
        assert_eq!(AuthError::NotFound("x".to_string()).status_code(), 404);
        assert!(!AuthError::NotFound("x".to_string()).is_retryable());
    }

    #[test]
    fn test_error_message() {
        let err = AuthError::unavailable("gemini", "flash", UnavailableReason::WeightOverflow);
        assert_eq!(
            err.to_string(),
            "no auth available for provider \"gemini\" model \"flash\": total weight overflows"
        );
    }
}
