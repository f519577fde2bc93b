use thiserror::Error;

/// Errors raised while issuing or checking CSRF tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsrfError {
    /// No token, or a value that is not shaped like one, was submitted.
    #[error("CSRF token missing")]
    Missing,

    /// The signature does not match this session.
    #[error("CSRF failed")]
    Invalid,

    /// The token was valid but its time limit has passed.
    #[error("CSRF token expired")]
    Expired,

    /// CSRF is enabled but no signing key was configured.
    #[error("a secret key is required for CSRF protection")]
    MissingSecretKey,

    /// The configured time limit cannot be represented as a timestamp.
    #[error("CSRF time limit is out of range")]
    TimeLimitOutOfRange,
}

impl CsrfError {
    /// Whether the error comes from checking a submitted token, as opposed
    /// to a misconfiguration.
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, Self::Missing | Self::Invalid | Self::Expired)
    }
}
