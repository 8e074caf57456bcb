//! Error types for the gateway and its provider adapters.
//!
//! - [`ProviderError`]: what an adapter returns when a call to its upstream fails
//! - [`GatewayError`]: what the gateway surfaces to callers
//! - [`ConfigError`]: rejected configuration values
//! - [`RetryClass`]: retry advice derived from a [`GatewayError`]

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors raised by a provider adapter.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The upstream registry has no record for the requested id or query.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The adapter does not implement this operation.
    #[error("Operation '{operation}' is not supported by provider '{provider}'")]
    NotSupported {
        /// The operation that was requested
        operation: String,
        /// The provider that rejected it
        provider: String,
    },

    /// The upstream service rejected the call with HTTP 429 or a quota error.
    #[error("Upstream rate limit hit: {provider}")]
    RateLimited {
        /// The provider whose upstream throttled the call
        provider: String,
    },

    /// The upstream call did not complete in time.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// Credentials were rejected by the upstream service.
    #[error("Unauthorized: {provider}")]
    Unauthorized {
        /// The provider that rejected the credentials
        provider: String,
    },

    /// The upstream service returned an error status.
    #[error("Upstream error: {provider} - {message}")]
    Upstream {
        /// The provider that returned the error
        provider: String,
        /// Status and body excerpt
        message: String,
    },

    /// The upstream response could not be decoded.
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse {
        /// The provider that returned the payload
        provider: String,
        /// What failed to decode
        message: String,
    },

    /// The request context was cancelled while the call was in flight.
    #[error("Call to {provider} was cancelled")]
    Cancelled {
        /// The provider whose call was abandoned
        provider: String,
    },

    /// Transport failure talking to the upstream service.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Errors surfaced by [`Gateway`](crate::Gateway) operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Selection found no healthy provider.
    #[error("No suitable provider found")]
    NoProviderAvailable,

    /// The selected provider has no token left in its bucket.
    #[error("Rate limit exceeded for provider {provider}")]
    RateLimited {
        /// The provider that was denied
        provider: String,
    },

    /// The provider call failed, and the fallback hop (if any) failed too.
    ///
    /// `source` is the terminal cause: the fallback's error when a fallback
    /// ran, otherwise the primary's error unchanged.
    #[error("Provider {provider} call failed: {source}")]
    ProviderCallFailed {
        /// The provider whose error is reported
        provider: String,
        /// The underlying adapter error
        #[source]
        source: ProviderError,
    },

    /// A record came back but scored below the configured quality threshold.
    #[error("Data quality {score:.2} from {provider} is below threshold {threshold:.2}")]
    QualityBelowThreshold {
        /// The provider that produced the record
        provider: String,
        /// The validation quality score
        score: f64,
        /// The configured minimum
        threshold: f64,
    },

    /// A direct-by-name operation named a provider that is not registered.
    #[error("Provider not found: {provider}")]
    ProviderNotFound {
        /// The name that was looked up
        provider: String,
    },

    /// The caller's context was cancelled or its deadline passed.
    #[error("Request to {provider} cancelled: {reason}")]
    Cancelled {
        /// The provider the request was headed for
        provider: String,
        /// Why the context finished
        reason: crate::context::CancelReason,
    },
}

impl GatewayError {
    /// Returns retry advice for this error.
    ///
    /// ```
    /// use bizsource_gateway::errors::{GatewayError, RetryClass};
    ///
    /// let error = GatewayError::RateLimited { provider: "opencorporates".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::AfterBackoff);
    ///
    /// let error = GatewayError::NoProviderAvailable;
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::NoProviderAvailable
            | Self::ProviderNotFound { .. }
            | Self::QualityBelowThreshold { .. } => RetryClass::Never,

            Self::RateLimited { .. } => RetryClass::AfterBackoff,

            Self::Cancelled { .. } => RetryClass::Immediately,

            Self::ProviderCallFailed { source, .. } => match source {
                ProviderError::RateLimited { .. } => RetryClass::AfterBackoff,
                ProviderError::Timeout { .. }
                | ProviderError::Cancelled { .. }
                | ProviderError::Network(_) => RetryClass::Immediately,
                ProviderError::Upstream { .. } => RetryClass::AfterBackoff,
                ProviderError::NotFound(_)
                | ProviderError::NotSupported { .. }
                | ProviderError::Unauthorized { .. }
                | ProviderError::InvalidResponse { .. } => RetryClass::Never,
            },
        }
    }

    /// The provider this error concerns, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::NoProviderAvailable => None,
            Self::RateLimited { provider }
            | Self::ProviderCallFailed { provider, .. }
            | Self::QualityBelowThreshold { provider, .. }
            | Self::ProviderNotFound { provider }
            | Self::Cancelled { provider, .. } => Some(provider),
        }
    }
}

/// Configuration values rejected by [`GatewayConfig::validate`](crate::GatewayConfig::validate).
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Quality threshold must be within [0, 1], got {0}")]
    InvalidQualityThreshold(f64),

    #[error("Rate limit for {scope} must be a finite, non-negative rate, got {rate}")]
    InvalidRateLimit { scope: String, rate: f64 },

    #[error("Invalid value for {key}: {value}")]
    InvalidEnvValue { key: String, value: String },
}
