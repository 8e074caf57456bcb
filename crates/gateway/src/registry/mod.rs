//! Provider registry, rate limiting, selection, and validation.
//!
//! - [`ProviderRegistry`]: registered providers and one limiter per provider
//! - [`RateLimiter`]: non-blocking token bucket
//! - [`ProviderSelector`]: scores healthy providers against a query
//! - [`RecordValidator`]: default record quality scoring

mod provider_registry;
mod rate_limiter;
mod selector;
mod validator;

pub use provider_registry::{ProviderRegistry, RegisteredProvider};
pub use rate_limiter::RateLimiter;
pub use selector::{ProviderScore, ProviderSelector, SelectionReport, SkipReason};
pub use validator::{
    RecordValidator, ValidationIssue, ValidationReport, ValidationSeverity, ValidatorConfig,
};
