//! Bizsource Gateway Crate
//!
//! Aggregates business-registry, financial, compliance, and news data from
//! many independently rate-limited, variably priced providers behind one
//! query interface.
//!
//! # Overview
//!
//! For every request the gateway:
//! - Answers from a TTL cache when it can
//! - Picks the best healthy provider (quality, country coverage, cost, features)
//! - Enforces that provider's token bucket rate limit
//! - Falls back once to a configured secondary provider on failure
//! - Rejects search results that score below a quality threshold
//! - Reports what each call cost to a pluggable sink
//!
//! # Architecture
//!
//! ```text
//!  caller
//!    |
//!    v
//! +------------------+     hit     +------------------+
//! |     Gateway      | ----------> |    TtlCache      |
//! +------------------+             +------------------+
//!    | miss
//!    v
//! +------------------+             +------------------+
//! | ProviderSelector | ----------> | ProviderRegistry |  (providers + limiters)
//! +------------------+             +------------------+
//!    |
//!    v
//! +------------------+
//! |   RateLimiter    |  (token bucket, per provider)
//! +------------------+
//!    |
//!    v
//! +------------------+   error   +------------------+
//! | primary provider | --------> | fallback provider|
//! +------------------+           +------------------+
//!    |                              |
//!    v                              v
//! +------------------+     +------------------+
//! |  validate_data   | --> |   CostTracker    |
//! +------------------+     +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Gateway`] - Orchestrates the request sequence above
//! - [`BusinessDataProvider`] - Contract every data source implements
//! - [`BusinessQuery`] / [`BusinessRecord`] - Request and normalized result
//! - [`RequestContext`] - Cancellation and deadline for one call
//! - [`GatewayConfig`] - Cache, threshold, rate limit, and fallback settings
//! - [`GatewayError`] - Everything the gateway can fail with

pub mod cache;
pub mod config;
pub mod context;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod provider;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::TtlCache;
pub use config::{GatewayConfig, RateLimitPolicy};
pub use context::{CancelReason, RequestContext};
pub use errors::{ConfigError, GatewayError, ProviderError, RetryClass};
pub use gateway::{CostLedger, CostLine, CostTracker, Gateway, NoopCostTracker};
pub use models::{
    Address, BusinessQuery, BusinessRecord, ComplianceData, CountryCoverage, FinancialData,
    IndustryCode, NewsItem, OperationKind, ProviderType, QuotaSnapshot, SortBy,
};
pub use provider::opencorporates::OpenCorporatesProvider;
pub use provider::{BusinessDataProvider, CapabilitySet, CostTable, ProviderDescriptor, RateLimit};
pub use registry::{
    ProviderRegistry, ProviderSelector, RecordValidator, SelectionReport, ValidationReport,
};
