//! Gateway data models
//!
//! - `types` - Identifiers and enums (OperationKind, ProviderType)
//! - `query` - Search request (BusinessQuery)
//! - `record` - Normalized output (BusinessRecord and its sub-records)
//! - `coverage` - Per-country coverage confidence (CountryCoverage)
//! - `quota` - Provider quota usage (QuotaSnapshot)

mod coverage;
mod query;
mod quota;
mod record;
mod types;

pub use coverage::CountryCoverage;
pub use query::{BusinessQuery, SortBy};
pub use quota::QuotaSnapshot;
pub use record::{
    Address, BusinessRecord, ComplianceData, FinancialData, IndustryCode, NewsItem,
};
pub use types::{CountryCode, OperationKind, ProviderName, ProviderType};
