//! Provider contract and adapters
//!
//! - `traits` - The `BusinessDataProvider` trait
//! - `capabilities` - Descriptor types (capabilities, costs, rate limits)
//! - `quota_counter` - Daily/monthly usage counter for adapters with quotas
//! - `opencorporates` - HTTP adapter for the OpenCorporates registry API

mod capabilities;
mod quota_counter;
mod traits;

pub mod opencorporates;

pub(crate) use capabilities::unit_score;
pub use capabilities::{CapabilitySet, CostTable, ProviderDescriptor, RateLimit};
pub use quota_counter::QuotaCounter;
pub use traits::BusinessDataProvider;
