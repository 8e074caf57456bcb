//! The provider capability contract.
//!
//! Every external data source is wrapped in one type implementing
//! [`BusinessDataProvider`]. The gateway only ever talks to this trait.

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::errors::ProviderError;
use crate::models::{BusinessQuery, BusinessRecord, NewsItem, OperationKind, ProviderType, QuotaSnapshot};
use crate::registry::{RecordValidator, ValidationReport};

use super::capabilities::ProviderDescriptor;

/// Trait for business data providers.
///
/// Only `name`, `provider_type`, and `descriptor` are required. Operations
/// the provider does not implement fall through to a
/// [`ProviderError::NotSupported`] default.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use bizsource_gateway::provider::{BusinessDataProvider, CapabilitySet, ProviderDescriptor};
///
/// struct RegistryMirror;
///
/// #[async_trait]
/// impl BusinessDataProvider for RegistryMirror {
///     fn name(&self) -> &str {
///         "registry_mirror"
///     }
///
///     fn provider_type(&self) -> ProviderType {
///         ProviderType::Registry
///     }
///
///     fn descriptor(&self) -> ProviderDescriptor {
///         ProviderDescriptor::new(CapabilitySet::of(&[OperationKind::Search]), 0.8)
///     }
///
///     async fn search_business(
///         &self,
///         ctx: &RequestContext,
///         query: &BusinessQuery,
///     ) -> Result<BusinessRecord, ProviderError> {
///         // ... call the upstream service
///     }
/// }
/// ```
#[async_trait]
pub trait BusinessDataProvider: Send + Sync {
    /// Unique name, used as the registry key and in every log line.
    fn name(&self) -> &str;

    fn provider_type(&self) -> ProviderType;

    /// Capabilities, quality, coverage, costs, and rate limit.
    ///
    /// Read once at registration; later changes are not picked up until the
    /// provider is registered again.
    fn descriptor(&self) -> ProviderDescriptor;

    /// Live health flag. Unhealthy providers are never selected.
    fn is_healthy(&self) -> bool {
        true
    }

    fn cost_per_operation(&self, kind: OperationKind) -> f64 {
        self.descriptor().costs.cost(kind)
    }

    /// Quota usage as the provider sees it. Advisory.
    fn quota(&self) -> QuotaSnapshot {
        QuotaSnapshot::unlimited()
    }

    /// Find the best-matching business for `query`.
    async fn search_business(
        &self,
        ctx: &RequestContext,
        query: &BusinessQuery,
    ) -> Result<BusinessRecord, ProviderError> {
        let _ = (ctx, query);
        Err(self.not_supported(OperationKind::Search))
    }

    /// Full registry record for `id`.
    async fn get_business_details(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> Result<BusinessRecord, ProviderError> {
        let _ = (ctx, id);
        Err(self.not_supported(OperationKind::Details))
    }

    /// Record for `id` with the financial sub-record populated.
    async fn get_financial_data(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> Result<BusinessRecord, ProviderError> {
        let _ = (ctx, id);
        Err(self.not_supported(OperationKind::Financial))
    }

    /// Record for `id` with the compliance sub-record populated.
    async fn get_compliance_data(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> Result<BusinessRecord, ProviderError> {
        let _ = (ctx, id);
        Err(self.not_supported(OperationKind::Compliance))
    }

    /// Recent news mentions for `id`.
    async fn get_news_data(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> Result<Vec<NewsItem>, ProviderError> {
        let _ = (ctx, id);
        Err(self.not_supported(OperationKind::News))
    }

    /// Score a record this provider produced.
    ///
    /// Default implementation runs the stock [`RecordValidator`].
    fn validate_data(&self, record: &BusinessRecord) -> ValidationReport {
        RecordValidator::new().validate(record)
    }

    #[doc(hidden)]
    fn not_supported(&self, kind: OperationKind) -> ProviderError {
        ProviderError::NotSupported {
            operation: kind.as_str().to_string(),
            provider: self.name().to_string(),
        }
    }
}
