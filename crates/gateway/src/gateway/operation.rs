//! The five gateway operations as values the orchestrator can run uniformly.

use async_trait::async_trait;

use crate::cache::cache_key;
use crate::context::RequestContext;
use crate::errors::ProviderError;
use crate::models::{BusinessQuery, BusinessRecord, NewsItem, OperationKind};
use crate::provider::BusinessDataProvider;
use crate::registry::{RegisteredProvider, ValidationReport};

/// What the response cache stores.
#[derive(Clone, Debug)]
pub(crate) enum CachedPayload {
    Record(BusinessRecord),
    News(Vec<NewsItem>),
}

/// Operation outputs that can round-trip through the cache.
pub(crate) trait Cacheable: Clone + Send + Sync + Sized + 'static {
    fn into_payload(self) -> CachedPayload;
    fn from_payload(payload: CachedPayload) -> Option<Self>;
}

impl Cacheable for BusinessRecord {
    fn into_payload(self) -> CachedPayload {
        CachedPayload::Record(self)
    }

    fn from_payload(payload: CachedPayload) -> Option<Self> {
        match payload {
            CachedPayload::Record(record) => Some(record),
            CachedPayload::News(_) => None,
        }
    }
}

impl Cacheable for Vec<NewsItem> {
    fn into_payload(self) -> CachedPayload {
        CachedPayload::News(self)
    }

    fn from_payload(payload: CachedPayload) -> Option<Self> {
        match payload {
            CachedPayload::News(items) => Some(items),
            CachedPayload::Record(_) => None,
        }
    }
}

#[async_trait]
pub(crate) trait Operation: Send + Sync {
    type Output: Cacheable;

    fn kind(&self) -> OperationKind;

    fn cache_key(&self) -> Result<String, serde_json::Error>;

    async fn call(
        &self,
        provider: &dyn BusinessDataProvider,
        ctx: &RequestContext,
    ) -> Result<Self::Output, ProviderError>;

    /// Post-call validation by the selected provider. `None` skips the gate.
    fn validate(
        &self,
        _selected: &RegisteredProvider,
        _output: &Self::Output,
    ) -> Option<ValidationReport> {
        None
    }
}

pub(crate) struct Search<'a> {
    pub query: &'a BusinessQuery,
}

#[async_trait]
impl<'a> Operation for Search<'a> {
    type Output = BusinessRecord;

    fn kind(&self) -> OperationKind {
        OperationKind::Search
    }

    fn cache_key(&self) -> Result<String, serde_json::Error> {
        cache_key(OperationKind::Search, self.query)
    }

    async fn call(
        &self,
        provider: &dyn BusinessDataProvider,
        ctx: &RequestContext,
    ) -> Result<BusinessRecord, ProviderError> {
        provider.search_business(ctx, self.query).await
    }

    fn validate(
        &self,
        selected: &RegisteredProvider,
        output: &BusinessRecord,
    ) -> Option<ValidationReport> {
        Some(selected.provider().validate_data(output))
    }
}

/// Details, financial, or compliance lookup by id on a named provider.
pub(crate) struct RecordLookup<'a> {
    pub kind: OperationKind,
    pub id: &'a str,
    pub provider: &'a str,
}

#[async_trait]
impl<'a> Operation for RecordLookup<'a> {
    type Output = BusinessRecord;

    fn kind(&self) -> OperationKind {
        self.kind
    }

    fn cache_key(&self) -> Result<String, serde_json::Error> {
        cache_key(self.kind, &(self.id, self.provider))
    }

    async fn call(
        &self,
        provider: &dyn BusinessDataProvider,
        ctx: &RequestContext,
    ) -> Result<BusinessRecord, ProviderError> {
        match self.kind {
            OperationKind::Details => provider.get_business_details(ctx, self.id).await,
            OperationKind::Financial => provider.get_financial_data(ctx, self.id).await,
            OperationKind::Compliance => provider.get_compliance_data(ctx, self.id).await,
            other => Err(provider.not_supported(other)),
        }
    }
}

pub(crate) struct NewsLookup<'a> {
    pub id: &'a str,
    pub provider: &'a str,
}

#[async_trait]
impl<'a> Operation for NewsLookup<'a> {
    type Output = Vec<NewsItem>;

    fn kind(&self) -> OperationKind {
        OperationKind::News
    }

    fn cache_key(&self) -> Result<String, serde_json::Error> {
        cache_key(OperationKind::News, &(self.id, self.provider))
    }

    async fn call(
        &self,
        provider: &dyn BusinessDataProvider,
        ctx: &RequestContext,
    ) -> Result<Vec<NewsItem>, ProviderError> {
        provider.get_news_data(ctx, self.id).await
    }
}
