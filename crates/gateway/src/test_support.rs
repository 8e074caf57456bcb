//! Stub provider shared by unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::errors::ProviderError;
use crate::models::{BusinessQuery, BusinessRecord, CountryCoverage, OperationKind, ProviderType};
use crate::provider::{BusinessDataProvider, CapabilitySet, ProviderDescriptor};

pub(crate) struct StubProvider {
    name: String,
    descriptor: ProviderDescriptor,
    healthy: AtomicBool,
    pub calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(name: &str, quality: f64) -> Self {
        Self::with_descriptor(
            name,
            ProviderDescriptor::new(CapabilitySet::of(&[OperationKind::Search]), quality),
        )
    }

    pub fn with_descriptor(name: &str, descriptor: ProviderDescriptor) -> Self {
        Self {
            name: name.to_string(),
            descriptor,
            healthy: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn covering(name: &str, quality: f64, country: &str, confidence: f64) -> Self {
        let descriptor = ProviderDescriptor::new(CapabilitySet::of(&[OperationKind::Search]), quality)
            .with_coverage(CountryCoverage::new().with(country, confidence));
        Self::with_descriptor(name, descriptor)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

#[async_trait]
impl BusinessDataProvider for StubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Registry
    }

    fn descriptor(&self) -> ProviderDescriptor {
        self.descriptor.clone()
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    async fn search_business(
        &self,
        _ctx: &RequestContext,
        query: &BusinessQuery,
    ) -> Result<BusinessRecord, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = query.name.clone().unwrap_or_else(|| "Unnamed".to_string());
        Ok(BusinessRecord::new("stub", "1", self.name.clone(), name).with_scores(0.9, 0.9))
    }
}
