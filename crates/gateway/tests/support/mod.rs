//! Mock provider and helpers for gateway behavior tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Once;
use std::time::Duration;

use async_trait::async_trait;
use bizsource_gateway::{
    Address, BusinessDataProvider, BusinessQuery, BusinessRecord, CapabilitySet, ComplianceData,
    CostTable, CountryCoverage, FinancialData, IndustryCode, NewsItem, OperationKind,
    ProviderDescriptor, ProviderError, ProviderType, RateLimit, RequestContext, ValidationReport,
};
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

static LOGGING: Once = Once::new();

/// Route `log` and `tracing` output to the test writer. Honors `RUST_LOG`.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// A complete record that passes default validation with score 0.95.
pub fn full_record(provider: &str, name: &str) -> BusinessRecord {
    BusinessRecord::new(provider, "42", provider, name)
        .with_registration_number("5432101")
        .with_tax_id("12-3456789")
        .with_status("Active")
        .with_incorporation_date(NaiveDate::from_ymd_opt(2011, 4, 18).unwrap())
        .with_address(Address {
            street: Some("1209 Orange Street".to_string()),
            city: Some("Wilmington".to_string()),
            state: Some("DE".to_string()),
            postal_code: Some("19801".to_string()),
            country: Some("US".to_string()),
        })
        .with_industry_code(IndustryCode {
            scheme: "NAICS".to_string(),
            code: "332510".to_string(),
            description: Some("Hardware Manufacturing".to_string()),
        })
        .with_scores(0.9, 0.9)
}

pub struct MockProvider {
    name: String,
    descriptor: ProviderDescriptor,
    healthy: AtomicBool,
    failing: AtomicBool,
    delay: Option<Duration>,
    validation_score: Option<f64>,
    pub calls: AtomicUsize,
}

impl MockProvider {
    /// Provider supporting every operation, with a generous rate limit.
    pub fn new(name: &str, quality: f64) -> Self {
        Self::with_descriptor(
            name,
            ProviderDescriptor::new(CapabilitySet::all(), quality)
                .with_rate_limit(RateLimit::new(600.0, 100)),
        )
    }

    pub fn with_descriptor(name: &str, descriptor: ProviderDescriptor) -> Self {
        Self {
            name: name.to_string(),
            descriptor,
            healthy: AtomicBool::new(true),
            failing: AtomicBool::new(false),
            delay: None,
            validation_score: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn rate_limited(mut self, limit: RateLimit) -> Self {
        self.descriptor.rate_limit = Some(limit);
        self
    }

    pub fn covering(mut self, country: &str, confidence: f64) -> Self {
        self.descriptor.coverage = CountryCoverage::new().with(country, confidence);
        self
    }

    pub fn costing(mut self, search_cost: f64) -> Self {
        self.descriptor.costs = CostTable::flat(search_cost);
        self
    }

    pub fn failing(self) -> Self {
        self.failing.store(true, Ordering::SeqCst);
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn scoring(mut self, score: f64) -> Self {
        self.validation_score = Some(score);
        self
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn respond<T>(&self, value: T) -> Result<T, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::Upstream {
                provider: self.name.clone(),
                message: "HTTP 503: service unavailable".to_string(),
            });
        }
        Ok(value)
    }
}

#[async_trait]
impl BusinessDataProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Commercial
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
        let name = query.name.as_deref().unwrap_or("Unnamed Holdings");
        self.respond(full_record(&self.name, name)).await
    }

    async fn get_business_details(
        &self,
        _ctx: &RequestContext,
        id: &str,
    ) -> Result<BusinessRecord, ProviderError> {
        self.respond(full_record(&self.name, id)).await
    }

    async fn get_financial_data(
        &self,
        _ctx: &RequestContext,
        id: &str,
    ) -> Result<BusinessRecord, ProviderError> {
        let record = full_record(&self.name, id).with_financial(FinancialData {
            currency: "USD".to_string(),
            revenue: Some(dec!(12500000.00)),
            net_income: Some(dec!(-250000.00)),
            employee_count: Some(84),
            ..FinancialData::default()
        });
        self.respond(record).await
    }

    async fn get_compliance_data(
        &self,
        _ctx: &RequestContext,
        id: &str,
    ) -> Result<BusinessRecord, ProviderError> {
        let record = full_record(&self.name, id).with_compliance(ComplianceData {
            sanctions_hit: false,
            pep_exposure: false,
            watchlists: vec!["OFAC SDN".to_string()],
            risk_score: Some(0.1),
            ..ComplianceData::default()
        });
        self.respond(record).await
    }

    async fn get_news_data(
        &self,
        _ctx: &RequestContext,
        id: &str,
    ) -> Result<Vec<NewsItem>, ProviderError> {
        let published = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let items = vec![
            NewsItem::new(format!("{} expands", id), "https://news.example/1", "Wire", published)
                .with_sentiment(0.4),
        ];
        self.respond(items).await
    }

    fn validate_data(&self, record: &BusinessRecord) -> ValidationReport {
        match self.validation_score {
            Some(score) => ValidationReport::passing(score),
            None => bizsource_gateway::RecordValidator::new().validate(record),
        }
    }

    fn cost_per_operation(&self, kind: OperationKind) -> f64 {
        self.descriptor.costs.cost(kind)
    }
}
