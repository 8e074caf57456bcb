//! OpenCorporates registry provider.
//!
//! Covers company search and company lookup via the v0.4 REST API:
//! - `/companies/search` for `search_business`
//! - `/companies/{jurisdiction}/{number}` for `get_business_details`
//!
//! Financial, compliance, and news data are not offered by this source.
//! Free accounts are limited to 50 calls per day and 200 per month.
//! API documentation: https://api.opencorporates.com/documentation/API-Reference

mod models;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::context::RequestContext;
use crate::errors::ProviderError;
use crate::models::{
    BusinessQuery, BusinessRecord, CountryCoverage, OperationKind, ProviderType, QuotaSnapshot,
};
use crate::provider::{
    BusinessDataProvider, CapabilitySet, CostTable, ProviderDescriptor, QuotaCounter, RateLimit,
};

use models::{CompanyResults, Envelope, ErrorBody, SearchResults};

const BASE_URL: &str = "https://api.opencorporates.com/v0.4";
const PROVIDER_NAME: &str = "opencorporates";
const NAMESPACE: &str = "oc";

const FREE_DAILY_LIMIT: u64 = 50;
const FREE_MONTHLY_LIMIT: u64 = 200;
const DEFAULT_PER_PAGE: u32 = 5;

/// OpenCorporates company registry provider.
pub struct OpenCorporatesProvider {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    healthy: AtomicBool,
    quota: QuotaCounter,
}

impl OpenCorporatesProvider {
    /// Create a provider. Without a token the public (heavily throttled) tier is used.
    pub fn new(api_token: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: BASE_URL.to_string(),
            api_token,
            healthy: AtomicBool::new(true),
            quota: QuotaCounter::new(FREE_DAILY_LIMIT, FREE_MONTHLY_LIMIT),
        }
    }

    /// Point the provider at a different host, e.g. a local mirror.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the account's quota limits.
    pub fn with_quota(mut self, daily_limit: u64, monthly_limit: u64) -> Self {
        self.quota = QuotaCounter::new(daily_limit, monthly_limit);
        self
    }

    /// Toggle the health flag, e.g. from an external status poller.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::Relaxed);
    }

    /// Make a GET request and decode the JSON envelope.
    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.client.get(&url).query(params);
        if let Some(token) = &self.api_token {
            request = request.query(&[("api_token", token)]);
        }

        debug!("OpenCorporates request: {} with {} params", path, params.len());

        self.quota.record_call();

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    provider: PROVIDER_NAME.to_string(),
                }
            } else {
                ProviderError::Network(e)
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(ProviderError::Network)?;

        if !status.is_success() {
            return Err(map_status(status, path, &body));
        }

        serde_json::from_str::<Envelope<T>>(&body)
            .map(|envelope| envelope.results)
            .map_err(|e| {
                warn!("OpenCorporates: failed to decode {}: {}", path, e);
                ProviderError::InvalidResponse {
                    provider: PROVIDER_NAME.to_string(),
                    message: e.to_string(),
                }
            })
    }

    /// Race a request against the caller's context.
    async fn fetch_with_context<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        tokio::select! {
            biased;
            _ = ctx.done() => Err(ProviderError::Cancelled {
                provider: PROVIDER_NAME.to_string(),
            }),
            result = self.fetch(path, params) => result,
        }
    }
}

/// Build search parameters from a query.
fn search_params(query: &BusinessQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();

    let term = query
        .name
        .as_deref()
        .or(query.registration_number.as_deref())
        .or(query.tax_id.as_deref());
    if let Some(term) = term {
        params.push(("q", term.to_string()));
    }

    if let Some(country) = query.country.as_deref() {
        let country = country.to_ascii_lowercase();
        match query.state.as_deref() {
            Some(state) => params.push((
                "jurisdiction_code",
                format!("{}_{}", country, state.to_ascii_lowercase()),
            )),
            None => params.push(("country_code", country)),
        }
    }

    let per_page = query.limit.unwrap_or(DEFAULT_PER_PAGE).clamp(1, 100);
    params.push(("per_page", per_page.to_string()));
    params
}

/// Accepts `oc:us_de/123` or bare `us_de/123`. Returns `(jurisdiction, number)`.
fn native_id(id: &str) -> Option<(&str, &str)> {
    let native = match BusinessRecord::split_id(id) {
        Some((NAMESPACE, native)) => native,
        Some(_) => return None,
        None => id,
    };
    let (jurisdiction, number) = native.split_once('/')?;
    if jurisdiction.is_empty() || number.is_empty() || number.contains('/') {
        return None;
    }
    Some((jurisdiction, number))
}

/// Company lookup path with each segment percent-encoded.
fn company_path(id: &str) -> Option<String> {
    let (jurisdiction, number) = native_id(id)?;
    Some(format!(
        "/companies/{}/{}",
        encode(jurisdiction),
        encode(number)
    ))
}

fn map_status(status: StatusCode, path: &str, body: &str) -> ProviderError {
    let provider = PROVIDER_NAME.to_string();
    match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { provider },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::Unauthorized { provider }
        }
        StatusCode::NOT_FOUND => ProviderError::NotFound(path.to_string()),
        _ => {
            let message = serde_json::from_str::<ErrorBody>(body)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| body.chars().take(200).collect());
            warn!("OpenCorporates {} returned {}: {}", path, status, message);
            ProviderError::Upstream {
                provider,
                message: format!("HTTP {}: {}", status.as_u16(), message),
            }
        }
    }
}

#[async_trait]
impl BusinessDataProvider for OpenCorporatesProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Registry
    }

    fn descriptor(&self) -> ProviderDescriptor {
        let coverage: CountryCoverage = [
            ("GB", 0.95),
            ("US", 0.85),
            ("CA", 0.8),
            ("AU", 0.8),
            ("NZ", 0.8),
            ("IE", 0.8),
            ("NL", 0.75),
            ("DE", 0.6),
            ("FR", 0.6),
        ]
        .into_iter()
        .collect();

        ProviderDescriptor::new(
            CapabilitySet::of(&[OperationKind::Search, OperationKind::Details]),
            0.8,
        )
        .with_coverage(coverage)
        .with_costs(
            CostTable::new()
                .with(OperationKind::Search, 0.5)
                .with(OperationKind::Details, 0.5),
        )
        .with_rate_limit(RateLimit::new(30.0, 5))
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    fn quota(&self) -> QuotaSnapshot {
        self.quota.snapshot()
    }

    async fn search_business(
        &self,
        ctx: &RequestContext,
        query: &BusinessQuery,
    ) -> Result<BusinessRecord, ProviderError> {
        let params = search_params(query);
        let results: SearchResults = self
            .fetch_with_context(ctx, "/companies/search", &params)
            .await?;

        debug!(
            "OpenCorporates search returned {} of {:?} companies",
            results.companies.len(),
            results.total_count
        );

        let wanted = query.name.as_deref().map(str::to_lowercase);
        let best = results
            .companies
            .into_iter()
            .next()
            .ok_or_else(|| {
                ProviderError::NotFound(query.name.clone().unwrap_or_else(|| "query".to_string()))
            })?
            .company;

        let confidence = match wanted {
            Some(name) if best.name.to_lowercase() == name => 0.95,
            Some(_) => 0.7,
            None => 0.6,
        };
        Ok(best.into_record(NAMESPACE, PROVIDER_NAME, confidence))
    }

    async fn get_business_details(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> Result<BusinessRecord, ProviderError> {
        let path = company_path(id).ok_or_else(|| ProviderError::NotFound(id.to_string()))?;
        let results: CompanyResults = self.fetch_with_context(ctx, &path, &[]).await?;
        Ok(results.company.into_record(NAMESPACE, PROVIDER_NAME, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_BODY: &str = r#"{
        "api_version": "0.4",
        "results": {
            "companies": [
                {
                    "company": {
                        "name": "ACME WIDGETS INC.",
                        "company_number": "5432101",
                        "jurisdiction_code": "us_de",
                        "incorporation_date": "2011-04-18",
                        "current_status": "Active",
                        "inactive": false,
                        "updated_at": "2024-01-05T10:20:30+00:00",
                        "registered_address": {
                            "street_address": "1209 Orange Street",
                            "locality": "Wilmington",
                            "region": "DE",
                            "postal_code": "19801",
                            "country": "United States"
                        },
                        "industry_codes": [
                            {
                                "industry_code": {
                                    "code": "332510",
                                    "description": "Hardware Manufacturing",
                                    "code_scheme_id": "us_naics_2007"
                                }
                            }
                        ]
                    }
                }
            ],
            "page": 1,
            "per_page": 5,
            "total_pages": 1,
            "total_count": 1
        }
    }"#;

    #[test]
    fn test_parse_search_results() {
        let envelope: Envelope<SearchResults> = serde_json::from_str(SEARCH_BODY).unwrap();
        let results = envelope.results;
        assert_eq!(results.total_count, Some(1));

        let company = results.companies.into_iter().next().unwrap().company;
        assert_eq!(company.native_id(), "us_de/5432101");

        let record = company.into_record(NAMESPACE, PROVIDER_NAME, 0.95);
        assert_eq!(record.id, "oc:us_de/5432101");
        assert_eq!(record.provider, "opencorporates");
        assert_eq!(record.registration_number.as_deref(), Some("5432101"));
        assert_eq!(record.status.as_deref(), Some("Active"));
        assert_eq!(record.industry_codes.len(), 1);
        assert_eq!(record.industry_codes[0].scheme, "us_naics_2007");
        assert_eq!(
            record.address.as_ref().and_then(|a| a.city.as_deref()),
            Some("Wilmington")
        );
        assert!((record.data_quality - 1.0).abs() < 1e-9);
        assert_eq!(record.confidence, 0.95);
    }

    #[test]
    fn test_sparse_company_gets_lower_quality() {
        let body = r#"{"results": {"company": {
            "name": "Shell Co",
            "company_number": "00012345",
            "jurisdiction_code": "gb",
            "inactive": true
        }}}"#;
        let envelope: Envelope<CompanyResults> = serde_json::from_str(body).unwrap();
        let record = envelope.results.company.into_record(NAMESPACE, PROVIDER_NAME, 1.0);

        assert_eq!(record.status.as_deref(), Some("Inactive"));
        assert!((record.data_quality - 0.6).abs() < 1e-9);
        assert!(record.address.is_none());
    }

    #[test]
    fn test_search_params_use_jurisdiction_when_state_given() {
        let query = BusinessQuery::by_name("Acme")
            .with_country("US")
            .with_state("DE")
            .with_limit(3);
        let params = search_params(&query);
        assert!(params.contains(&("q", "Acme".to_string())));
        assert!(params.contains(&("jurisdiction_code", "us_de".to_string())));
        assert!(params.contains(&("per_page", "3".to_string())));
    }

    #[test]
    fn test_search_params_fall_back_to_country_and_registration_number() {
        let query = BusinessQuery::new()
            .with_registration_number("00012345")
            .with_country("GB");
        let params = search_params(&query);
        assert!(params.contains(&("q", "00012345".to_string())));
        assert!(params.contains(&("country_code", "gb".to_string())));
        assert!(params.contains(&("per_page", DEFAULT_PER_PAGE.to_string())));
    }

    #[test]
    fn test_native_id_parsing() {
        assert_eq!(native_id("oc:us_de/5432101"), Some(("us_de", "5432101")));
        assert_eq!(native_id("gb/00012345"), Some(("gb", "00012345")));
        assert_eq!(native_id("dnb:123"), None);
        assert_eq!(native_id("oc:no-slash"), None);
        assert_eq!(native_id("oc:us_de/123/officers"), None);
    }

    #[test]
    fn test_company_path_encodes_segments() {
        assert_eq!(
            company_path("oc:us_de/5432101").as_deref(),
            Some("/companies/us_de/5432101")
        );
        assert_eq!(
            company_path("oc:gb/SC 123?x=1#frag").as_deref(),
            Some("/companies/gb/SC%20123%3Fx%3D1%23frag")
        );
        assert_eq!(
            company_path("oc:us?de/1").as_deref(),
            Some("/companies/us%3Fde/1")
        );
        assert_eq!(company_path("oc:us_de/123/officers?x=1"), None);
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, "/x", ""),
            ProviderError::RateLimited { .. }
        ));
        assert!(matches!(
            map_status(StatusCode::FORBIDDEN, "/x", ""),
            ProviderError::Unauthorized { .. }
        ));
        assert!(matches!(
            map_status(StatusCode::NOT_FOUND, "/x", ""),
            ProviderError::NotFound(_)
        ));

        let body = r#"{"error": {"message": "Invalid jurisdiction"}}"#;
        match map_status(StatusCode::BAD_REQUEST, "/x", body) {
            ProviderError::Upstream { message, .. } => {
                assert_eq!(message, "HTTP 400: Invalid jurisdiction");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_health_toggle() {
        let provider = OpenCorporatesProvider::new(None);
        assert!(provider.is_healthy());
        provider.set_healthy(false);
        assert!(!provider.is_healthy());
    }

    #[test]
    fn test_descriptor_declares_search_and_details_only() {
        let descriptor = OpenCorporatesProvider::new(None).descriptor();
        assert!(descriptor.capabilities.supports(OperationKind::Search));
        assert!(descriptor.capabilities.supports(OperationKind::Details));
        assert!(!descriptor.capabilities.supports(OperationKind::Financial));
        assert_eq!(descriptor.coverage.confidence("us"), 0.85);
        assert_eq!(descriptor.rate_limit, Some(RateLimit::new(30.0, 5)));
    }

    #[tokio::test]
    async fn test_unsupported_operation_is_rejected() {
        let provider = OpenCorporatesProvider::new(None);
        let err = provider
            .get_news_data(&RequestContext::new(), "oc:gb/1")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotSupported { .. }));
    }

    #[tokio::test]
    async fn test_malformed_id_fails_without_network() {
        let provider = OpenCorporatesProvider::new(None).with_base_url("http://127.0.0.1:9");
        let err = provider
            .get_business_details(&RequestContext::new(), "not-an-id")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_cancelled_context_abandons_request() {
        let provider = OpenCorporatesProvider::new(None).with_base_url("http://10.255.255.1");
        let ctx = RequestContext::new();
        ctx.cancel();
        let err = provider
            .search_business(&ctx, &BusinessQuery::by_name("Acme"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Cancelled { .. }));
    }
}
