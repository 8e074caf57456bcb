//! Request orchestration.
//!
//! [`Gateway`] is the public façade. Every operation runs the same sequence:
//!
//! 1. Cache lookup (a hit returns immediately, with no token or cost charged)
//! 2. Provider selection (search) or lookup by name (direct operations)
//! 3. Rate limit check on the chosen provider
//! 4. Primary call, raced against the request context
//! 5. One fallback hop if the primary call failed
//! 6. Quality validation (search only)
//! 7. Cache store
//! 8. Cost tracking

mod cost;
mod operation;

pub use cost::{CostLedger, CostLine, CostTracker, NoopCostTracker};

use std::sync::Arc;

use log::{debug, info, warn};

use crate::cache::TtlCache;
use crate::config::{GatewayConfig, RateLimitPolicy};
use crate::context::{CancelReason, RequestContext};
use crate::errors::{ConfigError, GatewayError, ProviderError};
use crate::models::{BusinessQuery, BusinessRecord, NewsItem, OperationKind, QuotaSnapshot};
use crate::provider::BusinessDataProvider;
use crate::registry::{ProviderRegistry, ProviderSelector, RegisteredProvider, SelectionReport};

use operation::{CachedPayload, Cacheable, NewsLookup, Operation, RecordLookup, Search};

/// How the provider for a request is chosen.
enum Target<'a> {
    /// Best-scoring healthy provider for the query.
    Best(&'a BusinessQuery),
    /// Registered provider with this name.
    Named(&'a str),
}

/// Why a provider call produced no output.
enum CallFailure {
    Cancelled(CancelReason),
    Failed(ProviderError),
}

/// What went wrong with the primary before the fallback hop.
enum PrimaryFailure {
    Denied,
    Failed(ProviderError),
}

impl PrimaryFailure {
    fn into_error(self, provider: &str) -> GatewayError {
        match self {
            Self::Denied => GatewayError::RateLimited {
                provider: provider.to_string(),
            },
            Self::Failed(source) => GatewayError::ProviderCallFailed {
                provider: provider.to_string(),
                source,
            },
        }
    }
}

/// Business data gateway.
///
/// Cheap to share: wrap in an `Arc` and call from as many tasks as needed.
pub struct Gateway {
    registry: Arc<ProviderRegistry>,
    cache: TtlCache<CachedPayload>,
    selector: ProviderSelector,
    cost_tracker: Arc<dyn CostTracker>,
    config: GatewayConfig,
}

impl Gateway {
    /// Gateway with its own registry and no cost tracking, after validating `config`.
    pub fn try_new(config: GatewayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Like [`with_parts`](Self::with_parts), after validating `config`.
    pub fn try_with_parts(
        config: GatewayConfig,
        registry: Arc<ProviderRegistry>,
        cost_tracker: Arc<dyn CostTracker>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_parts(config, registry, cost_tracker))
    }

    /// Gateway with its own registry and no cost tracking.
    ///
    /// `config` is used as given. A quality threshold that is not a number
    /// rejects every search result; use [`try_new`](Self::try_new) to catch
    /// bad settings up front.
    pub fn new(config: GatewayConfig) -> Self {
        let registry = Arc::new(ProviderRegistry::with_rate_limits(
            config.default_rate_limit,
            config.provider_rate_limits.clone(),
        ));
        Self::with_parts(config, registry, Arc::new(NoopCostTracker))
    }

    /// Gateway over an existing registry and cost sink.
    pub fn with_parts(
        config: GatewayConfig,
        registry: Arc<ProviderRegistry>,
        cost_tracker: Arc<dyn CostTracker>,
    ) -> Self {
        Self {
            cache: TtlCache::new(config.cache_max_entries),
            selector: ProviderSelector::new(config.cost_optimization),
            registry,
            cost_tracker,
            config,
        }
    }

    pub fn with_cost_tracker(mut self, cost_tracker: Arc<dyn CostTracker>) -> Self {
        self.cost_tracker = cost_tracker;
        self
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Register a provider, replacing any provider of the same name.
    pub fn register_provider(&self, provider: Arc<dyn BusinessDataProvider>) {
        self.registry.register(provider);
    }

    /// Find a business using the best available provider.
    pub async fn search_business(
        &self,
        ctx: &RequestContext,
        query: &BusinessQuery,
    ) -> Result<BusinessRecord, GatewayError> {
        self.execute(ctx, &Search { query }, Target::Best(query)).await
    }

    /// Registry details for `id` from `provider_name`.
    ///
    /// An empty `provider_name` means the configured default provider.
    pub async fn get_business_details(
        &self,
        ctx: &RequestContext,
        id: &str,
        provider_name: &str,
    ) -> Result<BusinessRecord, GatewayError> {
        self.lookup_record(ctx, OperationKind::Details, id, provider_name)
            .await
    }

    pub async fn get_financial_data(
        &self,
        ctx: &RequestContext,
        id: &str,
        provider_name: &str,
    ) -> Result<BusinessRecord, GatewayError> {
        self.lookup_record(ctx, OperationKind::Financial, id, provider_name)
            .await
    }

    pub async fn get_compliance_data(
        &self,
        ctx: &RequestContext,
        id: &str,
        provider_name: &str,
    ) -> Result<BusinessRecord, GatewayError> {
        self.lookup_record(ctx, OperationKind::Compliance, id, provider_name)
            .await
    }

    pub async fn get_news_data(
        &self,
        ctx: &RequestContext,
        id: &str,
        provider_name: &str,
    ) -> Result<Vec<NewsItem>, GatewayError> {
        let provider = self.resolve_name(provider_name);
        let op = NewsLookup { id, provider };
        self.execute(ctx, &op, Target::Named(provider)).await
    }

    /// Score breakdown for `query` without calling any provider.
    pub fn rank_providers(&self, query: &BusinessQuery) -> SelectionReport {
        self.selector.rank(&self.registry, query)
    }

    pub fn quotas(&self) -> Vec<(String, QuotaSnapshot)> {
        self.registry.snapshot_quotas()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    async fn lookup_record(
        &self,
        ctx: &RequestContext,
        kind: OperationKind,
        id: &str,
        provider_name: &str,
    ) -> Result<BusinessRecord, GatewayError> {
        let provider = self.resolve_name(provider_name);
        let op = RecordLookup { kind, id, provider };
        self.execute(ctx, &op, Target::Named(provider)).await
    }

    /// Substitute the default provider for an empty name.
    fn resolve_name<'a>(&'a self, provider_name: &'a str) -> &'a str {
        if provider_name.is_empty() {
            self.config.default_provider.as_deref().unwrap_or("")
        } else {
            provider_name
        }
    }

    async fn execute<O: Operation>(
        &self,
        ctx: &RequestContext,
        op: &O,
        target: Target<'_>,
    ) -> Result<O::Output, GatewayError> {
        let kind = op.kind();

        let key = match op.cache_key() {
            Ok(key) => Some(key),
            Err(e) => {
                warn!("{}: arguments not cacheable: {}", kind, e);
                None
            }
        };
        if let Some(hit) = key
            .as_deref()
            .and_then(|key| self.cache.get(key))
            .and_then(<O::Output as Cacheable>::from_payload)
        {
            debug!("{}: cache hit (request {})", kind, ctx.request_id());
            return Ok(hit);
        }

        let primary = match target {
            Target::Best(query) => self
                .selector
                .select_best(&self.registry, query)
                .ok_or_else(|| {
                    warn!("{}: no healthy provider available", kind);
                    GatewayError::NoProviderAvailable
                })?,
            Target::Named(name) => {
                self.registry
                    .lookup(name)
                    .ok_or_else(|| GatewayError::ProviderNotFound {
                        provider: name.to_string(),
                    })?
            }
        };

        if let Some(reason) = ctx.check() {
            return Err(GatewayError::Cancelled {
                provider: primary.name().to_string(),
                reason,
            });
        }

        let (output, served) = if self.registry.allow(primary.name()) {
            match self.invoke(ctx, op, &primary).await {
                Ok(output) => (output, Arc::clone(&primary)),
                Err(CallFailure::Cancelled(reason)) => {
                    return Err(GatewayError::Cancelled {
                        provider: primary.name().to_string(),
                        reason,
                    });
                }
                Err(CallFailure::Failed(error)) => {
                    warn!("{}: provider '{}' failed: {}", kind, primary.name(), error);
                    self.fallback(ctx, op, &primary, PrimaryFailure::Failed(error))
                        .await?
                }
            }
        } else {
            match self.config.rate_limit_policy {
                RateLimitPolicy::FailFast => {
                    return Err(GatewayError::RateLimited {
                        provider: primary.name().to_string(),
                    });
                }
                RateLimitPolicy::FallbackOnDenial => {
                    self.fallback(ctx, op, &primary, PrimaryFailure::Denied)
                        .await?
                }
            }
        };

        if let Some(report) = op.validate(&primary, &output) {
            let threshold = self.config.quality_threshold;
            // NaN on either side fails the gate.
            let passes = report.quality_score.is_finite() && report.quality_score >= threshold;
            if !passes {
                warn!(
                    "{}: record from '{}' scored {:.2}, below {:.2} ({} issues)",
                    kind,
                    served.name(),
                    report.quality_score,
                    threshold,
                    report.issues.len()
                );
                return Err(GatewayError::QualityBelowThreshold {
                    provider: served.name().to_string(),
                    score: report.quality_score,
                    threshold,
                });
            }
        }

        if let Some(key) = key {
            self.cache
                .set(key, output.clone().into_payload(), self.config.cache_ttl());
        }

        self.cost_tracker
            .record(served.name(), kind, served.cost(kind));

        Ok(output)
    }

    /// The single fallback hop. Consumes no rate-limit token.
    async fn fallback<O: Operation>(
        &self,
        ctx: &RequestContext,
        op: &O,
        primary: &RegisteredProvider,
        failure: PrimaryFailure,
    ) -> Result<(O::Output, Arc<RegisteredProvider>), GatewayError> {
        let kind = op.kind();
        let fallback = match self.config.fallback_provider.as_deref() {
            Some(name) if name != primary.name() => {
                let entry = self.registry.lookup(name);
                if entry.is_none() {
                    warn!("{}: fallback provider '{}' is not registered", kind, name);
                }
                entry
            }
            _ => None,
        };
        let Some(fallback) = fallback else {
            return Err(failure.into_error(primary.name()));
        };

        info!(
            "{}: falling back from '{}' to '{}'",
            kind,
            primary.name(),
            fallback.name()
        );

        if let Some(reason) = ctx.check() {
            return Err(GatewayError::Cancelled {
                provider: fallback.name().to_string(),
                reason,
            });
        }

        match self.invoke(ctx, op, &fallback).await {
            Ok(output) => Ok((output, fallback)),
            Err(CallFailure::Cancelled(reason)) => Err(GatewayError::Cancelled {
                provider: fallback.name().to_string(),
                reason,
            }),
            Err(CallFailure::Failed(source)) => {
                warn!(
                    "{}: fallback provider '{}' failed: {}",
                    kind,
                    fallback.name(),
                    source
                );
                Err(GatewayError::ProviderCallFailed {
                    provider: fallback.name().to_string(),
                    source,
                })
            }
        }
    }

    /// Call `entry`, abandoning the call if the context finishes first.
    async fn invoke<O: Operation>(
        &self,
        ctx: &RequestContext,
        op: &O,
        entry: &RegisteredProvider,
    ) -> Result<O::Output, CallFailure> {
        let result = tokio::select! {
            biased;
            reason = ctx.done() => return Err(CallFailure::Cancelled(reason)),
            result = op.call(entry.provider(), ctx) => result,
        };
        result.map_err(|error| match ctx.check() {
            Some(reason) => CallFailure::Cancelled(reason),
            None => CallFailure::Failed(error),
        })
    }
}
