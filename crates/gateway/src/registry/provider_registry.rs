//! Provider registry.
//!
//! Holds every registered provider together with a descriptor snapshot, and
//! one [`RateLimiter`] per provider. Providers and limiters live in two maps,
//! each behind its own lock, so registration never blocks token checks for
//! other requests for longer than a map insert.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info, warn};

use super::RateLimiter;
use crate::models::{OperationKind, QuotaSnapshot};
use crate::provider::{unit_score, BusinessDataProvider, ProviderDescriptor, RateLimit};

/// A provider plus the descriptor captured when it was registered.
pub struct RegisteredProvider {
    provider: Arc<dyn BusinessDataProvider>,
    descriptor: ProviderDescriptor,
    name: String,
}

impl RegisteredProvider {
    fn new(provider: Arc<dyn BusinessDataProvider>) -> Self {
        let mut descriptor = provider.descriptor();
        descriptor.quality_score = unit_score(descriptor.quality_score);
        // Costs as reported by `cost_per_operation`, not only the declared table.
        for kind in OperationKind::ALL {
            descriptor.costs = descriptor
                .costs
                .with(kind, provider.cost_per_operation(kind));
        }
        Self {
            name: provider.name().to_string(),
            provider,
            descriptor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> &dyn BusinessDataProvider {
        self.provider.as_ref()
    }

    pub fn provider_arc(&self) -> Arc<dyn BusinessDataProvider> {
        Arc::clone(&self.provider)
    }

    /// Snapshot taken at registration.
    pub fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    /// Live health flag.
    pub fn is_healthy(&self) -> bool {
        self.provider.is_healthy()
    }

    pub fn cost(&self, kind: OperationKind) -> f64 {
        self.descriptor.costs.cost(kind)
    }
}

impl std::fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("name", &self.name)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

#[derive(Default)]
struct ProviderTable {
    by_name: HashMap<String, Arc<RegisteredProvider>>,
    /// Names in first-registration order.
    order: Vec<String>,
}

/// Registry of providers and their rate limiters.
pub struct ProviderRegistry {
    providers: RwLock<ProviderTable>,
    limiters: RwLock<HashMap<String, Arc<RateLimiter>>>,
    default_rate_limit: RateLimit,
    /// Operator overrides by provider name; win over the provider's own limit.
    rate_limit_overrides: HashMap<String, RateLimit>,
}

impl ProviderRegistry {
    /// Empty registry using `RateLimit::default()` for providers that declare none.
    pub fn new() -> Self {
        Self::with_rate_limits(RateLimit::default(), HashMap::new())
    }

    /// Empty registry with a global default and per-provider overrides.
    pub fn with_rate_limits(
        default_rate_limit: RateLimit,
        rate_limit_overrides: HashMap<String, RateLimit>,
    ) -> Self {
        Self {
            providers: RwLock::new(ProviderTable::default()),
            limiters: RwLock::new(HashMap::new()),
            default_rate_limit,
            rate_limit_overrides,
        }
    }

    fn read_providers(&self) -> RwLockReadGuard<'_, ProviderTable> {
        self.providers.read().unwrap_or_else(|poisoned| {
            warn!("Provider table lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_providers(&self) -> RwLockWriteGuard<'_, ProviderTable> {
        self.providers.write().unwrap_or_else(|poisoned| {
            warn!("Provider table lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn read_limiters(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<RateLimiter>>> {
        self.limiters.read().unwrap_or_else(|poisoned| {
            warn!("Rate limiter map lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_limiters(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<RateLimiter>>> {
        self.limiters.write().unwrap_or_else(|poisoned| {
            warn!("Rate limiter map lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// The limit a provider's bucket is seeded from.
    ///
    /// Operator override, then the provider's declared limit, then the default.
    pub fn effective_rate_limit(&self, name: &str, descriptor: &ProviderDescriptor) -> RateLimit {
        self.rate_limit_overrides
            .get(name)
            .copied()
            .or(descriptor.rate_limit)
            .unwrap_or(self.default_rate_limit)
    }

    /// Register a provider, replacing any provider of the same name.
    ///
    /// A fresh, full rate limiter is stored before the provider becomes
    /// visible to lookups. Both are written while the provider table is
    /// locked, so concurrent registrations of one name leave a matching
    /// provider and limiter. Lock order is providers, then limiters. A
    /// replaced provider keeps its original position in registration order.
    pub fn register(&self, provider: Arc<dyn BusinessDataProvider>) {
        let entry = Arc::new(RegisteredProvider::new(provider));
        let name = entry.name().to_string();
        let limit = self.effective_rate_limit(&name, entry.descriptor());
        let limiter = Arc::new(RateLimiter::from_limit(&limit));

        let mut table = self.write_providers();
        self.write_limiters().insert(name.clone(), limiter);
        if table.by_name.insert(name.clone(), entry).is_some() {
            info!("Provider '{}' re-registered, limiter reset", name);
        } else {
            table.order.push(name.clone());
            info!(
                "Provider '{}' registered ({} req/min, burst {})",
                name, limit.requests_per_minute, limit.burst
            );
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<RegisteredProvider>> {
        self.read_providers().by_name.get(name).cloned()
    }

    /// Take one token from `name`'s bucket.
    ///
    /// Names without a limiter are allowed.
    pub fn allow(&self, name: &str) -> bool {
        let limiter = self.read_limiters().get(name).cloned();
        match limiter {
            Some(limiter) => {
                let allowed = limiter.allow();
                if !allowed {
                    debug!("Rate limiter: no token left for '{}'", name);
                }
                allowed
            }
            None => {
                debug!("Rate limiter: no bucket for '{}', allowing", name);
                true
            }
        }
    }

    pub fn remaining_tokens(&self, name: &str) -> Option<f64> {
        let limiter = self.read_limiters().get(name).cloned();
        limiter.map(|l| l.remaining_tokens())
    }

    /// All providers in registration order.
    pub fn providers(&self) -> Vec<Arc<RegisteredProvider>> {
        let table = self.read_providers();
        table
            .order
            .iter()
            .filter_map(|name| table.by_name.get(name).cloned())
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.read_providers().order.clone()
    }

    pub fn len(&self) -> usize {
        self.read_providers().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Quota snapshot from every provider, in registration order.
    pub fn snapshot_quotas(&self) -> Vec<(String, QuotaSnapshot)> {
        self.providers()
            .into_iter()
            .map(|entry| (entry.name().to_string(), entry.provider().quota()))
            .collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
