//! Provider capability, cost, and rate limit descriptors.
//!
//! A [`ProviderDescriptor`] is what the registry snapshots at registration
//! time and what the selector scores.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{BusinessQuery, CountryCoverage, OperationKind};

/// Default refill rate: 60 requests per minute.
const DEFAULT_REQUESTS_PER_MINUTE: f64 = 60.0;

/// Default bucket capacity.
const DEFAULT_BURST: u32 = 10;

/// The subset of operations a provider implements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    pub search: bool,
    pub details: bool,
    pub financial: bool,
    pub compliance: bool,
    pub news: bool,
}

impl CapabilitySet {
    /// Every operation.
    pub fn all() -> Self {
        Self {
            search: true,
            details: true,
            financial: true,
            compliance: true,
            news: true,
        }
    }

    /// Exactly the listed operations.
    pub fn of(kinds: &[OperationKind]) -> Self {
        kinds.iter().fold(Self::default(), |set, kind| set.with(*kind))
    }

    pub fn with(mut self, kind: OperationKind) -> Self {
        match kind {
            OperationKind::Search => self.search = true,
            OperationKind::Details => self.details = true,
            OperationKind::Financial => self.financial = true,
            OperationKind::Compliance => self.compliance = true,
            OperationKind::News => self.news = true,
        }
        self
    }

    pub fn supports(&self, kind: OperationKind) -> bool {
        match kind {
            OperationKind::Search => self.search,
            OperationKind::Details => self.details,
            OperationKind::Financial => self.financial,
            OperationKind::Compliance => self.compliance,
            OperationKind::News => self.news,
        }
    }

    /// Fraction of the optional data sets requested by `query` that this set
    /// supports. Zero when the query requests none.
    pub fn feature_coverage(&self, query: &BusinessQuery) -> f64 {
        let requested = [
            (query.include_financial, self.financial),
            (query.include_compliance, self.compliance),
            (query.include_news, self.news),
        ];
        let wanted = requested.iter().filter(|(asked, _)| *asked).count();
        if wanted == 0 {
            return 0.0;
        }
        let supported = requested
            .iter()
            .filter(|(asked, supported)| *asked && *supported)
            .count();
        supported as f64 / wanted as f64
    }
}

/// Cost per operation kind, in the provider's billing unit. Missing kinds cost 0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CostTable(HashMap<OperationKind, f64>);

impl CostTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same cost for every operation.
    pub fn flat(cost: f64) -> Self {
        OperationKind::ALL
            .iter()
            .fold(Self::new(), |table, kind| table.with(*kind, cost))
    }

    pub fn with(mut self, kind: OperationKind, cost: f64) -> Self {
        self.0.insert(kind, cost);
        self
    }

    pub fn cost(&self, kind: OperationKind) -> f64 {
        self.0.get(&kind).copied().unwrap_or(0.0)
    }
}

/// Clamp into [0, 1], mapping NaN and infinities to 0.
pub(crate) fn unit_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Token bucket settings for a provider.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Refill rate. Zero means the bucket never refills past its initial burst.
    pub requests_per_minute: f64,

    /// Bucket capacity, and the number of tokens a fresh bucket starts with.
    pub burst: u32,
}

impl RateLimit {
    pub fn new(requests_per_minute: f64, burst: u32) -> Self {
        Self {
            requests_per_minute,
            burst,
        }
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            burst: DEFAULT_BURST,
        }
    }
}

/// Static metadata a provider declares about itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub capabilities: CapabilitySet,

    /// Base quality score in [0, 1].
    pub quality_score: f64,

    pub coverage: CountryCoverage,

    pub costs: CostTable,

    /// Declared limit. `None` defers to the gateway's global default.
    pub rate_limit: Option<RateLimit>,
}

impl ProviderDescriptor {
    /// `quality_score` is clamped into [0, 1]; a non-finite score becomes 0.
    pub fn new(capabilities: CapabilitySet, quality_score: f64) -> Self {
        Self {
            capabilities,
            quality_score: unit_score(quality_score),
            coverage: CountryCoverage::default(),
            costs: CostTable::default(),
            rate_limit: None,
        }
    }

    pub fn with_coverage(mut self, coverage: CountryCoverage) -> Self {
        self.coverage = coverage;
        self
    }

    pub fn with_costs(mut self, costs: CostTable) -> Self {
        self.costs = costs;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_sets_only_listed_operations() {
        let caps = CapabilitySet::of(&[OperationKind::Search, OperationKind::Financial]);
        assert!(caps.supports(OperationKind::Search));
        assert!(caps.supports(OperationKind::Financial));
        assert!(!caps.supports(OperationKind::Details));
        assert!(!caps.supports(OperationKind::News));
    }

    #[test]
    fn test_feature_coverage_fraction() {
        let caps = CapabilitySet::of(&[
            OperationKind::Search,
            OperationKind::Details,
            OperationKind::Financial,
        ]);
        let query = BusinessQuery::new()
            .include_financial()
            .include_compliance()
            .include_news();
        assert!((caps.feature_coverage(&query) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(CapabilitySet::all().feature_coverage(&query), 1.0);
    }

    #[test]
    fn test_feature_coverage_zero_when_nothing_requested() {
        assert_eq!(CapabilitySet::all().feature_coverage(&BusinessQuery::new()), 0.0);
    }

    #[test]
    fn test_cost_table_defaults_to_zero() {
        let costs = CostTable::new().with(OperationKind::Search, 2.5);
        assert_eq!(costs.cost(OperationKind::Search), 2.5);
        assert_eq!(costs.cost(OperationKind::News), 0.0);
        assert_eq!(CostTable::flat(1.0).cost(OperationKind::Compliance), 1.0);
    }
}
