//! Provider selection.
//!
//! Scores every healthy provider against a query and picks the highest.
//!
//! | Term | Weight | Input |
//! |------|--------|-------|
//! | quality | 0.3 | descriptor base quality |
//! | coverage | 0.2 | coverage confidence for the query's country, 0 if absent |
//! | cost | 0.2 | `clamp(1 - cost_per_search / 10, 0, 1)`, only with cost optimization |
//! | feature | 0.3 | fraction of requested financial/compliance/news data supported |
//!
//! Exact ties go to the provider registered first.

use std::fmt;
use std::sync::Arc;

use log::debug;
use serde::Serialize;

use super::{ProviderRegistry, RegisteredProvider};
use crate::models::{BusinessQuery, OperationKind};
use crate::provider::unit_score;

const QUALITY_WEIGHT: f64 = 0.3;
const COVERAGE_WEIGHT: f64 = 0.2;
const COST_WEIGHT: f64 = 0.2;
const FEATURE_WEIGHT: f64 = 0.3;

/// Search cost at which the cost term reaches zero.
const COST_CEILING: f64 = 10.0;

/// Why a provider was left out of selection.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum SkipReason {
    /// The provider's health flag was false.
    Unhealthy,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Score breakdown for one provider.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProviderScore {
    pub provider: String,
    pub quality: f64,
    pub coverage: f64,
    pub cost: f64,
    pub feature: f64,
    pub total: f64,
}

/// Every candidate considered for a query, for diagnostics.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SelectionReport {
    /// Healthy providers in registration order.
    pub scores: Vec<ProviderScore>,
    pub skipped: Vec<(String, SkipReason)>,
    pub selected: Option<String>,
}

impl SelectionReport {
    /// One-line summary, e.g. `"alpha: 0.812 -> beta: 0.790 (selected alpha)"`.
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = self
            .scores
            .iter()
            .map(|s| format!("{}: {:.3}", s.provider, s.total))
            .collect();
        parts.extend(
            self.skipped
                .iter()
                .map(|(name, reason)| format!("{}: SKIPPED ({})", name, reason)),
        );
        let selected = self.selected.as_deref().unwrap_or("none");
        format!("{} (selected {})", parts.join(" -> "), selected)
    }
}

/// Scores providers against a query.
#[derive(Clone, Copy, Debug)]
pub struct ProviderSelector {
    cost_optimization: bool,
}

impl ProviderSelector {
    pub fn new(cost_optimization: bool) -> Self {
        Self { cost_optimization }
    }

    pub fn cost_optimization(&self) -> bool {
        self.cost_optimization
    }

    /// Score one provider. Health is not considered here.
    pub fn score(&self, provider: &RegisteredProvider, query: &BusinessQuery) -> ProviderScore {
        let descriptor = provider.descriptor();

        let quality = descriptor.quality_score * QUALITY_WEIGHT;

        let coverage = query
            .country
            .as_deref()
            .map(|country| descriptor.coverage.confidence(country) * COVERAGE_WEIGHT)
            .unwrap_or(0.0);

        let cost = if self.cost_optimization {
            let per_search = provider.cost(OperationKind::Search);
            unit_score(1.0 - per_search / COST_CEILING) * COST_WEIGHT
        } else {
            0.0
        };

        let feature = descriptor.capabilities.feature_coverage(query) * FEATURE_WEIGHT;

        ProviderScore {
            provider: provider.name().to_string(),
            quality,
            coverage,
            cost,
            feature,
            total: quality + coverage + cost + feature,
        }
    }

    /// Score every provider and record which were skipped.
    pub fn rank(&self, registry: &ProviderRegistry, query: &BusinessQuery) -> SelectionReport {
        self.rank_with_winner(registry, query).0
    }

    /// Highest-scoring healthy provider, or `None` when none is healthy.
    pub fn select_best(
        &self,
        registry: &ProviderRegistry,
        query: &BusinessQuery,
    ) -> Option<Arc<RegisteredProvider>> {
        let (report, winner) = self.rank_with_winner(registry, query);
        debug!("Provider selection: {}", report.summary());
        winner
    }

    fn rank_with_winner(
        &self,
        registry: &ProviderRegistry,
        query: &BusinessQuery,
    ) -> (SelectionReport, Option<Arc<RegisteredProvider>>) {
        let mut report = SelectionReport::default();
        let mut best: Option<(f64, Arc<RegisteredProvider>)> = None;

        for provider in registry.providers() {
            if !provider.is_healthy() {
                report
                    .skipped
                    .push((provider.name().to_string(), SkipReason::Unhealthy));
                continue;
            }

            let score = self.score(&provider, query);
            // Strictly greater: the earlier registration keeps an exact tie.
            let better = best
                .as_ref()
                .map_or(true, |(best_total, _)| score.total > *best_total);
            if better {
                best = Some((score.total, Arc::clone(&provider)));
            }
            report.scores.push(score);
        }

        let winner = best.map(|(_, provider)| provider);
        report.selected = winner.as_ref().map(|p| p.name().to_string());
        (report, winner)
    }
}

impl Default for ProviderSelector {
    fn default() -> Self {
        Self::new(true)
    }
}
