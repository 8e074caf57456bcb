//! Cost accounting sinks.
//!
//! The gateway reports every served call to a [`CostTracker`]. Tracking is
//! bookkeeping only and never gates a request.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use log::warn;
use serde::Serialize;

use crate::models::OperationKind;

/// Receives one event per provider call that produced a result.
///
/// Implementations must not block; they run inline on the request path.
pub trait CostTracker: Send + Sync {
    fn record(&self, provider: &str, operation: OperationKind, cost: f64);
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopCostTracker;

impl CostTracker for NoopCostTracker {
    fn record(&self, _provider: &str, _operation: OperationKind, _cost: f64) {}
}

/// Accumulated usage for one provider and operation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CostLine {
    pub provider: String,
    pub operation: OperationKind,
    pub calls: u64,
    pub total_cost: f64,
}

/// In-memory running totals per provider and operation.
#[derive(Debug, Default)]
pub struct CostLedger {
    lines: Mutex<HashMap<(String, OperationKind), (u64, f64)>>,
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_lines(&self) -> MutexGuard<'_, HashMap<(String, OperationKind), (u64, f64)>> {
        self.lines.lock().unwrap_or_else(|poisoned| {
            warn!("Cost ledger mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// All lines, sorted by provider then operation name.
    pub fn snapshot(&self) -> Vec<CostLine> {
        let mut lines: Vec<CostLine> = self
            .lock_lines()
            .iter()
            .map(|((provider, operation), (calls, total))| CostLine {
                provider: provider.clone(),
                operation: *operation,
                calls: *calls,
                total_cost: *total,
            })
            .collect();
        lines.sort_by(|a, b| {
            a.provider
                .cmp(&b.provider)
                .then_with(|| a.operation.as_str().cmp(b.operation.as_str()))
        });
        lines
    }

    pub fn total_cost(&self) -> f64 {
        self.lock_lines().values().map(|(_, total)| total).sum()
    }

    /// Calls served by `provider` across all operations.
    pub fn calls_for(&self, provider: &str) -> u64 {
        self.lock_lines()
            .iter()
            .filter(|((name, _), _)| name == provider)
            .map(|(_, (calls, _))| calls)
            .sum()
    }
}

impl CostTracker for CostLedger {
    fn record(&self, provider: &str, operation: OperationKind, cost: f64) {
        let mut lines = self.lock_lines();
        let line = lines
            .entry((provider.to_string(), operation))
            .or_insert((0, 0.0));
        line.0 += 1;
        if cost.is_finite() {
            line.1 += cost;
        }
    }
}
