//! Provider-reported quota usage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only quota usage snapshot reported by a provider.
///
/// Advisory only: the gateway never refuses a call because of it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    pub daily_used: u64,
    pub daily_limit: u64,
    pub monthly_used: u64,
    pub monthly_limit: u64,
    pub reset_time: Option<DateTime<Utc>>,
    /// Calls left before the tighter of the two limits is reached.
    pub remaining: u64,
}

impl QuotaSnapshot {
    /// Snapshot for a provider without published limits.
    pub fn unlimited() -> Self {
        Self {
            daily_limit: u64::MAX,
            monthly_limit: u64::MAX,
            remaining: u64::MAX,
            ..Self::default()
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}
