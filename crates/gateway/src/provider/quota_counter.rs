//! Daily and monthly call counter for adapters with published quotas.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use log::warn;

use crate::models::QuotaSnapshot;

#[derive(Debug)]
struct Usage {
    day: NaiveDate,
    month: (i32, u32),
    daily_used: u64,
    monthly_used: u64,
}

impl Usage {
    fn starting(now: DateTime<Utc>) -> Self {
        let day = now.date_naive();
        Self {
            day,
            month: (day.year(), day.month()),
            daily_used: 0,
            monthly_used: 0,
        }
    }

    /// Zero the counters whose UTC window has passed.
    fn roll_over(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if today != self.day {
            self.day = today;
            self.daily_used = 0;
        }
        let month = (today.year(), today.month());
        if month != self.month {
            self.month = month;
            self.monthly_used = 0;
        }
    }
}

/// Counts upstream calls against daily and monthly limits (UTC windows).
#[derive(Debug)]
pub struct QuotaCounter {
    daily_limit: u64,
    monthly_limit: u64,
    usage: Mutex<Usage>,
}

impl QuotaCounter {
    pub fn new(daily_limit: u64, monthly_limit: u64) -> Self {
        Self {
            daily_limit,
            monthly_limit,
            usage: Mutex::new(Usage::starting(Utc::now())),
        }
    }

    fn lock_usage(&self) -> MutexGuard<'_, Usage> {
        self.usage.lock().unwrap_or_else(|poisoned| {
            warn!("Quota counter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn record_call(&self) {
        self.record_call_at(Utc::now());
    }

    pub fn record_call_at(&self, now: DateTime<Utc>) {
        let mut usage = self.lock_usage();
        usage.roll_over(now);
        usage.daily_used = usage.daily_used.saturating_add(1);
        usage.monthly_used = usage.monthly_used.saturating_add(1);
    }

    pub fn snapshot(&self) -> QuotaSnapshot {
        self.snapshot_at(Utc::now())
    }

    pub fn snapshot_at(&self, now: DateTime<Utc>) -> QuotaSnapshot {
        let mut usage = self.lock_usage();
        usage.roll_over(now);

        let remaining = self
            .daily_limit
            .saturating_sub(usage.daily_used)
            .min(self.monthly_limit.saturating_sub(usage.monthly_used));

        let next_day = usage.day + Duration::days(1);
        let reset_time = next_day.and_hms_opt(0, 0, 0).map(|t| t.and_utc());

        QuotaSnapshot {
            daily_used: usage.daily_used,
            daily_limit: self.daily_limit,
            monthly_used: usage.monthly_used,
            monthly_limit: self.monthly_limit,
            reset_time,
            remaining,
        }
    }
}
