//! Gateway configuration.
//!
//! Build a [`GatewayConfig`] in code, deserialize it with serde, or read it
//! from `BIZSOURCE_*` environment variables with [`GatewayConfig::from_env`].

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::provider::RateLimit;

const ENV_PREFIX: &str = "BIZSOURCE_";

/// What to do when the selected provider has no rate-limit token.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitPolicy {
    /// Fail with `RateLimited`. Rate limits are strictly per provider.
    #[default]
    FailFast,
    /// Treat the denial like a failed primary call and try the fallback provider.
    FallbackOnDenial,
}

/// Gateway settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Limit for providers that declare none and have no override.
    pub default_rate_limit: RateLimit,

    /// Per-provider overrides; win over the provider's declared limit.
    pub provider_rate_limits: HashMap<String, RateLimit>,

    pub cache_ttl_secs: u64,

    pub cache_max_entries: usize,

    /// Include the cost term in provider scoring.
    pub cost_optimization: bool,

    /// Minimum validation score for search results, in [0, 1].
    pub quality_threshold: f64,

    /// Used by direct operations called with an empty provider name.
    pub default_provider: Option<String>,

    /// Single fallback tried when the primary call fails.
    pub fallback_provider: Option<String>,

    pub rate_limit_policy: RateLimitPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            default_rate_limit: RateLimit::default(),
            provider_rate_limits: HashMap::new(),
            cache_ttl_secs: 3600,
            cache_max_entries: 1000,
            cost_optimization: true,
            quality_threshold: 0.7,
            default_provider: None,
            fallback_provider: None,
            rate_limit_policy: RateLimitPolicy::FailFast,
        }
    }
}

impl GatewayConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn with_fallback_provider(mut self, name: impl Into<String>) -> Self {
        self.fallback_provider = Some(name.into());
        self
    }

    pub fn with_default_provider(mut self, name: impl Into<String>) -> Self {
        self.default_provider = Some(name.into());
        self
    }

    pub fn with_quality_threshold(mut self, threshold: f64) -> Self {
        self.quality_threshold = threshold;
        self
    }

    pub fn with_provider_rate_limit(mut self, name: impl Into<String>, limit: RateLimit) -> Self {
        self.provider_rate_limits.insert(name.into(), limit);
        self
    }

    /// Read settings from the process environment, then validate.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `BIZSOURCE_CACHE_TTL_SECS` | `cache_ttl_secs` |
    /// | `BIZSOURCE_CACHE_MAX_ENTRIES` | `cache_max_entries` |
    /// | `BIZSOURCE_COST_OPTIMIZATION` | `cost_optimization` |
    /// | `BIZSOURCE_QUALITY_THRESHOLD` | `quality_threshold` |
    /// | `BIZSOURCE_DEFAULT_PROVIDER` | `default_provider` |
    /// | `BIZSOURCE_FALLBACK_PROVIDER` | `fallback_provider` |
    /// | `BIZSOURCE_RATE_LIMIT_POLICY` | `rate_limit_policy` (`fail_fast`, `fallback_on_denial`) |
    /// | `BIZSOURCE_RATE_LIMIT_RPM` | `default_rate_limit.requests_per_minute` |
    /// | `BIZSOURCE_RATE_LIMIT_BURST` | `default_rate_limit.burst` |
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|v| (format!("{}{}", ENV_PREFIX, name), v))
        };

        let mut config = Self::default();

        if let Some((key, value)) = get("CACHE_TTL_SECS") {
            config.cache_ttl_secs = parse(&key, &value)?;
        }
        if let Some((key, value)) = get("CACHE_MAX_ENTRIES") {
            config.cache_max_entries = parse(&key, &value)?;
        }
        if let Some((key, value)) = get("COST_OPTIMIZATION") {
            config.cost_optimization = parse_bool(&key, &value)?;
        }
        if let Some((key, value)) = get("QUALITY_THRESHOLD") {
            config.quality_threshold = parse(&key, &value)?;
        }
        if let Some((_, value)) = get("DEFAULT_PROVIDER") {
            config.default_provider = Some(value);
        }
        if let Some((_, value)) = get("FALLBACK_PROVIDER") {
            config.fallback_provider = Some(value);
        }
        if let Some((key, value)) = get("RATE_LIMIT_POLICY") {
            config.rate_limit_policy = match value.to_ascii_lowercase().as_str() {
                "fail_fast" => RateLimitPolicy::FailFast,
                "fallback_on_denial" => RateLimitPolicy::FallbackOnDenial,
                _ => return Err(ConfigError::InvalidEnvValue { key, value }),
            };
        }
        if let Some((key, value)) = get("RATE_LIMIT_RPM") {
            config.default_rate_limit.requests_per_minute = parse(&key, &value)?;
        }
        if let Some((key, value)) = get("RATE_LIMIT_BURST") {
            config.default_rate_limit.burst = parse(&key, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the gateway cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.quality_threshold) {
            return Err(ConfigError::InvalidQualityThreshold(self.quality_threshold));
        }
        check_rate("default", &self.default_rate_limit)?;
        for (name, limit) in &self.provider_rate_limits {
            check_rate(name, limit)?;
        }
        Ok(())
    }
}

fn check_rate(scope: &str, limit: &RateLimit) -> Result<(), ConfigError> {
    let rate = limit.requests_per_minute;
    if rate.is_finite() && rate >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRateLimit {
            scope: scope.to_string(),
            rate,
        })
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
