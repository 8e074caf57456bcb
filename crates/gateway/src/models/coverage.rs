//! Per-country coverage confidence.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Country code → coverage confidence in [0, 1].
///
/// Codes are stored upper case; lookups are case-insensitive. A country
/// missing from the map has zero coverage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryCoverage(HashMap<String, f64>);

impl CountryCoverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a country, clamping confidence into [0, 1].
    pub fn with(mut self, country: &str, confidence: f64) -> Self {
        self.insert(country, confidence);
        self
    }

    pub fn insert(&mut self, country: &str, confidence: f64) {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.0.insert(country.trim().to_ascii_uppercase(), confidence);
    }

    /// Coverage confidence for `country`, 0 when absent.
    pub fn confidence(&self, country: &str) -> f64 {
        if let Some(value) = self.0.get(country) {
            return *value;
        }
        self.0
            .get(&country.trim().to_ascii_uppercase())
            .copied()
            .unwrap_or(0.0)
    }

    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, f64)> for CountryCoverage {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        let mut coverage = Self::new();
        for (country, confidence) in iter {
            coverage.insert(country, confidence);
        }
        coverage
    }
}
