//! Business search query.

use serde::{Deserialize, Serialize};

/// Sort hint passed through to providers that support ordering.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Relevance,
    Name,
    IncorporationDate,
}

/// A business search request.
///
/// Every field is optional; an empty query is valid. Field order is part of
/// the cache key, so do not reorder fields casually.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,

    /// Upper-case country code; normalized by [`with_country`](Self::with_country).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default)]
    pub include_financial: bool,

    #[serde(default)]
    pub include_compliance: bool,

    #[serde(default)]
    pub include_news: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    #[serde(default)]
    pub sort_by: SortBy,
}

impl BusinessQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search by legal or trading name.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self::new().with_name(name)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_registration_number(mut self, number: impl Into<String>) -> Self {
        self.registration_number = Some(number.into());
        self
    }

    pub fn with_tax_id(mut self, tax_id: impl Into<String>) -> Self {
        self.tax_id = Some(tax_id.into());
        self
    }

    /// Set the country filter, upper-cased.
    pub fn with_country(mut self, country: impl AsRef<str>) -> Self {
        self.country = Some(country.as_ref().trim().to_ascii_uppercase());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn include_financial(mut self) -> Self {
        self.include_financial = true;
        self
    }

    pub fn include_compliance(mut self) -> Self {
        self.include_compliance = true;
        self
    }

    pub fn include_news(mut self) -> Self {
        self.include_news = true;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sort(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    /// Number of optional data sets requested (financial, compliance, news).
    pub fn requested_feature_count(&self) -> usize {
        [
            self.include_financial,
            self.include_compliance,
            self.include_news,
        ]
        .iter()
        .filter(|requested| **requested)
        .count()
    }
}
