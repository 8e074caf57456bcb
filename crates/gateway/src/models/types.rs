//! Shared identifiers and enums.

use std::fmt;

use serde::{Deserialize, Serialize};

/// ISO 3166-1 alpha-2 country code, upper case (e.g., "US", "GB").
pub type CountryCode = String;

/// Provider name, unique within a registry (e.g., "opencorporates").
pub type ProviderName = String;

/// The five operations every provider contract exposes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Search,
    Details,
    Financial,
    Compliance,
    News,
}

impl OperationKind {
    pub const ALL: [OperationKind; 5] = [
        Self::Search,
        Self::Details,
        Self::Financial,
        Self::Compliance,
        Self::News,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search_business",
            Self::Details => "get_business_details",
            Self::Financial => "get_financial_data",
            Self::Compliance => "get_compliance_data",
            Self::News => "get_news_data",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad category of the upstream source behind a provider.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    /// Official company registry or registry aggregator.
    Registry,
    /// Credit bureau or financial statement vendor.
    Financial,
    /// Sanctions, PEP, and regulatory screening.
    Compliance,
    /// News and media monitoring.
    News,
    /// Commercial data vendor covering several of the above.
    Commercial,
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Registry => "registry",
            Self::Financial => "financial",
            Self::Compliance => "compliance",
            Self::News => "news",
            Self::Commercial => "commercial",
        };
        f.write_str(s)
    }
}
