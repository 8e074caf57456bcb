//! Normalized business records returned by every provider.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Postal address of the registered office.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Industry classification code (SIC, NAICS, NACE, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryCode {
    /// Classification scheme, e.g. "NAICS".
    pub scheme: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Headline financials for the most recent reporting period.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialData {
    /// ISO 4217 currency of the figures below.
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_income: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_assets: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiscal_year_end: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_score: Option<u16>,
}

/// Regulatory screening outcome.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceData {
    pub sanctions_hit: bool,
    pub pep_exposure: bool,
    #[serde(default)]
    pub watchlists: Vec<String>,
    #[serde(default)]
    pub licenses: Vec<String>,
    /// Provider risk rating in [0, 1]; higher is riskier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_at: Option<DateTime<Utc>>,
}

/// A press or media mention.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Sentiment in [-1, 1].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
}

impl NewsItem {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source: source.into(),
            published_at,
            summary: None,
            sentiment: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_sentiment(mut self, sentiment: f64) -> Self {
        self.sentiment = Some(sentiment);
        self
    }
}

/// Aggregated business record.
///
/// `id` is `<provider-namespace>:<provider-native-id>`. Records are built once
/// by the adapter and handed out as clones afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub id: String,

    /// Name of the provider that produced this record.
    pub provider: String,

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,

    /// Registry status as reported, e.g. "Active", "Dissolved".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub incorporation_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    #[serde(default)]
    pub industry_codes: Vec<IndustryCode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub financial: Option<FinancialData>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance: Option<ComplianceData>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub news: Option<Vec<NewsItem>>,

    /// Provider-assigned data quality in [0, 1].
    pub data_quality: f64,

    /// Provider-assigned match confidence in [0, 1].
    pub confidence: f64,

    pub last_updated: DateTime<Utc>,
}

impl BusinessRecord {
    /// Create a record with required identity fields.
    pub fn new(
        namespace: &str,
        native_id: &str,
        provider: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: Self::compose_id(namespace, native_id),
            provider: provider.into(),
            name: name.into(),
            registration_number: None,
            tax_id: None,
            status: None,
            incorporation_date: None,
            address: None,
            industry_codes: Vec::new(),
            financial: None,
            compliance: None,
            news: None,
            data_quality: 0.0,
            confidence: 0.0,
            last_updated: Utc::now(),
        }
    }

    /// Build `<namespace>:<native_id>`.
    pub fn compose_id(namespace: &str, native_id: &str) -> String {
        format!("{}:{}", namespace, native_id)
    }

    /// Split an id into `(namespace, native_id)`. Native ids may contain ':'.
    pub fn split_id(id: &str) -> Option<(&str, &str)> {
        id.split_once(':')
            .filter(|(ns, native)| !ns.is_empty() && !native.is_empty())
    }

    pub fn with_registration_number(mut self, number: impl Into<String>) -> Self {
        self.registration_number = Some(number.into());
        self
    }

    pub fn with_tax_id(mut self, tax_id: impl Into<String>) -> Self {
        self.tax_id = Some(tax_id.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_incorporation_date(mut self, date: NaiveDate) -> Self {
        self.incorporation_date = Some(date);
        self
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn with_industry_code(mut self, code: IndustryCode) -> Self {
        self.industry_codes.push(code);
        self
    }

    pub fn with_financial(mut self, financial: FinancialData) -> Self {
        self.financial = Some(financial);
        self
    }

    pub fn with_compliance(mut self, compliance: ComplianceData) -> Self {
        self.compliance = Some(compliance);
        self
    }

    pub fn with_news(mut self, news: Vec<NewsItem>) -> Self {
        self.news = Some(news);
        self
    }

    /// Set provider-assigned quality and confidence.
    pub fn with_scores(mut self, data_quality: f64, confidence: f64) -> Self {
        self.data_quality = data_quality;
        self.confidence = confidence;
        self
    }

    pub fn with_last_updated(mut self, last_updated: DateTime<Utc>) -> Self {
        self.last_updated = last_updated;
        self
    }
}
