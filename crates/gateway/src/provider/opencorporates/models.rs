//! OpenCorporates API v0.4 response shapes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::models::{Address, BusinessRecord, IndustryCode};

/// Envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    pub results: T,
}

/// `results` of `/companies/search`.
#[derive(Debug, Deserialize)]
pub(super) struct SearchResults {
    #[serde(default)]
    pub companies: Vec<CompanyWrapper>,
    #[serde(default)]
    pub total_count: Option<u64>,
}

/// `results` of `/companies/{jurisdiction}/{number}`.
#[derive(Debug, Deserialize)]
pub(super) struct CompanyResults {
    pub company: Company,
}

#[derive(Debug, Deserialize)]
pub(super) struct CompanyWrapper {
    pub company: Company,
}

#[derive(Debug, Deserialize)]
pub(super) struct Company {
    pub name: String,
    pub company_number: String,
    pub jurisdiction_code: String,
    #[serde(default)]
    pub incorporation_date: Option<NaiveDate>,
    #[serde(default)]
    pub current_status: Option<String>,
    #[serde(default)]
    pub inactive: Option<bool>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub registered_address: Option<RegisteredAddress>,
    #[serde(default)]
    pub industry_codes: Vec<IndustryCodeWrapper>,
    // Note: officers, filings, previous_names exist on the detail endpoint but are not mapped
}

#[derive(Debug, Deserialize)]
pub(super) struct RegisteredAddress {
    #[serde(default)]
    pub street_address: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct IndustryCodeWrapper {
    pub industry_code: RawIndustryCode,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawIndustryCode {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub code_scheme_id: Option<String>,
}

/// Error body returned alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    pub error: Option<ErrorMessage>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorMessage {
    pub message: Option<String>,
}

impl Company {
    /// `{jurisdiction}/{number}`, the native id of a company.
    pub fn native_id(&self) -> String {
        format!("{}/{}", self.jurisdiction_code, self.company_number)
    }

    /// Fields that count towards provider-side data quality.
    fn populated_fields(&self) -> usize {
        [
            self.incorporation_date.is_some(),
            self.current_status.is_some(),
            self.registered_address.is_some(),
            !self.industry_codes.is_empty(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    pub fn into_record(
        self,
        namespace: &str,
        provider: &str,
        confidence: f64,
    ) -> BusinessRecord {
        let data_quality = 0.6 + 0.1 * self.populated_fields() as f64;
        let native_id = self.native_id();

        let status = self.current_status.or_else(|| {
            self.inactive
                .map(|inactive| if inactive { "Inactive" } else { "Active" }.to_string())
        });

        let mut record = BusinessRecord::new(namespace, &native_id, provider, self.name)
            .with_registration_number(self.company_number)
            .with_scores(data_quality.min(1.0), confidence);

        if let Some(status) = status {
            record = record.with_status(status);
        }
        if let Some(date) = self.incorporation_date {
            record = record.with_incorporation_date(date);
        }
        if let Some(updated_at) = self.updated_at {
            record = record.with_last_updated(updated_at);
        }
        if let Some(addr) = self.registered_address {
            record = record.with_address(Address {
                street: addr.street_address,
                city: addr.locality,
                state: addr.region,
                postal_code: addr.postal_code,
                country: addr.country,
            });
        }
        for wrapper in self.industry_codes {
            let raw = wrapper.industry_code;
            record = record.with_industry_code(IndustryCode {
                scheme: raw.code_scheme_id.unwrap_or_else(|| "unknown".to_string()),
                code: raw.code,
                description: raw.description,
            });
        }
        record
    }
}
