//! Business record validation.
//!
//! Scores a record in [0, 1] and collects issues:
//! - Hard issues (missing identity, out-of-range scores, negative balances)
//!   make the record invalid and force its score to 0
//! - Soft issues (stale data, low confidence, missing fields) each deduct a
//!   fixed penalty

use chrono::{Duration, Utc};
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::BusinessRecord;

/// Validation severity levels.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ValidationSeverity {
    /// Record is unusable.
    Hard,
    /// Record is usable but less trustworthy.
    Soft,
}

/// A single finding.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub severity: ValidationSeverity,
    /// Record field the issue concerns.
    pub field: &'static str,
    pub message: String,
}

/// Outcome of validating one record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    /// Quality in [0, 1].
    pub quality_score: f64,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// A valid report with the given score and no issues.
    pub fn passing(quality_score: f64) -> Self {
        Self {
            is_valid: true,
            quality_score,
            issues: Vec::new(),
        }
    }
}

/// Record validator configuration.
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Records older than this get a staleness warning.
    pub max_age: Duration,
    /// Provider confidence below this gets a warning.
    pub min_confidence: f64,
    /// Deduction per soft issue.
    pub soft_penalty: f64,
    pub warn_on_missing_address: bool,
    pub warn_on_missing_registration_number: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::days(365),
            min_confidence: 0.5,
            soft_penalty: 0.1,
            warn_on_missing_address: true,
            warn_on_missing_registration_number: true,
        }
    }
}

/// Business record validator.
#[derive(Clone, Debug, Default)]
pub struct RecordValidator {
    config: ValidatorConfig,
}

impl RecordValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate a record and compute its quality score.
    ///
    /// Score is the mean of field completeness and provider data quality,
    /// minus the soft penalties, clamped to [0, 1].
    pub fn validate(&self, record: &BusinessRecord) -> ValidationReport {
        let mut issues: Vec<ValidationIssue> = Vec::new();

        self.validate_identity(record, &mut issues);
        self.validate_scores(record, &mut issues);
        self.validate_financials(record, &mut issues);
        self.validate_sub_records(record, &mut issues);
        self.validate_freshness(record, &mut issues);
        self.validate_completeness(record, &mut issues);

        if issues.iter().any(|i| i.severity == ValidationSeverity::Hard) {
            let messages: Vec<_> = issues
                .iter()
                .filter(|i| i.severity == ValidationSeverity::Hard)
                .map(|i| i.message.as_str())
                .collect();
            warn!(
                "Record {} from {} failed validation: {}",
                record.id,
                record.provider,
                messages.join("; ")
            );
            return ValidationReport {
                is_valid: false,
                quality_score: 0.0,
                issues,
            };
        }

        let soft = issues.len() as f64;
        let base = (completeness(record) + record.data_quality) / 2.0;
        let quality_score = (base - soft * self.config.soft_penalty).clamp(0.0, 1.0);

        ValidationReport {
            is_valid: true,
            quality_score,
            issues,
        }
    }

    fn validate_identity(&self, record: &BusinessRecord, issues: &mut Vec<ValidationIssue>) {
        if record.id.trim().is_empty() {
            issues.push(hard("id", "Record id is empty"));
        } else if BusinessRecord::split_id(&record.id).is_none() {
            issues.push(hard(
                "id",
                format!("Record id '{}' is not namespaced", record.id),
            ));
        }
        if record.name.trim().is_empty() {
            issues.push(hard("name", "Legal name is empty"));
        }
    }

    fn validate_scores(&self, record: &BusinessRecord, issues: &mut Vec<ValidationIssue>) {
        if !in_unit_range(record.data_quality) {
            issues.push(hard(
                "data_quality",
                format!("Data quality {} is outside [0, 1]", record.data_quality),
            ));
        }
        if !in_unit_range(record.confidence) {
            issues.push(hard(
                "confidence",
                format!("Confidence {} is outside [0, 1]", record.confidence),
            ));
        } else if record.confidence < self.config.min_confidence {
            issues.push(soft(
                "confidence",
                format!("Low provider confidence {:.2}", record.confidence),
            ));
        }
    }

    fn validate_financials(&self, record: &BusinessRecord, issues: &mut Vec<ValidationIssue>) {
        let Some(financial) = &record.financial else {
            return;
        };
        let negative =
            |value: Option<Decimal>| value.is_some_and(|v| v.is_sign_negative() && !v.is_zero());
        if negative(financial.revenue) {
            issues.push(hard("financial.revenue", "Revenue is negative"));
        }
        if negative(financial.total_assets) {
            issues.push(hard("financial.total_assets", "Total assets are negative"));
        }
    }

    fn validate_sub_records(&self, record: &BusinessRecord, issues: &mut Vec<ValidationIssue>) {
        if let Some(score) = record.compliance.as_ref().and_then(|c| c.risk_score) {
            if !in_unit_range(score) {
                issues.push(hard(
                    "compliance.risk_score",
                    format!("Risk score {} is outside [0, 1]", score),
                ));
            }
        }
        for item in record.news.iter().flatten() {
            if let Some(sentiment) = item.sentiment {
                if !(-1.0..=1.0).contains(&sentiment) {
                    issues.push(hard(
                        "news.sentiment",
                        format!("Sentiment {} on '{}' is outside [-1, 1]", sentiment, item.title),
                    ));
                }
            }
        }
    }

    fn validate_freshness(&self, record: &BusinessRecord, issues: &mut Vec<ValidationIssue>) {
        let now = Utc::now();
        if record.last_updated > now + Duration::days(1) {
            issues.push(soft("last_updated", "Last updated timestamp is in the future"));
        } else if now - record.last_updated > self.config.max_age {
            issues.push(soft(
                "last_updated",
                format!("Record last updated {}", record.last_updated.date_naive()),
            ));
        }
    }

    fn validate_completeness(&self, record: &BusinessRecord, issues: &mut Vec<ValidationIssue>) {
        if self.config.warn_on_missing_address && record.address.is_none() {
            issues.push(soft("address", "Registered address is missing"));
        }
        if self.config.warn_on_missing_registration_number && record.registration_number.is_none()
        {
            issues.push(soft("registration_number", "Registration number is missing"));
        }
    }
}

/// Fraction of the descriptive fields that are populated.
fn completeness(record: &BusinessRecord) -> f64 {
    let fields = [
        !record.name.trim().is_empty(),
        record.registration_number.is_some(),
        record.tax_id.is_some(),
        record.status.is_some(),
        record.incorporation_date.is_some(),
        record.address.is_some(),
        !record.industry_codes.is_empty(),
    ];
    let present = fields.iter().filter(|f| **f).count();
    present as f64 / fields.len() as f64
}

fn in_unit_range(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

fn hard(field: &'static str, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue {
        severity: ValidationSeverity::Hard,
        field,
        message: message.into(),
    }
}

fn soft(field: &'static str, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue {
        severity: ValidationSeverity::Soft,
        field,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Address, FinancialData, IndustryCode};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn complete_record() -> BusinessRecord {
        BusinessRecord::new("acme", "42", "alpha", "Acme Widgets Inc")
            .with_registration_number("5432101")
            .with_tax_id("12-3456789")
            .with_status("Active")
            .with_incorporation_date(NaiveDate::from_ymd_opt(2011, 4, 18).unwrap())
            .with_address(Address {
                city: Some("Wilmington".to_string()),
                country: Some("US".to_string()),
                ..Address::default()
            })
            .with_industry_code(IndustryCode {
                scheme: "NAICS".to_string(),
                code: "332510".to_string(),
                description: None,
            })
            .with_scores(0.9, 0.9)
    }

    #[test]
    fn test_complete_record_scores_high() {
        let report = RecordValidator::new().validate(&complete_record());
        assert!(report.is_valid);
        assert!(report.issues.is_empty());
        assert!((report.quality_score - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_soft_issues_deduct_penalty() {
        let mut record = complete_record();
        record.address = None;
        record.confidence = 0.3;

        let report = RecordValidator::new().validate(&record);
        assert!(report.is_valid);
        assert_eq!(report.issues.len(), 2);
        let expected = (6.0 / 7.0 + 0.9) / 2.0 - 0.2;
        assert!((report.quality_score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_stale_record_warns() {
        let record = complete_record().with_last_updated(Utc::now() - Duration::days(800));
        let report = RecordValidator::new().validate(&record);
        assert!(report.is_valid);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].field, "last_updated");
    }

    #[test]
    fn test_empty_name_is_hard_failure() {
        let mut record = complete_record();
        record.name = "  ".to_string();
        let report = RecordValidator::new().validate(&record);
        assert!(!report.is_valid);
        assert_eq!(report.quality_score, 0.0);
    }

    #[test]
    fn test_unnamespaced_id_is_hard_failure() {
        let mut record = complete_record();
        record.id = "42".to_string();
        assert!(!RecordValidator::new().validate(&record).is_valid);
    }

    #[test]
    fn test_out_of_range_quality_is_hard_failure() {
        let record = complete_record().with_scores(1.4, 0.9);
        let report = RecordValidator::new().validate(&record);
        assert!(!report.is_valid);
        assert!(report
            .issues
            .iter()
            .any(|i| i.field == "data_quality" && i.severity == ValidationSeverity::Hard));
    }

    #[test]
    fn test_negative_revenue_is_hard_but_net_loss_is_fine() {
        let loss = complete_record().with_financial(FinancialData {
            currency: "USD".to_string(),
            revenue: Some(dec!(1200000)),
            net_income: Some(dec!(-50000)),
            ..FinancialData::default()
        });
        assert!(RecordValidator::new().validate(&loss).is_valid);

        let broken = complete_record().with_financial(FinancialData {
            currency: "USD".to_string(),
            revenue: Some(dec!(-1)),
            ..FinancialData::default()
        });
        assert!(!RecordValidator::new().validate(&broken).is_valid);
    }

    #[test]
    fn test_disabled_completeness_warnings() {
        let mut record = complete_record();
        record.address = None;
        record.registration_number = None;
        let validator = RecordValidator::with_config(ValidatorConfig {
            warn_on_missing_address: false,
            warn_on_missing_registration_number: false,
            ..ValidatorConfig::default()
        });
        assert!(validator.validate(&record).issues.is_empty());
    }
}
