use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// KYC lifecycle status.
///
/// `Pending` is set on submission; the remaining states are reached only
/// through the external approval workflow. Expiry is computed from the record's
/// timestamps and never stored here.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycStatus {
    #[default]
    None,
    Pending,
    Approved,
    Restricted,
    Suspended,
    Blocked,
}

/// KYC payload supplied by the applicant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycData {
    pub legal_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub jurisdiction: String, // ISO 3166-1 alpha-2
    pub accreditation_level: String,
    pub document_hash: String,
}

/// Persisted KYC record, one per address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycRecord {
    pub address: String,
    /// Encrypted legal name
    pub legal_name: String,
    /// Encrypted `YYYY-MM-DD` date of birth
    pub date_of_birth: String,
    pub jurisdiction: String,
    pub accreditation_level: String,
    pub document_hash: String,
    pub submission_timestamp: DateTime<Utc>,
    pub expiry_timestamp: DateTime<Utc>,
    pub is_approved: bool,
    pub status: KycStatus,
}

impl KycRecord {
    /// Build a freshly submitted record: pending, unapproved, expiring
    /// `validity_years` after submission.
    pub fn pending(
        address: &str,
        legal_name: String,
        date_of_birth: String,
        data: &KycData,
        submitted_at: DateTime<Utc>,
        validity_years: u32,
    ) -> Self {
        let expiry_timestamp = submitted_at
            .checked_add_months(Months::new(validity_years.saturating_mul(12)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            address: address.to_string(),
            legal_name,
            date_of_birth,
            jurisdiction: data.jurisdiction.clone(),
            accreditation_level: data.accreditation_level.clone(),
            document_hash: data.document_hash.clone(),
            submission_timestamp: submitted_at,
            expiry_timestamp,
            is_approved: false,
            status: KycStatus::Pending,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expiry_timestamp
    }

    /// Approved and not yet expired
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_approved && !self.is_expired_at(now)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KycSubmissionResult {
    pub success: bool,
    pub errors: Vec<String>,
}

impl KycSubmissionResult {
    pub fn accepted() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
        }
    }

    pub fn rejected(errors: Vec<String>) -> Self {
        Self {
            success: false,
            errors,
        }
    }
}

/// Input to a sanctions provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningRequest {
    pub address: String,
    pub name: String,
    pub jurisdiction: String,
}

/// Outcome of screening an (address, name, jurisdiction) triple
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SanctionsCheckResult {
    pub is_match: bool,
    pub match_type: Option<String>,
    pub matched_lists: Vec<String>,
    pub match_score: Decimal,
}

impl SanctionsCheckResult {
    /// Match type reported when screening itself failed
    pub const ERROR_DEFAULT_BLOCK: &'static str = "ERROR_DEFAULT_BLOCK";

    pub fn clear() -> Self {
        Self::default()
    }

    /// Synthetic match returned when screening could not be completed
    pub fn fail_closed() -> Self {
        Self {
            is_match: true,
            match_type: Some(Self::ERROR_DEFAULT_BLOCK.to_string()),
            matched_lists: Vec::new(),
            match_score: Decimal::ZERO,
        }
    }

    pub fn match_type_str(&self) -> &str {
        self.match_type.as_deref().unwrap_or("")
    }
}

/// Sanctions result cached per address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSanctionsResult {
    pub address: String,
    pub result: SanctionsCheckResult,
    pub cached_at: DateTime<Utc>,
}

impl CachedSanctionsResult {
    /// Stale once strictly older than `validity_days`
    pub fn is_stale_at(&self, now: DateTime<Utc>, validity_days: u32) -> bool {
        now.signed_duration_since(self.cached_at) > chrono::Duration::days(i64::from(validity_days))
    }
}

/// Violation codes produced by the service
pub mod codes {
    pub const SENDER_KYC_INVALID: &str = "SENDER_KYC_INVALID";
    pub const RECIPIENT_KYC_INVALID: &str = "RECIPIENT_KYC_INVALID";
    pub const SENDER_SANCTIONED: &str = "SENDER_SANCTIONED";
    pub const RECIPIENT_SANCTIONED: &str = "RECIPIENT_SANCTIONED";
    pub const KYC_INVALID: &str = "KYC_INVALID";
    pub const SANCTIONED: &str = "SANCTIONED";
    pub const LOCKUP_ACTIVE: &str = "LOCKUP_ACTIVE";
    pub const VESTING_LIMIT_EXCEEDED: &str = "VESTING_LIMIT_EXCEEDED";
    pub const SYSTEM_ERROR: &str = "SYSTEM_ERROR";
}

/// One failed rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComplianceViolation {
    pub code: String,
    pub message: String,
}

impl ComplianceViolation {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferAuthorizationResult {
    pub is_authorized: bool,
    pub violations: Vec<ComplianceViolation>,
}

impl TransferAuthorizationResult {
    pub fn from_violations(violations: Vec<ComplianceViolation>) -> Self {
        Self {
            is_authorized: violations.is_empty(),
            violations,
        }
    }

    /// Hard denial used when authorization could not be evaluated
    pub fn system_error() -> Self {
        Self {
            is_authorized: false,
            violations: vec![ComplianceViolation::new(
                codes::SYSTEM_ERROR,
                "System error during authorization",
            )],
        }
    }

    pub fn violation_codes(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.code.as_str()).collect()
    }
}

/// Audit severity level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditSeverity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for AuditSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditSeverity::Info => "INFO",
            AuditSeverity::Warning => "WARNING",
            AuditSeverity::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// Immutable audit log entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub event_type: String,
    pub address: String,
    pub details: Option<String>,
    pub severity: Option<AuditSeverity>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// New entry stamped with the current UTC time
    pub fn new(event_type: &str, address: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            address: address.to_string(),
            details: None,
            severity: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = Some(severity);
        self
    }
}

/// Caller-facing view of an audit entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceEvent {
    pub event_type: String,
    pub address: String,
    pub details: Option<String>,
    pub severity: Option<AuditSeverity>,
    pub timestamp: DateTime<Utc>,
}

impl From<AuditEntry> for ComplianceEvent {
    fn from(entry: AuditEntry) -> Self {
        Self {
            event_type: entry.event_type,
            address: entry.address,
            details: entry.details,
            severity: entry.severity,
            timestamp: entry.timestamp,
        }
    }
}
