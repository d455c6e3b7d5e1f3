//! Compliance authorization service
//!
//! Rule-based decisions for KYC validity, sanctions status and transfer
//! authorization. Collaborator failures never reach the caller: screening and
//! authorization fail closed, lookups fall back to safe defaults.

use crate::audit::{events, AuditLogger};
use crate::config::ComplianceConfig;
use crate::error::Result;
use crate::kyc::validate_kyc_data;
use crate::lockup::{LockupPolicy, NoLockupPolicy};
use crate::metrics::Metrics;
use crate::pii::PiiCipher;
use crate::repository::ComplianceRepository;
use crate::screening::SanctionsProvider;
use crate::types::{
    codes, AuditEntry, AuditSeverity, ComplianceEvent, ComplianceViolation, KycData, KycRecord,
    KycStatus, KycSubmissionResult, SanctionsCheckResult, ScreeningRequest,
    TransferAuthorizationResult,
};
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub struct ComplianceService {
    config: ComplianceConfig,
    repository: Arc<dyn ComplianceRepository>,
    sanctions: Arc<dyn SanctionsProvider>,
    audit: Arc<dyn AuditLogger>,
    pii: Arc<dyn PiiCipher>,
    lockups: Arc<dyn LockupPolicy>,
    metrics: Option<Metrics>,
    // Serializes submissions per address
    submission_locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Holds a per-address submission lock and releases the map entry on drop,
/// including when the submitting future is cancelled
struct SubmissionSlot<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    address: &'a str,
    lock: Arc<Mutex<()>>,
}

impl<'a> SubmissionSlot<'a> {
    fn acquire(locks: &'a DashMap<String, Arc<Mutex<()>>>, address: &'a str) -> Self {
        let lock = locks.entry(address.to_string()).or_default().clone();
        Self {
            locks,
            address,
            lock,
        }
    }
}

impl Drop for SubmissionSlot<'_> {
    fn drop(&mut self) {
        // Map entry plus this slot: nobody else is waiting
        self.locks
            .remove_if(self.address, |_, l| Arc::strong_count(l) <= 2);
    }
}

impl ComplianceService {
    pub fn new(
        config: ComplianceConfig,
        repository: Arc<dyn ComplianceRepository>,
        sanctions: Arc<dyn SanctionsProvider>,
        audit: Arc<dyn AuditLogger>,
        pii: Arc<dyn PiiCipher>,
    ) -> Self {
        Self {
            config,
            repository,
            sanctions,
            audit,
            pii,
            lockups: Arc::new(NoLockupPolicy),
            metrics: None,
            submission_locks: DashMap::new(),
        }
    }

    pub fn with_lockup_policy(mut self, lockups: Arc<dyn LockupPolicy>) -> Self {
        self.lockups = lockups;
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &ComplianceConfig {
        &self.config
    }

    // ==================== KYC ====================

    /// Submit KYC data for review
    pub async fn submit_kyc(&self, address: &str, data: &KycData) -> KycSubmissionResult {
        info!("Submitting KYC for address: {}", address);

        let slot = SubmissionSlot::acquire(&self.submission_locks, address);
        let guard = slot.lock.lock().await;

        let outcome = self.try_submit_kyc(address, data).await;

        drop(guard);
        drop(slot);

        match outcome {
            Ok(result) => result,
            Err(e) => {
                error!("Error submitting KYC for {}: {}", address, e);
                self.record_submission("error");
                KycSubmissionResult::rejected(vec!["System error - please try again".to_string()])
            }
        }
    }

    async fn try_submit_kyc(&self, address: &str, data: &KycData) -> Result<KycSubmissionResult> {
        let now = Utc::now();

        let validation_errors =
            validate_kyc_data(data, now.date_naive(), self.config.minimum_age_years);
        if !validation_errors.is_empty() {
            warn!(
                "KYC validation failed for {}: {}",
                address,
                validation_errors.join(", ")
            );
            self.audit
                .log(
                    AuditEntry::new(events::KYC_VALIDATION_FAILED, address)
                        .with_details(validation_errors.join("; "))
                        .with_severity(AuditSeverity::Warning),
                )
                .await?;
            self.record_submission("invalid");
            return Ok(KycSubmissionResult::rejected(validation_errors));
        }

        if let Some(existing) = self.repository.get_kyc(address).await? {
            if existing.is_valid_at(now) {
                warn!("Valid KYC already exists for {}", address);
                self.record_submission("duplicate");
                return Ok(KycSubmissionResult::rejected(vec![
                    "Valid KYC already on file".to_string(),
                ]));
            }
        }

        let sanctions = self
            .screen_for_sanctions(address, &data.legal_name, &data.jurisdiction)
            .await;
        if sanctions.is_match {
            error!(
                "Sanctions match detected for {}: {}",
                address,
                sanctions.match_type_str()
            );
            self.audit
                .log(
                    AuditEntry::new(events::SANCTIONS_MATCH, address)
                        .with_details(format!(
                            "Match Type: {}; Lists: {}",
                            sanctions.match_type_str(),
                            sanctions.matched_lists.join(", ")
                        ))
                        .with_severity(AuditSeverity::Critical),
                )
                .await?;
            self.record_submission("sanctioned");
            return Ok(KycSubmissionResult::rejected(vec![
                "Failed sanctions screening - contact support".to_string(),
            ]));
        }

        let date_of_birth = data
            .date_of_birth
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let record = KycRecord::pending(
            address,
            self.pii.encrypt(&data.legal_name)?,
            self.pii.encrypt(&date_of_birth)?,
            data,
            Utc::now(),
            self.config.kyc_validity_years,
        );

        self.repository.save_kyc(record).await?;

        info!("KYC submitted successfully for {}", address);
        self.audit
            .log(
                AuditEntry::new(events::KYC_SUBMITTED, address).with_details(format!(
                    "Accreditation Level: {}; Jurisdiction: {}",
                    data.accreditation_level, data.jurisdiction
                )),
            )
            .await?;
        self.record_submission("accepted");

        Ok(KycSubmissionResult::accepted())
    }

    /// Approved and unexpired KYC on file. Every check of an expired record
    /// writes a `KYC_EXPIRED` audit entry.
    pub async fn verify_kyc(&self, address: &str) -> bool {
        match self.try_verify_kyc(address).await {
            Ok(valid) => valid,
            Err(e) => {
                error!("Error verifying KYC for {}: {}", address, e);
                false
            }
        }
    }

    async fn try_verify_kyc(&self, address: &str) -> Result<bool> {
        let Some(record) = self.repository.get_kyc(address).await? else {
            warn!("No KYC found for {}", address);
            return Ok(false);
        };

        if !record.is_approved {
            warn!("KYC not approved for {}", address);
            return Ok(false);
        }

        if record.is_expired_at(Utc::now()) {
            warn!("KYC expired for {}", address);
            self.audit
                .log(AuditEntry::new(events::KYC_EXPIRED, address))
                .await?;
            return Ok(false);
        }

        Ok(true)
    }

    pub async fn is_kyc_valid(&self, address: &str) -> bool {
        self.verify_kyc(address).await
    }

    pub async fn kyc_status(&self, address: &str) -> KycStatus {
        match self.repository.get_kyc(address).await {
            Ok(record) => record.map(|r| r.status).unwrap_or_default(),
            Err(e) => {
                error!("Error getting KYC status for {}: {}", address, e);
                KycStatus::None
            }
        }
    }

    // ==================== Sanctions ====================

    /// Screen against sanctions lists, serving a cached result while fresh.
    ///
    /// Fails closed: any error yields a match with type `ERROR_DEFAULT_BLOCK`.
    pub async fn screen_for_sanctions(
        &self,
        address: &str,
        name: &str,
        jurisdiction: &str,
    ) -> SanctionsCheckResult {
        match self.try_screen(address, name, jurisdiction).await {
            Ok(result) => result,
            Err(e) => {
                error!("Error screening {} for sanctions: {}", address, e);
                self.record_screening("error");
                SanctionsCheckResult::fail_closed()
            }
        }
    }

    async fn try_screen(
        &self,
        address: &str,
        name: &str,
        jurisdiction: &str,
    ) -> Result<SanctionsCheckResult> {
        info!("Screening {} against sanctions lists", address);

        if let Some(cached) = self.repository.get_cached_sanctions_result(address).await? {
            if !cached.is_stale_at(Utc::now(), self.config.sanctions_cache_validity_days) {
                debug!("Using cached sanctions result for {}", address);
                self.record_screening("cache");
                return Ok(cached.result);
            }
        }

        let request = ScreeningRequest {
            address: address.to_string(),
            name: name.to_string(),
            jurisdiction: jurisdiction.to_string(),
        };
        let result = self.sanctions.screen(&request).await?;
        self.record_screening("provider");

        self.repository
            .cache_sanctions_result(address, result.clone())
            .await?;

        if result.is_match {
            error!("Sanctions match for {}: {}", address, result.match_type_str());
            self.audit
                .log(
                    AuditEntry::new(events::SANCTIONS_MATCH, address)
                        .with_details(format!(
                            "Type: {}; Lists: {}",
                            result.match_type_str(),
                            result.matched_lists.join(", ")
                        ))
                        .with_severity(AuditSeverity::Critical),
                )
                .await?;
        }

        Ok(result)
    }

    /// Screen by address only, without name or jurisdiction context
    pub async fn is_sanctioned(&self, address: &str) -> bool {
        self.screen_for_sanctions(address, "", "").await.is_match
    }

    // ==================== Transfers ====================

    /// Run every transfer check and report all violations together
    pub async fn authorize_transfer(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> TransferAuthorizationResult {
        info!("Authorizing transfer from {} to {}: {}", from, to, amount);

        match self.try_authorize_transfer(from, to, amount).await {
            Ok(result) => result,
            Err(e) => {
                error!("Error authorizing transfer from {} to {}: {}", from, to, e);
                self.record_transfer("error");
                TransferAuthorizationResult::system_error()
            }
        }
    }

    async fn try_authorize_transfer(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> Result<TransferAuthorizationResult> {
        let mut violations = Vec::new();

        if !self.verify_kyc(from).await {
            violations.push(ComplianceViolation::new(
                codes::SENDER_KYC_INVALID,
                "Sender KYC is invalid or expired",
            ));
        }

        if !self.verify_kyc(to).await {
            violations.push(ComplianceViolation::new(
                codes::RECIPIENT_KYC_INVALID,
                "Recipient KYC is invalid or expired",
            ));
        }

        if self.is_sanctioned(from).await {
            violations.push(ComplianceViolation::new(
                codes::SENDER_SANCTIONED,
                "Sender is sanctioned",
            ));
        }

        if self.is_sanctioned(to).await {
            violations.push(ComplianceViolation::new(
                codes::RECIPIENT_SANCTIONED,
                "Recipient is sanctioned",
            ));
        }

        violations.extend(self.lockups.check(from, amount).await?);

        let result = TransferAuthorizationResult::from_violations(violations);

        if result.is_authorized {
            self.record_transfer("authorized");
        } else {
            let denied = result.violation_codes().join("; ");
            warn!("Transfer denied: {}", denied);
            self.audit
                .log(
                    AuditEntry::new(events::TRANSFER_DENIED, from).with_details(format!(
                        "To: {}; Amount: {}; Violations: {}",
                        to, amount, denied
                    )),
                )
                .await?;
            self.record_transfer("denied");
        }

        Ok(result)
    }

    /// KYC and sanctions violations for a single address
    pub async fn check_compliance(&self, address: &str) -> Vec<ComplianceViolation> {
        let mut violations = Vec::new();

        if !self.verify_kyc(address).await {
            violations.push(ComplianceViolation::new(
                codes::KYC_INVALID,
                "KYC is invalid or expired",
            ));
        }

        if self.is_sanctioned(address).await {
            violations.push(ComplianceViolation::new(
                codes::SANCTIONED,
                "Address is sanctioned",
            ));
        }

        violations
    }

    // ==================== Audit ====================

    /// Append an event; the timestamp is set at write time
    pub async fn log_compliance_event(&self, event: ComplianceEvent) {
        let entry = AuditEntry {
            event_type: event.event_type,
            address: event.address,
            details: event.details,
            severity: event.severity,
            timestamp: Utc::now(),
        };

        if let Err(e) = self.audit.log(entry).await {
            error!("Error logging compliance event: {}", e);
        }
    }

    /// Events for `address` in the last `days` days; empty on failure
    pub async fn audit_trail(&self, address: &str, days: u32) -> Vec<ComplianceEvent> {
        let window = chrono::Duration::days(i64::from(days));
        let Some(from) = Utc::now().checked_sub_signed(window) else {
            error!(
                "Audit trail window of {} days for {} is out of range",
                days, address
            );
            return Vec::new();
        };

        match self.audit.events_since(address, from).await {
            Ok(entries) => entries.into_iter().map(ComplianceEvent::from).collect(),
            Err(e) => {
                error!("Error retrieving audit trail for {}: {}", address, e);
                Vec::new()
            }
        }
    }

    /// Audit trail over the configured default window
    pub async fn audit_trail_default(&self, address: &str) -> Vec<ComplianceEvent> {
        self.audit_trail(address, self.config.audit_trail_days).await
    }

    fn record_submission(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_submission(outcome);
        }
    }

    fn record_screening(&self, source: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_screening(source);
        }
    }

    fn record_transfer(&self, decision: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_transfer(decision);
        }
    }
}
