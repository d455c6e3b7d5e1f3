//! Property-based tests for compliance invariants
//!
//! - Expired KYC never verifies, whatever the approval flag
//! - A cache entry past the validity window is never served
//! - Screening failures always block

use async_trait::async_trait;
use chrono::{Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rwa_compliance::{
    ComplianceConfig, ComplianceError, ComplianceRepository, ComplianceService, InMemoryAuditLog,
    InMemoryComplianceRepository, KycData, KycRecord, KycStatus, PlaintextPiiCipher, Result,
    SanctionsCheckResult, SanctionsProvider, ScreeningRequest,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Always reports a match and counts calls
#[derive(Default)]
struct MatchingProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl SanctionsProvider for MatchingProvider {
    async fn screen(&self, _request: &ScreeningRequest) -> Result<SanctionsCheckResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SanctionsCheckResult {
            is_match: true,
            match_type: Some("NAME".to_string()),
            matched_lists: vec!["UN".to_string()],
            match_score: Decimal::new(92, 2),
        })
    }
}

struct FailingProvider;

#[async_trait]
impl SanctionsProvider for FailingProvider {
    async fn screen(&self, _request: &ScreeningRequest) -> Result<SanctionsCheckResult> {
        Err(ComplianceError::Provider("503 Service Unavailable".to_string()))
    }
}

fn service_with(
    repository: Arc<InMemoryComplianceRepository>,
    provider: Arc<dyn SanctionsProvider>,
    validity_days: u32,
) -> ComplianceService {
    let config = ComplianceConfig {
        sanctions_cache_validity_days: validity_days,
        ..ComplianceConfig::default()
    };
    ComplianceService::new(
        config,
        repository,
        provider,
        Arc::new(InMemoryAuditLog::new()),
        Arc::new(PlaintextPiiCipher),
    )
}

fn status_strategy() -> impl Strategy<Value = KycStatus> {
    prop_oneof![
        Just(KycStatus::Pending),
        Just(KycStatus::Approved),
        Just(KycStatus::Restricted),
        Just(KycStatus::Suspended),
        Just(KycStatus::Blocked),
    ]
}

fn address_strategy() -> impl Strategy<Value = String> {
    "addr1[a-z0-9]{20}"
}

proptest! {
    #[test]
    fn prop_expired_kyc_never_verifies(
        approved in any::<bool>(),
        status in status_strategy(),
        expired_minutes in 1i64..1_000_000,
        address in address_strategy(),
    ) {
        let repository = Arc::new(InMemoryComplianceRepository::new());
        let service = service_with(repository.clone(), Arc::new(MatchingProvider::default()), 30);

        let data = KycData {
            legal_name: "Jane Doe".to_string(),
            date_of_birth: None,
            jurisdiction: "US".to_string(),
            accreditation_level: "RETAIL".to_string(),
            document_hash: "abc123".to_string(),
        };
        let now = Utc::now();
        let mut record = KycRecord::pending(
            &address,
            String::new(),
            String::new(),
            &data,
            now - Duration::days(400),
            1,
        );
        record.is_approved = approved;
        record.status = status;
        record.expiry_timestamp = now - Duration::minutes(expired_minutes);

        let valid = tokio_test::block_on(async {
            repository.save_kyc(record).await.unwrap();
            service.verify_kyc(&address).await
        });
        prop_assert!(!valid);
    }

    #[test]
    fn prop_stale_cache_never_served(
        validity_days in 1u32..365,
        extra_hours in 1i64..10_000,
        address in address_strategy(),
    ) {
        let repository = Arc::new(InMemoryComplianceRepository::new());
        let provider = Arc::new(MatchingProvider::default());
        let service = service_with(repository.clone(), provider.clone(), validity_days);

        repository.insert_cached_result(
            &address,
            SanctionsCheckResult::clear(),
            Utc::now() - Duration::days(i64::from(validity_days)) - Duration::hours(extra_hours),
        );

        let result = tokio_test::block_on(service.screen_for_sanctions(&address, "Jane Doe", "US"));
        prop_assert!(result.is_match);
        prop_assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn prop_fresh_cache_served(
        validity_days in 1u32..365,
        age_hours in 0i64..24,
        address in address_strategy(),
    ) {
        let repository = Arc::new(InMemoryComplianceRepository::new());
        let provider = Arc::new(MatchingProvider::default());
        let service = service_with(repository.clone(), provider.clone(), validity_days);

        repository.insert_cached_result(
            &address,
            SanctionsCheckResult::clear(),
            Utc::now() - Duration::hours(age_hours),
        );

        let result = tokio_test::block_on(service.screen_for_sanctions(&address, "Jane Doe", "US"));
        prop_assert!(!result.is_match);
        prop_assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn prop_screening_failure_blocks(address in address_strategy(), name in "[A-Za-z ]{0,30}") {
        let repository = Arc::new(InMemoryComplianceRepository::new());
        let service = service_with(repository, Arc::new(FailingProvider), 30);

        let result = tokio_test::block_on(service.screen_for_sanctions(&address, &name, "US"));
        prop_assert!(result.is_match);
        prop_assert_eq!(
            result.match_type.as_deref(),
            Some(SanctionsCheckResult::ERROR_DEFAULT_BLOCK)
        );
    }
}
