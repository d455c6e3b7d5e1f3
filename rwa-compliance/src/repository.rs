//! Persistence seam for KYC records and cached sanctions results

use crate::error::Result;
use crate::types::{CachedSanctionsResult, KycRecord, SanctionsCheckResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Compliance data repository
#[async_trait]
pub trait ComplianceRepository: Send + Sync {
    async fn get_kyc(&self, address: &str) -> Result<Option<KycRecord>>;

    /// Insert or replace the record for `record.address`
    async fn save_kyc(&self, record: KycRecord) -> Result<()>;

    async fn get_cached_sanctions_result(
        &self,
        address: &str,
    ) -> Result<Option<CachedSanctionsResult>>;

    /// Cache a result for `address`, overwriting any prior entry
    async fn cache_sanctions_result(
        &self,
        address: &str,
        result: SanctionsCheckResult,
    ) -> Result<()>;
}

/// In-memory repository keyed by address
#[derive(Clone, Default)]
pub struct InMemoryComplianceRepository {
    kyc: Arc<DashMap<String, KycRecord>>,
    sanctions_cache: Arc<DashMap<String, CachedSanctionsResult>>,
}

impl InMemoryComplianceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a cache entry with an explicit timestamp
    pub fn insert_cached_result(
        &self,
        address: &str,
        result: SanctionsCheckResult,
        cached_at: DateTime<Utc>,
    ) {
        self.sanctions_cache.insert(
            address.to_string(),
            CachedSanctionsResult {
                address: address.to_string(),
                result,
                cached_at,
            },
        );
    }

    /// Apply an external approval-workflow decision to a stored record
    pub fn update_kyc<F>(&self, address: &str, f: F) -> bool
    where
        F: FnOnce(&mut KycRecord),
    {
        match self.kyc.get_mut(address) {
            Some(mut record) => {
                f(&mut record);
                true
            }
            None => false,
        }
    }

    pub fn kyc_count(&self) -> usize {
        self.kyc.len()
    }
}

#[async_trait]
impl ComplianceRepository for InMemoryComplianceRepository {
    async fn get_kyc(&self, address: &str) -> Result<Option<KycRecord>> {
        Ok(self.kyc.get(address).map(|r| r.value().clone()))
    }

    async fn save_kyc(&self, record: KycRecord) -> Result<()> {
        self.kyc.insert(record.address.clone(), record);
        Ok(())
    }

    async fn get_cached_sanctions_result(
        &self,
        address: &str,
    ) -> Result<Option<CachedSanctionsResult>> {
        Ok(self.sanctions_cache.get(address).map(|r| r.value().clone()))
    }

    async fn cache_sanctions_result(
        &self,
        address: &str,
        result: SanctionsCheckResult,
    ) -> Result<()> {
        self.insert_cached_result(address, result, Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{KycData, KycStatus};

    fn record(address: &str) -> KycRecord {
        let data = KycData {
            legal_name: "Jane Doe".to_string(),
            date_of_birth: None,
            jurisdiction: "US".to_string(),
            accreditation_level: "RETAIL".to_string(),
            document_hash: "abc123".to_string(),
        };
        KycRecord::pending(
            address,
            "n".to_string(),
            "d".to_string(),
            &data,
            Utc::now(),
            1,
        )
    }

    #[tokio::test]
    async fn test_one_record_per_address() {
        let repo = InMemoryComplianceRepository::new();
        repo.save_kyc(record("addr1")).await.unwrap();
        repo.save_kyc(record("addr1")).await.unwrap();

        assert_eq!(repo.kyc_count(), 1);
        assert!(repo.get_kyc("addr2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_kyc() {
        let repo = InMemoryComplianceRepository::new();
        repo.save_kyc(record("addr1")).await.unwrap();

        assert!(repo.update_kyc("addr1", |r| r.status = KycStatus::Suspended));
        assert!(!repo.update_kyc("missing", |r| r.status = KycStatus::Blocked));

        let stored = repo.get_kyc("addr1").await.unwrap().unwrap();
        assert_eq!(stored.status, KycStatus::Suspended);
    }

    #[tokio::test]
    async fn test_cache_overwrites() {
        let repo = InMemoryComplianceRepository::new();
        repo.cache_sanctions_result("addr1", SanctionsCheckResult::clear())
            .await
            .unwrap();
        repo.cache_sanctions_result("addr1", SanctionsCheckResult::fail_closed())
            .await
            .unwrap();

        let cached = repo
            .get_cached_sanctions_result("addr1")
            .await
            .unwrap()
            .unwrap();
        assert!(cached.result.is_match);
    }
}
