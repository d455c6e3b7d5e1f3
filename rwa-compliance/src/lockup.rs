//! Lockup and vesting restrictions on outgoing transfers

use crate::error::Result;
use crate::types::{codes, ComplianceViolation};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Restrictions a sender is subject to for a given amount
#[async_trait]
pub trait LockupPolicy: Send + Sync {
    async fn check(&self, address: &str, amount: Decimal) -> Result<Vec<ComplianceViolation>>;
}

/// Imposes no restrictions
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLockupPolicy;

#[async_trait]
impl LockupPolicy for NoLockupPolicy {
    async fn check(&self, _address: &str, _amount: Decimal) -> Result<Vec<ComplianceViolation>> {
        Ok(Vec::new())
    }
}

/// Per-address lockup schedule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockupSchedule {
    /// No transfers before this instant
    pub locked_until: Option<DateTime<Utc>>,

    /// Largest amount currently vested and transferable
    pub vested_allowance: Option<Decimal>,
}

/// Lockup policy backed by explicit per-address schedules
#[derive(Clone, Default)]
pub struct ScheduledLockupPolicy {
    schedules: Arc<DashMap<String, LockupSchedule>>,
}

impl ScheduledLockupPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_schedule(&self, address: &str, schedule: LockupSchedule) {
        self.schedules.insert(address.to_string(), schedule);
    }

    pub fn release(&self, address: &str) {
        self.schedules.remove(address);
    }

    fn violations_at(
        &self,
        address: &str,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Vec<ComplianceViolation> {
        let Some(schedule) = self.schedules.get(address) else {
            return Vec::new();
        };

        let mut violations = Vec::new();

        if let Some(until) = schedule.locked_until {
            if now < until {
                violations.push(ComplianceViolation::new(
                    codes::LOCKUP_ACTIVE,
                    format!("Sender tokens are locked until {}", until.to_rfc3339()),
                ));
            }
        }

        if let Some(allowance) = schedule.vested_allowance {
            if amount > allowance {
                violations.push(ComplianceViolation::new(
                    codes::VESTING_LIMIT_EXCEEDED,
                    format!("Amount {} exceeds vested allowance {}", amount, allowance),
                ));
            }
        }

        violations
    }
}

#[async_trait]
impl LockupPolicy for ScheduledLockupPolicy {
    async fn check(&self, address: &str, amount: Decimal) -> Result<Vec<ComplianceViolation>> {
        Ok(self.violations_at(address, amount, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_no_lockup_policy_is_empty() {
        let violations = NoLockupPolicy
            .check("addr1", Decimal::from(1_000_000))
            .await
            .unwrap();
        assert!(violations.is_empty());
    }

    #[tokio::test]
    async fn test_active_lockup_and_vesting() {
        let policy = ScheduledLockupPolicy::new();
        policy.set_schedule(
            "addr1",
            LockupSchedule {
                locked_until: Some(Utc::now() + Duration::days(30)),
                vested_allowance: Some(Decimal::from(500)),
            },
        );

        let violations = policy.check("addr1", Decimal::from(1_000)).await.unwrap();
        let found: Vec<_> = violations.iter().map(|v| v.code.as_str()).collect();
        assert_eq!(
            found,
            vec![codes::LOCKUP_ACTIVE, codes::VESTING_LIMIT_EXCEEDED]
        );

        assert!(policy
            .check("addr2", Decimal::from(1_000))
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_expired_lockup_and_release() {
        let policy = ScheduledLockupPolicy::new();
        let until = Utc::now();
        policy.set_schedule(
            "addr1",
            LockupSchedule {
                locked_until: Some(until),
                vested_allowance: None,
            },
        );

        assert!(policy.violations_at("addr1", Decimal::ONE, until).is_empty());
        assert_eq!(
            policy
                .violations_at("addr1", Decimal::ONE, until - Duration::seconds(1))
                .len(),
            1
        );

        policy.release("addr1");
        assert!(policy
            .violations_at("addr1", Decimal::ONE, until - Duration::seconds(1))
            .is_empty());
    }
}
