//! Prometheus metrics for compliance decisions
//!
//! - `compliance_kyc_submissions_total{outcome}` - accepted, invalid, duplicate, sanctioned, error
//! - `compliance_sanctions_screenings_total{source}` - cache, provider, error
//! - `compliance_transfer_decisions_total{decision}` - authorized, denied, error

use crate::error::Result;
use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::Arc;

/// Metrics collector, registered on its own registry
#[derive(Clone)]
pub struct Metrics {
    pub kyc_submissions: IntCounterVec,
    pub sanctions_screenings: IntCounterVec,
    pub transfer_decisions: IntCounterVec,
    registry: Arc<Registry>,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let kyc_submissions = IntCounterVec::new(
            Opts::new(
                "compliance_kyc_submissions_total",
                "KYC submissions by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(kyc_submissions.clone()))?;

        let sanctions_screenings = IntCounterVec::new(
            Opts::new(
                "compliance_sanctions_screenings_total",
                "Sanctions screenings by result source",
            ),
            &["source"],
        )?;
        registry.register(Box::new(sanctions_screenings.clone()))?;

        let transfer_decisions = IntCounterVec::new(
            Opts::new(
                "compliance_transfer_decisions_total",
                "Transfer authorization decisions",
            ),
            &["decision"],
        )?;
        registry.register(Box::new(transfer_decisions.clone()))?;

        Ok(Self {
            kyc_submissions,
            sanctions_screenings,
            transfer_decisions,
            registry,
        })
    }

    pub fn record_submission(&self, outcome: &str) {
        self.kyc_submissions.with_label_values(&[outcome]).inc();
    }

    pub fn record_screening(&self, source: &str) {
        self.sanctions_screenings.with_label_values(&[source]).inc();
    }

    pub fn record_transfer(&self, decision: &str) {
        self.transfer_decisions.with_label_values(&[decision]).inc();
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_independent_registries() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();

        a.record_screening("cache");
        a.record_screening("cache");

        assert_eq!(
            a.sanctions_screenings.with_label_values(&["cache"]).get(),
            2
        );
        assert_eq!(
            b.sanctions_screenings.with_label_values(&["cache"]).get(),
            0
        );
    }

    #[test]
    fn test_registration_error_maps_to_compliance_error() {
        let metrics = Metrics::new().unwrap();
        let duplicate = metrics
            .registry()
            .register(Box::new(metrics.kyc_submissions.clone()));

        let err = crate::ComplianceError::from(duplicate.unwrap_err());
        assert!(matches!(err, crate::ComplianceError::Metrics(_)));
    }
}
