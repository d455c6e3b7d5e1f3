//! Walks an onboarding and transfer flow against in-process collaborators

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rwa_compliance::{
    AesGcmPiiCipher, ComplianceConfig, ComplianceService, FileAuditLog,
    InMemoryComplianceRepository, KycData, KycStatus, ListSanctionsProvider, Metrics, PiiCipher,
    PlaintextPiiCipher, SanctionsEngine, SanctionsEntry, SanctionsList,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = ComplianceConfig::from_env()?;
    tracing::info!("Starting compliance demo with {:?}", config);

    let engine = Arc::new(SanctionsEngine::new(config.sanctions_fuzzy_threshold));
    engine.load_list(
        SanctionsList::OFAC,
        vec![SanctionsEntry {
            id: "OFAC-DEMO-1".to_string(),
            list: SanctionsList::OFAC,
            names: vec!["Ivan Blocked".to_string()],
            aliases: vec![],
            addresses: vec!["addr1_sanctioned".to_string()],
            countries: vec![],
            programs: vec!["CYBER2".to_string()],
            updated_at: Utc::now(),
        }],
    )?;

    let pii: Arc<dyn PiiCipher> = match std::env::var("COMPLIANCE_PII_KEY") {
        Ok(key) => Arc::new(AesGcmPiiCipher::from_hex_key(&key)?),
        Err(_) => {
            tracing::warn!("COMPLIANCE_PII_KEY not set, storing PII in plaintext");
            Arc::new(PlaintextPiiCipher)
        }
    };

    let repository = Arc::new(InMemoryComplianceRepository::new());
    let audit = Arc::new(FileAuditLog::open(&config.audit_log_path)?);
    let metrics = Metrics::new()?;

    let service = ComplianceService::new(
        config,
        repository.clone(),
        Arc::new(ListSanctionsProvider::new(engine)),
        audit.clone(),
        pii,
    )
    .with_metrics(metrics);

    for (address, name) in [("addr1_alice", "Alice Holder"), ("addr1_bob", "Bob Buyer")] {
        let result = service
            .submit_kyc(
                address,
                &KycData {
                    legal_name: name.to_string(),
                    date_of_birth: NaiveDate::from_ymd_opt(1985, 5, 17),
                    jurisdiction: "US".to_string(),
                    accreditation_level: "ACCREDITED".to_string(),
                    document_hash: format!("sha256:{}", address),
                },
            )
            .await;
        tracing::info!("KYC submission for {}: {:?}", address, result);

        // Stand-in for the external approval workflow
        repository.update_kyc(address, |record| {
            record.is_approved = true;
            record.status = KycStatus::Approved;
        });
    }

    let allowed = service
        .authorize_transfer("addr1_alice", "addr1_bob", Decimal::new(250_000, 2))
        .await;
    tracing::info!("Alice -> Bob: {:?}", allowed);

    let denied = service
        .authorize_transfer("addr1_alice", "addr1_sanctioned", Decimal::new(100, 0))
        .await;
    tracing::info!("Alice -> sanctioned: {:?}", denied.violation_codes());

    for event in service.audit_trail_default("addr1_alice").await {
        tracing::info!(
            "audit {} {} {}",
            event.timestamp,
            event.event_type,
            event.details.unwrap_or_default()
        );
    }

    audit.verify_integrity().await?;
    tracing::info!("Audit log integrity verified");

    Ok(())
}
