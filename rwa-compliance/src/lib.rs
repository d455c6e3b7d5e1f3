//! Compliance authorization for tokenized real-world-asset transfers
//!
//! KYC submission and validity, sanctions screening with a result cache,
//! transfer authorization and an append-only audit trail.
//!
//! # Collaborators
//!
//! - **ComplianceRepository**: KYC records and cached sanctions results
//! - **SanctionsProvider**: external screening lookup
//! - **AuditLogger**: immutable audit entries
//! - **PiiCipher**: encryption of PII before persistence
//! - **LockupPolicy**: lockup and vesting restrictions on senders
//!
//! # Invariants
//!
//! - Screening and authorization fail closed: an internal error never grants passage
//! - A cached sanctions result older than the validity window is never served
//! - Audit entries are never updated or deleted

#![forbid(unsafe_code)]

pub mod audit;
pub mod config;
pub mod error;
pub mod kyc;
pub mod lockup;
pub mod metrics;
pub mod pii;
pub mod repository;
pub mod sanctions;
pub mod screening;
pub mod service;
pub mod types;

pub use audit::{AuditLogger, FileAuditLog, InMemoryAuditLog};
pub use config::ComplianceConfig;
pub use error::{ComplianceError, Result};
pub use lockup::{LockupPolicy, LockupSchedule, NoLockupPolicy, ScheduledLockupPolicy};
pub use metrics::Metrics;
pub use pii::{AesGcmPiiCipher, PiiCipher, PlaintextPiiCipher};
pub use repository::{ComplianceRepository, InMemoryComplianceRepository};
pub use sanctions::{SanctionsEngine, SanctionsEntry, SanctionsList};
pub use screening::{ListSanctionsProvider, SanctionsProvider};
pub use service::ComplianceService;
pub use types::*;
