//! Audit trail
//!
//! Append-only record of compliance decisions. Entries are never updated or
//! deleted; queries are read-only over a time window.
//!
//! Two backends:
//! - [`InMemoryAuditLog`] for tests and embedding
//! - [`FileAuditLog`], JSON lines with a SHA-256 hash chain for tamper detection

use crate::error::{ComplianceError, Result};
use crate::types::AuditEntry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Event type codes written by the compliance service
pub mod events {
    pub const KYC_VALIDATION_FAILED: &str = "KYC_VALIDATION_FAILED";
    pub const KYC_SUBMITTED: &str = "KYC_SUBMITTED";
    pub const KYC_EXPIRED: &str = "KYC_EXPIRED";
    pub const SANCTIONS_MATCH: &str = "SANCTIONS_MATCH";
    pub const TRANSFER_DENIED: &str = "TRANSFER_DENIED";
}

/// Audit logger
#[async_trait]
pub trait AuditLogger: Send + Sync {
    /// Append `entry` as given. Loggers store the caller's timestamp; the
    /// service stamps its own entries at write time, and backfills or
    /// imports may carry historical times.
    async fn log(&self, entry: AuditEntry) -> Result<()>;

    /// Entries for `address` with `timestamp >= from`, oldest first
    async fn events_since(&self, address: &str, from: DateTime<Utc>) -> Result<Vec<AuditEntry>>;
}

#[derive(Default)]
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry ever written, in order
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    pub async fn count_of(&self, event_type: &str) -> usize {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }
}

#[async_trait]
impl AuditLogger for InMemoryAuditLog {
    async fn log(&self, entry: AuditEntry) -> Result<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn events_since(&self, address: &str, from: DateTime<Utc>) -> Result<Vec<AuditEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.address == address && e.timestamp >= from)
            .cloned()
            .collect())
    }
}

/// One line of the file-backed log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainedAuditRecord {
    pub entry_id: Uuid,
    #[serde(flatten)]
    pub entry: AuditEntry,
    pub previous_hash: String,
    pub hash: String,
}

impl ChainedAuditRecord {
    fn new(entry: AuditEntry, previous_hash: String) -> Self {
        let mut record = Self {
            entry_id: Uuid::new_v4(),
            entry,
            previous_hash,
            hash: String::new(),
        };
        record.hash = record.compute_hash();
        record
    }

    fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();

        hasher.update(self.entry_id.as_bytes());
        hasher.update(self.entry.timestamp.to_rfc3339().as_bytes());
        hasher.update(self.entry.event_type.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.entry.address.as_bytes());
        hasher.update([0u8]);
        if let Some(details) = &self.entry.details {
            hasher.update(details.as_bytes());
        }
        hasher.update([0u8]);
        if let Some(severity) = &self.entry.severity {
            hasher.update(severity.to_string().as_bytes());
        }
        hasher.update(self.previous_hash.as_bytes());

        hex::encode(hasher.finalize())
    }

    pub fn verify_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

struct FileState {
    file: File,
    last_hash: String,
}

/// Append-only JSON-lines audit log with a hash chain
pub struct FileAuditLog {
    path: PathBuf,
    state: Mutex<FileState>,
}

impl FileAuditLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let last_hash = Self::read_last_hash(&path)?;

        Ok(Self {
            path,
            state: Mutex::new(FileState { file, last_hash }),
        })
    }

    fn read_last_hash(path: &Path) -> Result<String> {
        let reader = BufReader::new(File::open(path)?);

        let mut last_hash = String::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: ChainedAuditRecord = serde_json::from_str(&line)?;
            last_hash = record.hash;
        }
        Ok(last_hash)
    }

    fn read_records(&self) -> Result<Vec<ChainedAuditRecord>> {
        let reader = BufReader::new(File::open(&self.path)?);

        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }

    /// Walk the chain; fails on the first tampered or reordered line
    pub async fn verify_integrity(&self) -> Result<bool> {
        // Hold the writer lock so the tail is not half-written
        let _state = self.state.lock().await;

        let mut previous_hash = String::new();
        for (i, record) in self.read_records()?.into_iter().enumerate() {
            if !record.verify_hash() {
                return Err(ComplianceError::IntegrityFailure(format!(
                    "Entry hash mismatch at line {}",
                    i + 1
                )));
            }
            if record.previous_hash != previous_hash {
                return Err(ComplianceError::IntegrityFailure(format!(
                    "Hash chain broken at line {}",
                    i + 1
                )));
            }
            previous_hash = record.hash;
        }

        Ok(true)
    }
}

#[async_trait]
impl AuditLogger for FileAuditLog {
    async fn log(&self, entry: AuditEntry) -> Result<()> {
        let mut state = self.state.lock().await;

        let record = ChainedAuditRecord::new(entry, state.last_hash.clone());
        let mut json = serde_json::to_string(&record)?;
        json.push('\n');

        state.file.write_all(json.as_bytes())?;
        state.file.flush()?;
        state.last_hash = record.hash;

        Ok(())
    }

    async fn events_since(&self, address: &str, from: DateTime<Utc>) -> Result<Vec<AuditEntry>> {
        let _state = self.state.lock().await;

        Ok(self
            .read_records()?
            .into_iter()
            .map(|r| r.entry)
            .filter(|e| e.address == address && e.timestamp >= from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuditSeverity;
    use chrono::Duration;
    use tempfile::tempdir;

    fn entry(address: &str) -> AuditEntry {
        AuditEntry::new(events::SANCTIONS_MATCH, address)
            .with_details("Type: ADDRESS; Lists: OFAC")
            .with_severity(AuditSeverity::Critical)
    }

    #[tokio::test]
    async fn test_in_memory_window() {
        let log = InMemoryAuditLog::new();
        let mut old = entry("addr1");
        old.timestamp = Utc::now() - Duration::days(100);
        log.log(old).await.unwrap();
        log.log(entry("addr1")).await.unwrap();
        log.log(entry("addr2")).await.unwrap();

        let recent = log
            .events_since("addr1", Utc::now() - Duration::days(90))
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(log.count_of(events::SANCTIONS_MATCH).await, 3);
    }

    #[tokio::test]
    async fn test_file_log_hash_chain() {
        let temp_dir = tempdir().unwrap();
        let log = FileAuditLog::open(temp_dir.path().join("audit.log")).unwrap();

        for i in 0..5 {
            log.log(entry(&format!("addr{}", i))).await.unwrap();
        }

        assert!(log.verify_integrity().await.unwrap());
        let events = log
            .events_since("addr3", Utc::now() - Duration::days(1))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Some(AuditSeverity::Critical));
    }

    #[tokio::test]
    async fn test_file_log_resumes_chain() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("audit.log");

        {
            let log = FileAuditLog::open(&path).unwrap();
            log.log(entry("addr1")).await.unwrap();
        }

        let log = FileAuditLog::open(&path).unwrap();
        log.log(entry("addr1")).await.unwrap();
        assert!(log.verify_integrity().await.unwrap());
    }

    #[tokio::test]
    async fn test_file_log_keeps_caller_timestamp() {
        let temp_dir = tempdir().unwrap();
        let log = FileAuditLog::open(temp_dir.path().join("audit.log")).unwrap();
        let imported_at = Utc::now() - Duration::days(200);
        let mut imported = entry("addr1");
        imported.timestamp = imported_at;
        log.log(imported).await.unwrap();

        assert!(log.verify_integrity().await.unwrap());
        let events = log
            .events_since("addr1", imported_at - Duration::days(1))
            .await
            .unwrap();
        assert_eq!(events[0].timestamp, imported_at);
        assert!(log
            .events_since("addr1", Utc::now() - Duration::days(90))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_tampering_detected() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("audit.log");
        let log = FileAuditLog::open(&path).unwrap();
        log.log(entry("addr1")).await.unwrap();
        log.log(entry("addr2")).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, content.replacen("addr1", "addr9", 1)).unwrap();

        assert!(matches!(
            log.verify_integrity().await,
            Err(ComplianceError::IntegrityFailure(_))
        ));
    }
}
