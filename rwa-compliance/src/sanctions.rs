use crate::error::{ComplianceError, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SanctionsList {
    OFAC,          // US Office of Foreign Assets Control
    EU,            // European Union
    UN,            // United Nations
    UKHMT,         // UK His Majesty's Treasury
    Local(String), // Country-specific lists
}

impl SanctionsList {
    pub fn as_str(&self) -> &str {
        match self {
            SanctionsList::OFAC => "OFAC",
            SanctionsList::EU => "EU",
            SanctionsList::UN => "UN",
            SanctionsList::UKHMT => "UK_HMT",
            SanctionsList::Local(name) => name,
        }
    }
}

/// Listed party. `addresses` holds wallet addresses attributed to the party.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanctionsEntry {
    pub id: String,
    pub list: SanctionsList,
    pub names: Vec<String>,
    pub aliases: Vec<String>,
    pub addresses: Vec<String>,
    pub countries: Vec<String>,
    pub programs: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// A name hit with its similarity score
#[derive(Debug, Clone)]
pub struct NameMatch {
    pub entry: SanctionsEntry,
    pub similarity: f64,
}

/// SanctionsEngine holds the loaded lists and answers lookups against them
pub struct SanctionsEngine {
    // Map: list_name -> (entry_id -> SanctionsEntry)
    lists: Arc<DashMap<String, DashMap<String, SanctionsEntry>>>,
    fuzzy_threshold: f64,
}

impl SanctionsEngine {
    pub fn new(fuzzy_threshold: f64) -> Self {
        Self {
            lists: Arc::new(DashMap::new()),
            fuzzy_threshold,
        }
    }

    /// Load a list, replacing any previous version of it
    pub fn load_list(&self, list: SanctionsList, entries: Vec<SanctionsEntry>) -> Result<()> {
        let list_name = list.as_str().to_string();
        if list_name.is_empty() {
            return Err(ComplianceError::ListNotLoaded("unnamed list".to_string()));
        }

        let map = DashMap::new();
        for entry in entries {
            map.insert(entry.id.clone(), entry);
        }
        let count = map.len();

        self.lists.insert(list_name.clone(), map);
        info!("Loaded {} sanctions list with {} entries", list_name, count);

        Ok(())
    }

    /// Entries listing this wallet address (case-insensitive exact match)
    pub fn check_address(&self, address: &str) -> Vec<SanctionsEntry> {
        let needle = address.trim();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches = Vec::new();
        for list_entry in self.lists.iter() {
            for entry_ref in list_entry.value().iter() {
                let entry = entry_ref.value();
                if entry
                    .addresses
                    .iter()
                    .any(|a| a.trim().eq_ignore_ascii_case(needle))
                {
                    matches.push(entry.clone());
                }
            }
        }
        matches
    }

    /// Entries whose name or alias is similar enough to `name`
    pub fn check_name(&self, name: &str) -> Vec<NameMatch> {
        let normalized_name = Self::normalize_name(name);
        if normalized_name.is_empty() {
            return Vec::new();
        }

        let mut matches = Vec::new();
        for list_entry in self.lists.iter() {
            let list_name = list_entry.key();
            for entry_ref in list_entry.value().iter() {
                let entry = entry_ref.value();

                let best = entry
                    .names
                    .iter()
                    .chain(entry.aliases.iter())
                    .map(|candidate| {
                        strsim::normalized_levenshtein(
                            &normalized_name,
                            &Self::normalize_name(candidate),
                        )
                    })
                    .fold(0.0_f64, f64::max);

                if best >= self.fuzzy_threshold {
                    debug!(
                        "Sanctions name match in {}: entry {} (similarity {:.3})",
                        list_name, entry.id, best
                    );
                    matches.push(NameMatch {
                        entry: entry.clone(),
                        similarity: best,
                    });
                }
            }
        }
        matches
    }

    /// Entries covering a whole jurisdiction
    pub fn check_country(&self, country_code: &str) -> Vec<SanctionsEntry> {
        let country = country_code.trim();
        if country.is_empty() {
            return Vec::new();
        }

        let mut matches = Vec::new();
        for list_entry in self.lists.iter() {
            for entry_ref in list_entry.value().iter() {
                let entry = entry_ref.value();
                if entry
                    .countries
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(country))
                {
                    matches.push(entry.clone());
                }
            }
        }
        matches
    }

    pub fn total_entries(&self) -> usize {
        self.lists.iter().map(|l| l.value().len()).sum()
    }

    pub fn loaded_lists(&self) -> Vec<String> {
        self.lists.iter().map(|l| l.key().clone()).collect()
    }

    pub fn is_loaded(&self) -> bool {
        !self.lists.is_empty()
    }

    // Lowercase, strip punctuation, collapse whitespace
    fn normalize_name(name: &str) -> String {
        static PUNCTUATION: OnceLock<Regex> = OnceLock::new();
        let re = PUNCTUATION.get_or_init(|| Regex::new(r"[^\w\s]").expect("static pattern"));
        let cleaned = re.replace_all(name, "");
        cleaned
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}
