use crate::error::{ComplianceError, Result};
use crate::sanctions::SanctionsEngine;
use crate::types::{SanctionsCheckResult, ScreeningRequest};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// External sanctions screening lookup
#[async_trait]
pub trait SanctionsProvider: Send + Sync {
    async fn screen(&self, request: &ScreeningRequest) -> Result<SanctionsCheckResult>;
}

/// Match type codes reported by [`ListSanctionsProvider`], strongest first
pub mod match_types {
    pub const ADDRESS: &str = "ADDRESS";
    pub const NAME: &str = "NAME";
    pub const JURISDICTION: &str = "JURISDICTION";
}

/// Screens against the lists held by an in-process [`SanctionsEngine`]
pub struct ListSanctionsProvider {
    engine: Arc<SanctionsEngine>,
}

impl ListSanctionsProvider {
    pub fn new(engine: Arc<SanctionsEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl SanctionsProvider for ListSanctionsProvider {
    async fn screen(&self, request: &ScreeningRequest) -> Result<SanctionsCheckResult> {
        // An empty engine would clear everyone
        if !self.engine.is_loaded() {
            return Err(ComplianceError::ListNotLoaded(
                "no sanctions lists loaded".to_string(),
            ));
        }

        let mut matched_lists = Vec::new();
        let mut match_type: Option<&str> = None;
        let mut score = 0.0_f64;

        // 1. Wallet address
        let address_hits = self.engine.check_address(&request.address);
        if !address_hits.is_empty() {
            match_type = Some(match_types::ADDRESS);
            score = 1.0;
            matched_lists.extend(address_hits.iter().map(|e| e.list.as_str().to_string()));
            warn!("Sanctioned wallet address: {}", request.address);
        }

        // 2. Legal name
        let name_hits = self.engine.check_name(&request.name);
        if !name_hits.is_empty() {
            match_type = match_type.or(Some(match_types::NAME));
            for hit in &name_hits {
                score = score.max(hit.similarity);
                matched_lists.push(hit.entry.list.as_str().to_string());
            }
            warn!("Sanctions name match for address {}", request.address);
        }

        // 3. Jurisdiction
        let country_hits = self.engine.check_country(&request.jurisdiction);
        if !country_hits.is_empty() {
            match_type = match_type.or(Some(match_types::JURISDICTION));
            score = 1.0_f64.max(score);
            matched_lists.extend(country_hits.iter().map(|e| e.list.as_str().to_string()));
        }

        matched_lists.sort();
        matched_lists.dedup();

        let result = SanctionsCheckResult {
            is_match: match_type.is_some(),
            match_type: match_type.map(str::to_string),
            matched_lists,
            match_score: Decimal::from_f64_retain(score)
                .unwrap_or(Decimal::ZERO)
                .round_dp(4),
        };

        if result.is_match {
            info!(
                "Screening MATCH for {} (type: {}, lists: {})",
                request.address,
                result.match_type_str(),
                result.matched_lists.join(", ")
            );
        }

        Ok(result)
    }
}
