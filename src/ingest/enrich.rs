//! Token metadata enrichment.
//!
//! Lookups are independent per token and run on a bounded rayon pool. A
//! failed lookup is replaced by fallback metadata; it never fails the batch.

use std::collections::HashMap;

use color_eyre::eyre::{Context, Result};
use rayon::prelude::*;

use serde::Deserialize;

use super::types::*;
use crate::config::IngestionConfig;

/// Metadata lookup failure for a single contract
#[derive(Debug, Clone, thiserror::Error)]
pub enum LookupError {
    #[error("No metadata for contract {0}")]
    NotFound(String),
    #[error("Provider error for contract {contract}: {message}")]
    Provider { contract: String, message: String },
    #[error("Malformed metadata for contract {contract}: {message}")]
    Malformed { contract: String, message: String },
}

/// Source of token metadata, keyed by contract address
pub trait MetadataSource: Send + Sync {
    fn token_metadata(&self, contract_address: &str) -> Result<TokenMetadata, LookupError>;
}

/// Metadata source backed by the map inlined in a snapshot.
///
/// Entries stay loosely typed until looked up, so one bad entry only affects
/// its own token.
#[derive(Debug, Clone, Default)]
pub struct SnapshotMetadata {
    entries: HashMap<String, serde_json::Value>,
}

impl SnapshotMetadata {
    pub fn new(entries: &HashMap<String, serde_json::Value>) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                .collect(),
        }
    }
}

impl MetadataSource for SnapshotMetadata {
    fn token_metadata(&self, contract_address: &str) -> Result<TokenMetadata, LookupError> {
        let entry = self
            .entries
            .get(&contract_address.to_ascii_lowercase())
            .ok_or_else(|| LookupError::NotFound(contract_address.to_string()))?;

        TokenMetadata::deserialize(entry).map_err(|e| LookupError::Malformed {
            contract: contract_address.to_string(),
            message: e.to_string(),
        })
    }
}

/// Number of balance rows with a non-zero balance. Matches the number of
/// records `enrich_tokens` returns for the same rows.
pub fn count_nonzero_tokens(balances: &[TokenBalance]) -> usize {
    balances.iter().filter(|b| !b.is_zero()).count()
}

/// Enrich non-zero token balances with metadata.
///
/// Only the first `metadata_lookup_cap` tokens are looked up; the rest are
/// returned as `Skipped`. Output order follows input order.
pub fn enrich_tokens(
    balances: &[TokenBalance],
    source: &dyn MetadataSource,
    config: &IngestionConfig,
) -> Result<Vec<EnrichedToken>> {
    let nonzero: Vec<&TokenBalance> = balances.iter().filter(|b| !b.is_zero()).collect();
    let cap = config.metadata_lookup_cap.min(nonzero.len());
    let (to_lookup, beyond_cap) = nonzero.split_at(cap);

    log::info!(
        "Enriching {} tokens ({} lookups, {} past the cap)",
        nonzero.len(),
        to_lookup.len(),
        beyond_cap.len()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.lookup_parallelism.max(1))
        .build()
        .context("Failed to build metadata lookup pool")?;

    let mut tokens: Vec<EnrichedToken> = pool.install(|| {
        to_lookup
            .par_iter()
            .map(|balance| lookup_one(balance, source))
            .collect()
    });

    tokens.extend(
        beyond_cap
            .iter()
            .map(|balance| EnrichedToken::new(balance, TokenMetadata::default(), LookupStatus::Skipped)),
    );

    let fallbacks = tokens.iter().filter(|t| t.lookup == LookupStatus::Fallback).count();
    if fallbacks > 0 {
        log::warn!("{} of {} metadata lookups fell back to defaults", fallbacks, to_lookup.len());
    }

    Ok(tokens)
}

fn lookup_one(balance: &TokenBalance, source: &dyn MetadataSource) -> EnrichedToken {
    match source.token_metadata(&balance.contract_address) {
        Ok(metadata) => EnrichedToken::new(balance, metadata.normalized(), LookupStatus::Resolved),
        Err(e) => {
            log::warn!("Error getting metadata for {}: {}", balance.contract_address, e);
            EnrichedToken::new(balance, TokenMetadata::fallback(), LookupStatus::Fallback)
        }
    }
}
