//! Risk heuristics over a transfer batch.
//!
//! The profile depends only on the multiset of transfers, never on their
//! order. Volume and token flags use provider totals; the diversity pattern
//! uses the batch size as its denominator.

use std::collections::{BTreeSet, HashSet};

use super::types::*;
use crate::config::RiskThresholds;
use crate::ingest::Transfer;

/// Compute the risk profile of a transfer batch
pub fn analyze_risk(
    transfers: &[Transfer],
    context: &WalletContext,
    thresholds: &RiskThresholds,
) -> RiskProfile {
    let mut unique_addresses: HashSet<&str> = HashSet::new();
    let mut high_value_transaction_count = 0;

    for transfer in transfers {
        if transfer.value.unwrap_or(0.0) > thresholds.high_value_threshold {
            high_value_transaction_count += 1;
        }
        unique_addresses.insert(transfer.from.as_str());
        if let Some(to) = &transfer.to {
            unique_addresses.insert(to.as_str());
        }
    }

    let unique_address_count = unique_addresses.len();
    let mut suspicious_patterns = BTreeSet::new();

    if high_value_transaction_count > thresholds.large_tx_frequency_ceiling {
        suspicious_patterns.insert(SuspiciousPattern::HighFrequencyLargeTransactions);
    }
    if (unique_address_count as f64) < transfers.len() as f64 * thresholds.diversity_ratio {
        suspicious_patterns.insert(SuspiciousPattern::LimitedAddressDiversity);
    }

    log::debug!(
        "Risk: {} transfers, {} high-value, {} unique addresses, {} patterns",
        transfers.len(),
        high_value_transaction_count,
        unique_address_count,
        suspicious_patterns.len()
    );

    RiskProfile {
        transaction_count: context.transaction_count,
        token_count: context.token_count,
        recent_transaction_count: transfers.len(),
        high_value_transaction_count,
        unique_address_count,
        high_transaction_volume: context.transaction_count > thresholds.tx_count_ceiling,
        many_tokens: context.token_count > thresholds.token_count_ceiling,
        recent_activity: !transfers.is_empty(),
        suspicious_patterns,
    }
}
