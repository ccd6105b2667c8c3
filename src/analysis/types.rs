//! Core data types for wallet risk analysis.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::LayoutResult;
use crate::ingest::{EnrichedToken, Transfer, TransferDirection};

/// Named heuristic raised when a transfer statistic crosses its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SuspiciousPattern {
    /// More high-value transfers than the configured ceiling
    HighFrequencyLargeTransactions,
    /// Few distinct counterparties relative to the batch size
    LimitedAddressDiversity,
}

impl fmt::Display for SuspiciousPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuspiciousPattern::HighFrequencyLargeTransactions => {
                write!(f, "High frequency of large transactions")
            }
            SuspiciousPattern::LimitedAddressDiversity => write!(f, "Limited address diversity"),
        }
    }
}

/// Provider-side totals that are not derivable from the transfer batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletContext {
    /// Lifetime transaction count
    pub transaction_count: u64,
    /// Non-zero token balance rows
    pub token_count: usize,
}

/// Risk and activity profile of one transfer batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub transaction_count: u64,
    pub token_count: usize,
    pub recent_transaction_count: usize,
    pub high_value_transaction_count: usize,
    pub unique_address_count: usize,
    pub high_transaction_volume: bool,
    pub many_tokens: bool,
    pub recent_activity: bool,
    pub suspicious_patterns: BTreeSet<SuspiciousPattern>,
}

impl RiskProfile {
    /// Shape returned at the API boundary
    pub fn to_risk_result(&self) -> RiskResult {
        RiskResult {
            transaction_count: self.transaction_count,
            token_count: self.token_count,
            recent_transaction_count: self.recent_transaction_count,
            risk_factors: RiskFactors {
                high_transaction_volume: self.high_transaction_volume,
                many_tokens: self.many_tokens,
                recent_activity: self.recent_activity,
                high_value_transactions: self.high_value_transaction_count,
                unique_addresses: self.unique_address_count,
                suspicious_patterns: self
                    .suspicious_patterns
                    .iter()
                    .map(|p| p.to_string())
                    .collect(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskResult {
    pub transaction_count: u64,
    pub token_count: usize,
    pub recent_transaction_count: usize,
    pub risk_factors: RiskFactors,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactors {
    pub high_transaction_volume: bool,
    pub many_tokens: bool,
    pub recent_activity: bool,
    pub high_value_transactions: usize,
    pub unique_addresses: usize,
    pub suspicious_patterns: Vec<String>,
}

/// A transfer as listed in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedTransfer {
    #[serde(flatten)]
    pub transfer: Transfer,
    pub direction: TransferDirection,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub analysis_timestamp: String,
    pub transfer_records: usize,
    pub transfers_analyzed: usize,
    pub token_balances: usize,
}

/// Complete analysis of one wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletReport {
    pub metadata: AnalysisMetadata,
    pub address: String,
    /// Native balance in wei, as reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eth_balance: Option<String>,
    /// Native balance in ETH with six decimals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eth_balance_formatted: Option<String>,
    pub risk: RiskResult,
    pub tokens: Vec<EnrichedToken>,
    pub transfers: Vec<ProcessedTransfer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<LayoutResult>,
}
