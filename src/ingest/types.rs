//! Canonical entities produced by the ingestion adapter.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Provider transfer category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferCategory {
    /// Native transfer from an externally owned account
    External,
    /// Native transfer from inside a contract call
    Internal,
    /// Fungible token
    Erc20,
    /// Unique NFT
    Erc721,
    /// Batch NFT
    Erc1155,
    /// Category the adapter does not recognise, kept verbatim
    Other(String),
}

impl TransferCategory {
    /// Parse a provider category string
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "external" => TransferCategory::External,
            "internal" => TransferCategory::Internal,
            "erc20" | "token" => TransferCategory::Erc20,
            "erc721" => TransferCategory::Erc721,
            "erc1155" => TransferCategory::Erc1155,
            _ => TransferCategory::Other(raw.to_string()),
        }
    }

    pub fn is_token(&self) -> bool {
        matches!(
            self,
            TransferCategory::Erc20 | TransferCategory::Erc721 | TransferCategory::Erc1155
        )
    }
}

impl fmt::Display for TransferCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferCategory::External => write!(f, "external"),
            TransferCategory::Internal => write!(f, "internal"),
            TransferCategory::Erc20 => write!(f, "erc20"),
            TransferCategory::Erc721 => write!(f, "erc721"),
            TransferCategory::Erc1155 => write!(f, "erc1155"),
            TransferCategory::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// One asset movement, immutable once ingested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub hash: String,
    pub from: String,
    /// Absent for contract creation and burns
    pub to: Option<String>,
    /// Absent when the transfer is not denominated
    pub value: Option<f64>,
    pub asset: Option<String>,
    pub category: TransferCategory,
    pub block_number: u64,
}

impl Transfer {
    /// Direction of this transfer as seen from `wallet`
    pub fn direction(&self, wallet: &str) -> TransferDirection {
        let sent = self.from.eq_ignore_ascii_case(wallet);
        let received = self
            .to
            .as_deref()
            .is_some_and(|to| to.eq_ignore_ascii_case(wallet));

        match (sent, received) {
            (true, true) => TransferDirection::SelfTransfer,
            (false, true) => TransferDirection::Received,
            _ => TransferDirection::Sent,
        }
    }
}

/// Transfer direction relative to the analysed wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    Sent,
    Received,
    #[serde(rename = "self")]
    SelfTransfer,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferDirection::Sent => write!(f, "sent"),
            TransferDirection::Received => write!(f, "received"),
            TransferDirection::SelfTransfer => write!(f, "self"),
        }
    }
}

/// Raw token balance row as reported by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub contract_address: String,
    /// Hex-encoded balance; missing means zero
    #[serde(default, alias = "tokenBalance")]
    pub balance: Option<String>,
}

impl TokenBalance {
    /// True when the balance is missing or every hex digit is zero
    pub fn is_zero(&self) -> bool {
        match self.balance.as_deref() {
            None => true,
            Some(raw) => {
                let digits = raw
                    .trim()
                    .strip_prefix("0x")
                    .or_else(|| raw.trim().strip_prefix("0X"))
                    .unwrap_or(raw.trim());
                digits.chars().all(|c| c == '0')
            }
        }
    }
}

/// Token metadata returned by a lookup; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub decimals: Option<u8>,
    #[serde(default)]
    pub logo: Option<String>,
}

impl TokenMetadata {
    /// Record used when a lookup fails
    pub fn fallback() -> Self {
        Self {
            name: Some("Unknown Token".to_string()),
            symbol: Some("UNKNOWN".to_string()),
            decimals: Some(18),
            logo: None,
        }
    }

    /// Drop empty strings so that "" never stands in for a real value
    pub fn normalized(self) -> Self {
        fn non_empty(s: Option<String>) -> Option<String> {
            s.filter(|v| !v.trim().is_empty())
        }

        Self {
            name: non_empty(self.name),
            symbol: non_empty(self.symbol),
            decimals: self.decimals,
            logo: non_empty(self.logo),
        }
    }
}

/// How an enriched token got its metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupStatus {
    /// Metadata came from the source
    Resolved,
    /// The lookup failed and fallback values were used
    Fallback,
    /// Past the lookup cap; no metadata
    Skipped,
}

/// Token balance merged with its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedToken {
    pub contract_address: String,
    pub balance: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    pub logo: Option<String>,
    pub lookup: LookupStatus,
}

impl EnrichedToken {
    pub fn new(balance: &TokenBalance, metadata: TokenMetadata, lookup: LookupStatus) -> Self {
        Self {
            contract_address: balance.contract_address.clone(),
            balance: balance.balance.clone().unwrap_or_else(|| "0".to_string()),
            name: metadata.name,
            symbol: metadata.symbol,
            decimals: metadata.decimals,
            logo: metadata.logo,
            lookup,
        }
    }
}

/// Everything the data provider returned for one wallet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSnapshot {
    pub address: String,
    /// Native balance in wei, as a decimal or `0x` hex string
    #[serde(default)]
    pub balance: Option<String>,
    /// Lifetime transaction count reported by the provider
    #[serde(default)]
    pub transaction_count: u64,
    /// Loosely typed transfer records, normalised by the adapter
    #[serde(default)]
    pub transfers: Vec<serde_json::Value>,
    #[serde(default)]
    pub token_balances: Vec<TokenBalance>,
    /// Metadata keyed by contract address, when the provider inlined it.
    /// Entries are parsed per lookup.
    #[serde(default)]
    pub token_metadata: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(from: &str, to: Option<&str>) -> Transfer {
        Transfer {
            hash: "0xh".to_string(),
            from: from.to_string(),
            to: to.map(|s| s.to_string()),
            value: None,
            asset: None,
            category: TransferCategory::External,
            block_number: 1,
        }
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(TransferCategory::parse("external"), TransferCategory::External);
        assert_eq!(TransferCategory::parse("ERC20"), TransferCategory::Erc20);
        assert_eq!(TransferCategory::parse("erc1155"), TransferCategory::Erc1155);
        assert_eq!(
            TransferCategory::parse("specialnft"),
            TransferCategory::Other("specialnft".to_string())
        );
        assert!(TransferCategory::Erc721.is_token());
        assert!(!TransferCategory::Internal.is_token());
    }

    #[test]
    fn test_direction() {
        let wallet = "0xAbC";
        assert_eq!(transfer("0xabc", Some("0xdef")).direction(wallet), TransferDirection::Sent);
        assert_eq!(transfer("0xdef", Some("0xABC")).direction(wallet), TransferDirection::Received);
        assert_eq!(transfer("0xabc", Some("0xabc")).direction(wallet), TransferDirection::SelfTransfer);
        assert_eq!(transfer("0xabc", None).direction(wallet), TransferDirection::Sent);
    }

    #[test]
    fn test_zero_balance() {
        let zero = TokenBalance {
            contract_address: "0x1".to_string(),
            balance: Some(format!("0x{}", "0".repeat(64))),
        };
        assert!(zero.is_zero());

        let missing = TokenBalance { balance: None, ..zero.clone() };
        assert!(missing.is_zero());

        let some = TokenBalance { balance: Some("0x00000a".to_string()), ..zero };
        assert!(!some.is_zero());
    }

    #[test]
    fn test_metadata_normalized() {
        let meta = TokenMetadata {
            name: Some(String::new()),
            symbol: Some("USDC".to_string()),
            decimals: Some(0),
            logo: Some("  ".to_string()),
        }
        .normalized();

        assert_eq!(meta.name, None);
        assert_eq!(meta.symbol.as_deref(), Some("USDC"));
        // Zero decimals is a real value, not a missing one
        assert_eq!(meta.decimals, Some(0));
        assert_eq!(meta.logo, None);
    }
}
