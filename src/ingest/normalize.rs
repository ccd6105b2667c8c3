//! Normalisation of loosely typed provider transfer records.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result};
use serde_json::Value;

use super::types::*;

/// Normalise provider records into canonical transfers.
///
/// Records without a hash, a sender or a parseable block number are skipped.
pub fn normalize_transfers(records: &[Value]) -> Vec<Transfer> {
    let mut transfers = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for record in records {
        match normalize_transfer(record) {
            Some(transfer) => transfers.push(transfer),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {} malformed transfer records", skipped);
    }
    log::debug!("Normalised {} transfers", transfers.len());

    transfers
}

/// Normalise a single record
pub fn normalize_transfer(record: &Value) -> Option<Transfer> {
    let hash = string_field(record, "hash")?;
    let from = string_field(record, "from")?;
    let block_number = record
        .get("blockNum")
        .or_else(|| record.get("blockNumber"))
        .and_then(parse_block_number)?;

    let category = string_field(record, "category")
        .map(|c| TransferCategory::parse(&c))
        .unwrap_or(TransferCategory::Other(String::new()));

    Some(Transfer {
        hash,
        from,
        to: string_field(record, "to"),
        value: record.get("value").and_then(parse_value),
        asset: string_field(record, "asset"),
        category,
        block_number,
    })
}

/// Trimmed string at `key`; null, empty and non-string values are `None`
fn string_field(record: &Value, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a value given as a JSON number or a numeric string
fn parse_value(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Parse a block number given as a number, a decimal string or a `0x` hex string
fn parse_block_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16).ok(),
                None => s.parse().ok(),
            }
        }
        _ => None,
    }
}

/// Load a provider snapshot from a JSON file
pub fn load_snapshot(path: &Path) -> Result<WalletSnapshot> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot from {}", path.display()))?;

    let snapshot: WalletSnapshot =
        serde_json::from_str(&content).context("Failed to parse snapshot JSON")?;

    log::info!(
        "Loaded snapshot for {}: {} transfer records, {} token balances",
        snapshot.address,
        snapshot.transfers.len(),
        snapshot.token_balances.len()
    );

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_record() {
        let record = json!({
            "hash": "0xaaa",
            "from": "0x111",
            "to": "0x222",
            "value": 1.5,
            "asset": "ETH",
            "category": "external",
            "blockNum": "0x10"
        });

        let t = normalize_transfer(&record).unwrap();
        assert_eq!(t.hash, "0xaaa");
        assert_eq!(t.to.as_deref(), Some("0x222"));
        assert_eq!(t.value, Some(1.5));
        assert_eq!(t.asset.as_deref(), Some("ETH"));
        assert_eq!(t.category, TransferCategory::External);
        assert_eq!(t.block_number, 16);
    }

    #[test]
    fn test_optional_fields_become_none() {
        let record = json!({
            "hash": "0xbbb",
            "from": "0x111",
            "to": null,
            "asset": "",
            "category": "erc721",
            "blockNumber": 42
        });

        let t = normalize_transfer(&record).unwrap();
        assert_eq!(t.to, None);
        assert_eq!(t.value, None);
        assert_eq!(t.asset, None);
        assert_eq!(t.block_number, 42);
    }

    #[test]
    fn test_string_fields_trimmed_and_typed() {
        let record = json!({
            "hash": " 0xccc ",
            "from": "0x111",
            "to": 7,
            "asset": "  ",
            "category": "external",
            "blockNum": "0x2a"
        });

        let t = normalize_transfer(&record).unwrap();
        assert_eq!(t.hash, "0xccc");
        assert_eq!(t.to, None);
        assert_eq!(t.asset, None);

        let numeric_hash = json!({"hash": 5, "from": "0x111", "blockNum": 1});
        assert!(normalize_transfer(&numeric_hash).is_none());
    }

    #[test]
    fn test_value_as_string() {
        let record = json!({
            "hash": "0xccc",
            "from": "0x1",
            "value": "12.25",
            "category": "erc20",
            "blockNum": "100"
        });
        assert_eq!(normalize_transfer(&record).unwrap().value, Some(12.25));

        let record = json!({
            "hash": "0xccc",
            "from": "0x1",
            "value": "n/a",
            "category": "erc20",
            "blockNum": "100"
        });
        assert_eq!(normalize_transfer(&record).unwrap().value, None);
    }

    #[test]
    fn test_malformed_records_skipped() {
        let records = vec![
            json!({"from": "0x1", "blockNum": "0x1", "category": "external"}),
            json!({"hash": "0x2", "blockNum": "0x1", "category": "external"}),
            json!({"hash": "0x3", "from": "0x1", "blockNum": "zz", "category": "external"}),
            json!({"hash": "0x4", "from": "0x1", "blockNum": "0x1", "category": "external"}),
            json!("not an object"),
        ];

        let transfers = normalize_transfers(&records);
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].hash, "0x4");
    }

    #[test]
    fn test_empty_batch() {
        assert!(normalize_transfers(&[]).is_empty());
    }
}
