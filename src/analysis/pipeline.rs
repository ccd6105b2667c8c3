//! End-to-end analysis of one wallet snapshot.

use color_eyre::eyre::Result;

use super::risk::analyze_risk;
use super::types::*;
use crate::config::{Config, LayoutConfig};
use crate::graph::{build_graph, ForceSimulation, LayoutResult};
use crate::ingest::{
    count_nonzero_tokens, enrich_tokens, normalize_transfers, MetadataSource, Transfer,
    WalletSnapshot,
};
use crate::utils::format_wei;

/// Provider totals for a snapshot
pub fn wallet_context(snapshot: &WalletSnapshot) -> WalletContext {
    WalletContext {
        transaction_count: snapshot.transaction_count,
        token_count: count_nonzero_tokens(&snapshot.token_balances),
    }
}

/// Build the transfer graph and run the layout to completion
pub fn layout_transfers(transfers: &[Transfer], config: &LayoutConfig) -> LayoutResult {
    let graph = build_graph(transfers);
    ForceSimulation::new(graph, config.clone()).run()
}

/// Analyze a wallet snapshot.
///
/// Transfers are normalised once; the risk profile and the layout are then
/// computed side by side over the same batch.
pub fn analyze_wallet(
    snapshot: &WalletSnapshot,
    source: &dyn MetadataSource,
    config: &Config,
) -> Result<WalletReport> {
    log::info!("Analyzing wallet {}", snapshot.address);

    let transfers = normalize_transfers(&snapshot.transfers);
    let context = wallet_context(snapshot);

    let (profile, graph) = rayon::join(
        || analyze_risk(&transfers, &context, &config.risk),
        || {
            config
                .general
                .include_layout
                .then(|| layout_transfers(&transfers, &config.layout))
        },
    );

    let tokens = enrich_tokens(&snapshot.token_balances, source, &config.ingestion)?;

    if !profile.suspicious_patterns.is_empty() {
        log::warn!(
            "Suspicious patterns for {}: {}",
            snapshot.address,
            profile
                .suspicious_patterns
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let metadata = AnalysisMetadata {
        analysis_timestamp: chrono::Utc::now().to_rfc3339(),
        transfer_records: snapshot.transfers.len(),
        transfers_analyzed: transfers.len(),
        token_balances: snapshot.token_balances.len(),
    };

    let eth_balance_formatted = snapshot.balance.as_deref().and_then(|wei| {
        let formatted = format_wei(wei);
        if formatted.is_none() {
            log::warn!("Unreadable native balance '{}' for {}", wei, snapshot.address);
        }
        formatted
    });

    let processed = transfers
        .into_iter()
        .map(|transfer| {
            let direction = transfer.direction(&snapshot.address);
            ProcessedTransfer {
                transfer,
                direction,
            }
        })
        .collect();

    Ok(WalletReport {
        metadata,
        address: snapshot.address.clone(),
        eth_balance: snapshot.balance.clone(),
        eth_balance_formatted,
        risk: profile.to_risk_result(),
        tokens,
        transfers: processed,
        graph,
    })
}
