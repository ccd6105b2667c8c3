//! Report generation for wallet analysis.
//!
//! Generates JSON and human-readable text reports, plus a JSON Lines frame
//! stream for animated renderers.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use color_eyre::eyre::{Context, Result};

use super::types::*;
use crate::graph::LayoutFrame;
use crate::ingest::{LookupStatus, TransferDirection};

/// Generate JSON report
pub fn generate_json_report(report: &WalletReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialize report to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

/// Generate human-readable text report
pub fn generate_text_report(report: &WalletReport, output_path: &Path) -> Result<()> {
    let text = render_text_report(report);

    fs::write(output_path, text)
        .with_context(|| format!("Failed to write text report to {}", output_path.display()))?;

    log::info!("Text report written to {}", output_path.display());
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn render_text_report(report: &WalletReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    // Header
    lines.push("=".repeat(80));
    lines.push("                        WALLETSCOPE WALLET ANALYSIS".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());

    lines.push(format!("Analysis Date: {}", report.metadata.analysis_timestamp));
    lines.push(format!("Wallet: {}", report.address));
    if let Some(ref eth) = report.eth_balance_formatted {
        lines.push(format!("ETH Balance: {} ETH", eth));
    }
    lines.push(format!(
        "Transfers: {} analyzed ({} records)",
        report.metadata.transfers_analyzed, report.metadata.transfer_records
    ));
    lines.push(format!("Token Balances: {}", report.metadata.token_balances));
    lines.push(String::new());

    // Risk
    let risk = &report.risk;
    let factors = &risk.risk_factors;
    lines.push("=".repeat(80));
    lines.push("                               RISK FACTORS".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());

    lines.push(format!("Lifetime transactions: {}", risk.transaction_count));
    lines.push(format!("Tokens held: {}", risk.token_count));
    lines.push(format!("Recent transfers: {}", risk.recent_transaction_count));
    lines.push(String::new());
    lines.push(format!("  High transaction volume:  {}", yes_no(factors.high_transaction_volume)));
    lines.push(format!("  Many tokens:              {}", yes_no(factors.many_tokens)));
    lines.push(format!("  Recent activity:          {}", yes_no(factors.recent_activity)));
    lines.push(format!("  High-value transfers:     {}", factors.high_value_transactions));
    lines.push(format!("  Unique addresses:         {}", factors.unique_addresses));
    lines.push(String::new());

    if factors.suspicious_patterns.is_empty() {
        lines.push("No suspicious patterns detected.".to_string());
    } else {
        lines.push("Suspicious Patterns:".to_string());
        for pattern in &factors.suspicious_patterns {
            lines.push(format!("  - {}", pattern));
        }
    }
    lines.push(String::new());

    // Tokens
    if !report.tokens.is_empty() {
        lines.push("=".repeat(80));
        lines.push("                                  TOKENS".to_string());
        lines.push("=".repeat(80));
        lines.push(String::new());

        for token in &report.tokens {
            let label = match token.lookup {
                LookupStatus::Skipped => "(not looked up)".to_string(),
                _ => format!(
                    "{} ({})",
                    token.name.as_deref().unwrap_or("?"),
                    token.symbol.as_deref().unwrap_or("?")
                ),
            };
            lines.push(format!("  {}  {}  balance {}", token.contract_address, label, token.balance));
        }

        let fallbacks = report
            .tokens
            .iter()
            .filter(|t| t.lookup == LookupStatus::Fallback)
            .count();
        if fallbacks > 0 {
            lines.push(String::new());
            lines.push(format!("  {} token(s) use fallback metadata", fallbacks));
        }
        lines.push(String::new());
    }

    // Transfers
    if !report.transfers.is_empty() {
        let count = |direction: TransferDirection| {
            report
                .transfers
                .iter()
                .filter(|t| t.direction == direction)
                .count()
        };
        lines.push("Transfer Directions:".to_string());
        lines.push(format!("  Sent:     {}", count(TransferDirection::Sent)));
        lines.push(format!("  Received: {}", count(TransferDirection::Received)));
        lines.push(format!("  Self:     {}", count(TransferDirection::SelfTransfer)));
        lines.push(String::new());
    }

    // Layout
    if let Some(ref graph) = report.graph {
        lines.push("=".repeat(80));
        lines.push("                              TRANSFER GRAPH".to_string());
        lines.push("=".repeat(80));
        lines.push(String::new());

        lines.push(format!("Nodes: {}", graph.frame.positions.len()));
        lines.push(format!("Edges: {}", graph.edges.len()));
        lines.push(format!(
            "Layout: {} after {} ticks (alpha {:.5})",
            graph.status, graph.ticks, graph.frame.alpha
        ));

        if let Some((min_x, min_y, max_x, max_y)) = bounds(&graph.frame) {
            lines.push(format!(
                "Extent: x {:.1}..{:.1}, y {:.1}..{:.1}",
                min_x, max_x, min_y, max_y
            ));
        }
        lines.push(String::new());
    }

    lines.push("=".repeat(80));
    lines.join("\n")
}

/// Bounding box of a frame, or `None` when it has no positions
fn bounds(frame: &LayoutFrame) -> Option<(f64, f64, f64, f64)> {
    let first = frame.positions.first()?;
    Some(frame.positions.iter().fold(
        (first.x, first.y, first.x, first.y),
        |(min_x, min_y, max_x, max_y), p| {
            (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
        },
    ))
}

/// Write frames as JSON Lines, one frame per line. Returns the number written.
pub fn write_frames<I>(frames: I, output_path: &Path) -> Result<usize>
where
    I: IntoIterator<Item = LayoutFrame>,
{
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create frame file {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    let mut written = 0;

    for frame in frames {
        serde_json::to_writer(&mut writer, &frame).context("Failed to serialize layout frame")?;
        writer.write_all(b"\n")?;
        written += 1;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush frame file {}", output_path.display()))?;

    log::info!("{} frames written to {}", written, output_path.display());
    Ok(written)
}

/// Print summary to stdout
pub fn print_summary(report: &WalletReport) {
    let factors = &report.risk.risk_factors;

    println!("\n=== WALLET ANALYSIS SUMMARY ===\n");
    println!("Wallet: {}", report.address);
    if let Some(ref eth) = report.eth_balance_formatted {
        println!("ETH balance: {}", eth);
    }
    println!("Lifetime transactions: {}", report.risk.transaction_count);
    println!("Tokens held: {}", report.risk.token_count);
    println!("Recent transfers: {}", report.risk.recent_transaction_count);

    println!("\nRisk Factors:");
    println!("  High transaction volume: {}", yes_no(factors.high_transaction_volume));
    println!("  Many tokens: {}", yes_no(factors.many_tokens));
    println!("  High-value transfers: {}", factors.high_value_transactions);
    println!("  Unique addresses: {}", factors.unique_addresses);
    for pattern in &factors.suspicious_patterns {
        println!("  ! {}", pattern);
    }

    if let Some(ref graph) = report.graph {
        println!("\nTransfer Graph:");
        println!("  Nodes: {}", graph.frame.positions.len());
        println!("  Edges: {}", graph.edges.len());
        println!("  Layout: {} after {} ticks", graph.status, graph.ticks);
    }

    println!();
}
