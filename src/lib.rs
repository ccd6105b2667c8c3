//! # Walletscope - Wallet transfer analysis and transfer graph layout
//!
//! This library turns a snapshot of an EVM wallet's provider data (recent
//! asset transfers, token balances, token metadata) into a risk profile and
//! a positioned transfer graph.
//!
//! ## Overview
//!
//! Provider records arrive loosely typed. The ingestion adapter normalises
//! them into canonical transfers once; the risk analyzer and the graph
//! builder both consume that same batch. The force simulation positions the
//! graph with a cooling, d3-style force model and can stream every frame.
//!
//! ## Architecture
//!
//! - `config`: Typed configuration sections with defaults and validation
//! - `config_loader`: YAML loading and CLI overrides
//! - `ingest`: Transfer normalisation and token metadata enrichment
//! - `analysis`: Risk heuristics, the wallet pipeline and reports
//! - `graph`: Transfer graph construction and force-directed layout
//! - `utils`: Address validation for user input
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use walletscope::{analysis, config_loader, ingest};
//!
//! let config = config_loader::load_config(Path::new("walletscope.yaml"))?;
//! let snapshot = ingest::load_snapshot(Path::new("wallet.json"))?;
//! let source = ingest::SnapshotMetadata::new(&snapshot.token_metadata);
//!
//! let report = analysis::analyze_wallet(&snapshot, &source, &config)?;
//! analysis::print_summary(&report);
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! general:
//!   include_layout: true
//!
//! risk:
//!   high_value_threshold: 10
//!   large_tx_frequency_ceiling: 5
//!   diversity_ratio: 0.3
//!
//! ingestion:
//!   metadata_lookup_cap: 20
//!   lookup_parallelism: 4
//!
//! layout:
//!   width: 600
//!   height: 300
//!   seed: 42
//!   frame_interval: "16ms"
//! ```
//!
//! ## Error Handling
//!
//! Fallible I/O and orchestration return `color_eyre::eyre::Result`. Typed
//! domain errors (`ValidationError`, `LookupError`, `AddressError`) use
//! `thiserror`. Failed metadata lookups and unusable transfer records are
//! recovered and logged, never propagated.

pub mod config;
pub mod config_loader;
pub mod ingest;
pub mod analysis;
pub mod graph;
pub mod utils;
