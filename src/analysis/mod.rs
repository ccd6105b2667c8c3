//! Wallet analysis.
//!
//! Risk heuristics over normalised transfers, the end-to-end pipeline and
//! report generation.

pub mod types;
pub mod risk;
pub mod pipeline;
pub mod report;

pub use types::*;
pub use risk::analyze_risk;
pub use pipeline::{analyze_wallet, layout_transfers, wallet_context};
pub use report::{generate_json_report, generate_text_report, print_summary, write_frames};
