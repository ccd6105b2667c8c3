//! Ingestion adapter.
//!
//! Turns heterogeneous provider records into canonical transfers and
//! enriches token balances with metadata.

pub mod types;
pub mod normalize;
pub mod enrich;

pub use types::*;
pub use normalize::{load_snapshot, normalize_transfer, normalize_transfers};
pub use enrich::{count_nonzero_tokens, enrich_tokens, LookupError, MetadataSource, SnapshotMetadata};
