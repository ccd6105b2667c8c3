//! Core data types for the transfer graph and its layout.

use serde::{Deserialize, Serialize};

use crate::ingest::TransferCategory;

/// Visual grouping of a node, derived from the transfer category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeGroup {
    Native,
    FungibleToken,
    Nft,
    Other,
}

impl From<&TransferCategory> for NodeGroup {
    fn from(category: &TransferCategory) -> Self {
        match category {
            TransferCategory::External | TransferCategory::Internal => NodeGroup::Native,
            TransferCategory::Erc20 => NodeGroup::FungibleToken,
            TransferCategory::Erc721 | TransferCategory::Erc1155 => NodeGroup::Nft,
            TransferCategory::Other(_) => NodeGroup::Other,
        }
    }
}

/// A transfer in the graph, with its simulation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub group: NodeGroup,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl GraphNode {
    pub fn new(id: String, group: NodeGroup) -> Self {
        Self {
            id,
            group,
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
        }
    }
}

/// A directed edge from a transfer to its destination address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    /// May name an address that has no node
    pub target: String,
    /// Index of the source node
    pub source_index: usize,
}

/// Node and edge sets built from one transfer batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl TransferGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Position of one node in a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// Positions of every node after a tick, in node index order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutFrame {
    pub tick: u64,
    pub alpha: f64,
    pub positions: Vec<NodePosition>,
}

impl LayoutFrame {
    /// Largest distance any node moved between `previous` and this frame
    pub fn max_displacement(&self, previous: &LayoutFrame) -> f64 {
        self.positions
            .iter()
            .zip(&previous.positions)
            .map(|(a, b)| ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt())
            .fold(0.0, f64::max)
    }
}

/// Lifecycle of a layout run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationStatus {
    Initializing,
    Ticking,
    Converged,
    Cancelled,
}

impl SimulationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SimulationStatus::Converged | SimulationStatus::Cancelled)
    }
}

impl std::fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationStatus::Initializing => write!(f, "initializing"),
            SimulationStatus::Ticking => write!(f, "ticking"),
            SimulationStatus::Converged => write!(f, "converged"),
            SimulationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Final layout handed to a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub status: SimulationStatus,
    pub ticks: u64,
    pub frame: LayoutFrame,
    pub edges: Vec<GraphEdge>,
}
