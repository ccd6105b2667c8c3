//! Transfer graph construction.

use super::types::*;
use crate::ingest::Transfer;

/// Build the node and edge sets for a transfer batch.
///
/// Every transfer becomes a node. Every transfer with a destination becomes an
/// edge; repeated destinations produce parallel edges.
pub fn build_graph(transfers: &[Transfer]) -> TransferGraph {
    let nodes: Vec<GraphNode> = transfers
        .iter()
        .map(|t| GraphNode::new(t.hash.clone(), NodeGroup::from(&t.category)))
        .collect();

    let edges: Vec<GraphEdge> = transfers
        .iter()
        .enumerate()
        .filter_map(|(index, t)| {
            t.to.as_ref().map(|to| GraphEdge {
                source: t.hash.clone(),
                target: to.clone(),
                source_index: index,
            })
        })
        .collect();

    log::debug!("Built graph with {} nodes and {} edges", nodes.len(), edges.len());

    TransferGraph { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::TransferCategory;

    fn transfer(hash: &str, to: Option<&str>, category: TransferCategory) -> Transfer {
        Transfer {
            hash: hash.to_string(),
            from: "0xwallet".to_string(),
            to: to.map(|s| s.to_string()),
            value: Some(1.0),
            asset: Some("ETH".to_string()),
            category,
            block_number: 1,
        }
    }

    #[test]
    fn test_counts() {
        let transfers = vec![
            transfer("0x1", Some("0xa"), TransferCategory::External),
            transfer("0x2", None, TransferCategory::Erc20),
            transfer("0x3", Some("0xb"), TransferCategory::Erc721),
        ];

        let graph = build_graph(&transfers);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.nodes[1].group, NodeGroup::FungibleToken);
        assert_eq!(graph.nodes[2].group, NodeGroup::Nft);
        assert_eq!(graph.edges[1].source, "0x3");
        assert_eq!(graph.edges[1].source_index, 2);
    }

    #[test]
    fn test_parallel_edges_kept() {
        let transfers = vec![
            transfer("0x1", Some("0xa"), TransferCategory::External),
            transfer("0x2", Some("0xa"), TransferCategory::External),
            transfer("0x3", Some("0xa"), TransferCategory::Internal),
        ];

        let graph = build_graph(&transfers);
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.edges.iter().all(|e| e.target == "0xa"));
    }

    #[test]
    fn test_duplicate_hashes_keep_one_node_each() {
        let transfers = vec![
            transfer("0x1", Some("0xa"), TransferCategory::Erc20),
            transfer("0x1", Some("0xb"), TransferCategory::Erc20),
        ];

        let graph = build_graph(&transfers);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edges[0].source_index, 0);
        assert_eq!(graph.edges[1].source_index, 1);
    }

    #[test]
    fn test_empty() {
        let graph = build_graph(&[]);
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
    }
}
