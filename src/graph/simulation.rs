//! Force-directed layout of a transfer graph.
//!
//! Each tick applies, in order, a spring force along every edge, a pairwise
//! repulsion between all nodes, a translation that keeps the centroid on the
//! viewport centre, velocity integration with friction, and geometric cooling
//! of `alpha`. A run converges once `alpha` drops below `alpha_min`, or stops
//! softly at `max_ticks`.
//!
//! Repulsion is evaluated naively, O(n²) per tick. That is fine for a batch of
//! tens to a few hundred transfers; larger graphs would need a quadtree
//! (Barnes-Hut) approximation.
//!
//! A `SimulationState` is owned by exactly one caller and is never shared.
//! Edge targets that do not name a node are pinned to a fixed anchor at the
//! viewport centre.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::types::*;
use crate::config::LayoutConfig;

const INITIAL_RADIUS: f64 = 10.0;
/// Golden angle, PI * (3 - sqrt(5))
const INITIAL_ANGLE: f64 = 2.399_963_229_728_653;
const MIN_DISTANCE_SQ: f64 = 1.0;
const JIGGLE_SCALE: f64 = 1e-6;

/// Thread-safe abort signal for a layout run
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop every run bound to this handle before its next tick
    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Resolved end of a link
#[derive(Debug, Clone, Copy, PartialEq)]
enum LinkTarget {
    Node(usize),
    /// Address with no node; fixed at the viewport centre
    Anchor,
}

#[derive(Debug, Clone)]
struct Link {
    source: usize,
    target: LinkTarget,
    strength: f64,
    /// Share of the correction taken by the target
    bias: f64,
}

/// State of a single layout run
#[derive(Debug, Clone)]
pub struct SimulationState {
    nodes: Vec<GraphNode>,
    links: Vec<Link>,
    config: LayoutConfig,
    center: (f64, f64),
    alpha: f64,
    tick_count: u64,
    status: SimulationStatus,
    rng: StdRng,
}

impl SimulationState {
    /// Seed initial positions and resolve links
    pub fn start(graph: &TransferGraph, config: &LayoutConfig) -> Self {
        let center = config.center();
        let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or(0));
        let spread = INITIAL_RADIUS * (graph.nodes.len() as f64 + 0.5).sqrt();

        let nodes: Vec<GraphNode> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let (x, y) = match config.seed {
                    Some(_) => (
                        center.0 + rng.gen_range(-spread..=spread),
                        center.1 + rng.gen_range(-spread..=spread),
                    ),
                    None => phyllotaxis(index, center),
                };
                GraphNode {
                    x,
                    y,
                    vx: 0.0,
                    vy: 0.0,
                    ..node.clone()
                }
            })
            .collect();

        let links = resolve_links(graph, config);

        log::debug!(
            "Starting layout: {} nodes, {} links, centre ({}, {})",
            nodes.len(),
            links.len(),
            center.0,
            center.1
        );

        Self {
            nodes,
            links,
            config: config.clone(),
            center,
            alpha: 1.0,
            tick_count: 0,
            status: SimulationStatus::Initializing,
            rng,
        }
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Advance one timestep. Returns `None` once the run is terminal.
    pub fn tick(&mut self) -> Option<LayoutFrame> {
        if self.status.is_terminal() {
            return None;
        }
        if self.nodes.is_empty() {
            self.status = SimulationStatus::Converged;
            return None;
        }
        self.status = SimulationStatus::Ticking;

        self.apply_link_force();
        self.apply_charge_force();
        self.apply_center_force();
        self.integrate();

        self.tick_count += 1;
        self.alpha *= 1.0 - self.config.cooling_rate;
        log::trace!("tick {} alpha {:.5}", self.tick_count, self.alpha);

        if self.alpha < self.config.alpha_min {
            log::debug!("Layout converged after {} ticks", self.tick_count);
            self.status = SimulationStatus::Converged;
        } else if self.tick_count >= self.config.max_ticks {
            log::warn!(
                "Layout stopped at the tick ceiling ({}) with alpha {:.5}",
                self.tick_count,
                self.alpha
            );
            self.status = SimulationStatus::Converged;
        }

        Some(self.snapshot())
    }

    /// Cancel the run; later ticks do nothing
    pub fn stop(&mut self) {
        if !self.status.is_terminal() {
            log::debug!("Layout cancelled after {} ticks", self.tick_count);
            self.status = SimulationStatus::Cancelled;
        }
    }

    /// Positions after the last completed tick
    pub fn snapshot(&self) -> LayoutFrame {
        LayoutFrame {
            tick: self.tick_count,
            alpha: self.alpha,
            positions: self
                .nodes
                .iter()
                .map(|n| NodePosition {
                    id: n.id.clone(),
                    x: n.x,
                    y: n.y,
                })
                .collect(),
        }
    }

    fn apply_link_force(&mut self) {
        let SimulationState {
            nodes,
            links,
            config,
            center,
            alpha,
            rng,
            ..
        } = self;

        for link in links.iter() {
            let source = &nodes[link.source];
            let (tx, ty) = match link.target {
                LinkTarget::Node(i) => (nodes[i].x + nodes[i].vx, nodes[i].y + nodes[i].vy),
                LinkTarget::Anchor => *center,
            };

            let mut dx = tx - source.x - source.vx;
            let mut dy = ty - source.y - source.vy;
            if dx == 0.0 {
                dx = jiggle(rng);
            }
            if dy == 0.0 {
                dy = jiggle(rng);
            }

            let l = (dx * dx + dy * dy).sqrt();
            let k = (l - config.link_distance) / l * *alpha * link.strength;
            dx *= k;
            dy *= k;

            if let LinkTarget::Node(i) = link.target {
                nodes[i].vx -= dx * link.bias;
                nodes[i].vy -= dy * link.bias;
            }
            let source = &mut nodes[link.source];
            source.vx += dx * (1.0 - link.bias);
            source.vy += dy * (1.0 - link.bias);
        }
    }

    fn apply_charge_force(&mut self) {
        let strength = self.config.charge_strength * self.alpha;
        let n = self.nodes.len();

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let mut dx = self.nodes[j].x - self.nodes[i].x;
                let mut dy = self.nodes[j].y - self.nodes[i].y;
                if dx == 0.0 {
                    dx = jiggle(&mut self.rng);
                }
                if dy == 0.0 {
                    dy = jiggle(&mut self.rng);
                }

                let mut l = dx * dx + dy * dy;
                if l < MIN_DISTANCE_SQ {
                    l = (MIN_DISTANCE_SQ * l).sqrt();
                }

                self.nodes[i].vx += dx * strength / l;
                self.nodes[i].vy += dy * strength / l;
            }
        }
    }

    fn apply_center_force(&mut self) {
        let n = self.nodes.len() as f64;
        let (sx, sy) = self
            .nodes
            .iter()
            .fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
        let dx = sx / n - self.center.0;
        let dy = sy / n - self.center.1;

        for node in &mut self.nodes {
            node.x -= dx;
            node.y -= dy;
        }
    }

    fn integrate(&mut self) {
        let retain = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            node.vx *= retain;
            node.vy *= retain;
            node.x += node.vx;
            node.y += node.vy;
        }
    }
}

/// Deterministic spiral placement around the centre
fn phyllotaxis(index: usize, center: (f64, f64)) -> (f64, f64) {
    let radius = INITIAL_RADIUS * (0.5 + index as f64).sqrt();
    let angle = index as f64 * INITIAL_ANGLE;
    (center.0 + radius * angle.cos(), center.1 + radius * angle.sin())
}

fn jiggle(rng: &mut StdRng) -> f64 {
    (rng.gen::<f64>() - 0.5) * JIGGLE_SCALE
}

/// Map edges onto node indices and derive per-link strength and bias from degrees.
/// Self-links are dropped; they carry no force.
fn resolve_links(graph: &TransferGraph, config: &LayoutConfig) -> Vec<Link> {
    let mut index_by_id: HashMap<&str, usize> = HashMap::new();
    for (index, node) in graph.nodes.iter().enumerate() {
        index_by_id.entry(node.id.as_str()).or_insert(index);
    }

    let resolved: Vec<(usize, LinkTarget, &str)> = graph
        .edges
        .iter()
        .filter_map(|edge| {
            if edge.source_index >= graph.nodes.len() {
                log::warn!("Edge from {} has no source node, ignoring", edge.source);
                return None;
            }
            let target = match index_by_id.get(edge.target.as_str()) {
                Some(&index) if index == edge.source_index => return None,
                Some(&index) => LinkTarget::Node(index),
                None => LinkTarget::Anchor,
            };
            Some((edge.source_index, target, edge.target.as_str()))
        })
        .collect();

    let mut degree = vec![0usize; graph.nodes.len()];
    let mut anchor_degree: HashMap<&str, usize> = HashMap::new();
    for (source, target, address) in &resolved {
        degree[*source] += 1;
        match target {
            LinkTarget::Node(index) => degree[*index] += 1,
            LinkTarget::Anchor => *anchor_degree.entry(*address).or_default() += 1,
        }
    }

    resolved
        .iter()
        .map(|&(source, target, address)| {
            let (target_degree, bias) = match target {
                LinkTarget::Node(index) => (
                    degree[index],
                    degree[source] as f64 / (degree[source] + degree[index]) as f64,
                ),
                LinkTarget::Anchor => (anchor_degree[address], 0.0),
            };
            let strength = config
                .link_strength
                .unwrap_or_else(|| 1.0 / degree[source].min(target_degree) as f64);

            Link {
                source,
                target,
                strength,
                bias,
            }
        })
        .collect()
}

/// Lazy sequence of frames from one run. Yields nothing once the run
/// converges or its abort handle fires.
#[derive(Debug)]
pub struct Frames {
    state: SimulationState,
    abort: AbortHandle,
}

impl Frames {
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Consume the iterator, keeping the state of the last completed tick
    pub fn into_state(self) -> SimulationState {
        self.state
    }
}

impl Iterator for Frames {
    type Item = LayoutFrame;

    fn next(&mut self) -> Option<LayoutFrame> {
        if self.abort.is_aborted() {
            self.state.stop();
            return None;
        }
        self.state.tick()
    }
}

/// Layout engine for one input generation.
///
/// `frames` and `run` both start from a fresh state, so a run can be
/// restarted at any time. Replacing the graph aborts every run of the
/// previous generation.
#[derive(Debug)]
pub struct ForceSimulation {
    graph: TransferGraph,
    config: LayoutConfig,
    abort: AbortHandle,
    generation: u64,
}

impl ForceSimulation {
    pub fn new(graph: TransferGraph, config: LayoutConfig) -> Self {
        Self {
            graph,
            config,
            abort: AbortHandle::new(),
            generation: 0,
        }
    }

    pub fn graph(&self) -> &TransferGraph {
        &self.graph
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Abort signal for runs of the current generation
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Start a new run and return its frames
    pub fn frames(&self) -> Frames {
        Frames {
            state: SimulationState::start(&self.graph, &self.config),
            abort: self.abort.clone(),
        }
    }

    /// Discard in-flight runs and switch to a new input graph
    pub fn replace_graph(&mut self, graph: TransferGraph) {
        self.abort.abort();
        self.abort = AbortHandle::new();
        self.graph = graph;
        self.generation += 1;
        log::info!(
            "Layout input replaced (generation {}): {} nodes, {} edges",
            self.generation,
            self.graph.node_count(),
            self.graph.edge_count()
        );
    }

    /// Run to convergence and return the final frame
    pub fn run(&self) -> LayoutResult {
        let mut frames = self.frames();
        for _ in frames.by_ref() {}
        let state = frames.into_state();

        log::info!(
            "Layout {} after {} ticks (alpha {:.5})",
            state.status(),
            state.tick_count(),
            state.alpha()
        );

        LayoutResult {
            status: state.status(),
            ticks: state.tick_count(),
            frame: state.snapshot(),
            edges: self.graph.edges.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> GraphNode {
        GraphNode::new(id.to_string(), NodeGroup::Native)
    }

    fn edge(source_index: usize, source: &str, target: &str) -> GraphEdge {
        GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            source_index,
        }
    }

    /// Five transfers chained hash to hash
    fn chain_graph() -> TransferGraph {
        let ids = ["0xa", "0xb", "0xc", "0xd", "0xe"];
        TransferGraph {
            nodes: ids.iter().map(|id| node(id)).collect(),
            edges: (0..4).map(|i| edge(i, ids[i], ids[i + 1])).collect(),
        }
    }

    fn seeded(seed: u64) -> LayoutConfig {
        LayoutConfig {
            seed: Some(seed),
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn test_initial_state() {
        let state = SimulationState::start(&chain_graph(), &LayoutConfig::default());
        assert_eq!(state.status(), SimulationStatus::Initializing);
        assert_eq!(state.alpha(), 1.0);
        assert_eq!(state.tick_count(), 0);
        assert!(state.nodes().iter().all(|n| n.vx == 0.0 && n.vy == 0.0));
    }

    #[test]
    fn test_link_resolution() {
        let mut graph = chain_graph();
        // Dangling address, plus a self-link
        graph.edges.push(edge(4, "0xe", "0xffff"));
        graph.edges.push(edge(2, "0xc", "0xc"));

        let links = resolve_links(&graph, &LayoutConfig::default());
        assert_eq!(links.len(), 5);
        assert_eq!(links[0].target, LinkTarget::Node(1));
        assert_eq!(links[4].target, LinkTarget::Anchor);
        assert_eq!(links[4].bias, 0.0);

        // End nodes have degree 1, inner nodes degree 2
        assert_eq!(links[0].strength, 1.0);
        assert_eq!(links[1].strength, 0.5);
        assert!((links[1].bias - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_edges_each_get_a_link() {
        let graph = TransferGraph {
            nodes: vec![node("0xa"), node("0xb"), node("0xd")],
            edges: vec![
                edge(0, "0xa", "0xd"),
                edge(0, "0xa", "0xd"),
                edge(0, "0xa", "0xd"),
                edge(0, "0xa", "0xdead"),
                edge(1, "0xb", "0xdead"),
                edge(0, "0xa", "0xbeef"),
            ],
        };

        let links = resolve_links(&graph, &LayoutConfig::default());
        assert_eq!(links.len(), 6);

        // Degrees: 0xa = 5, 0xb = 1, 0xd = 3
        for link in &links[..3] {
            assert_eq!(link.source, 0);
            assert_eq!(link.target, LinkTarget::Node(2));
            assert!((link.strength - 1.0 / 3.0).abs() < 1e-12);
            assert!((link.bias - 0.625).abs() < 1e-12);
        }

        // Dangling degree is counted per address: 0xdead = 2, 0xbeef = 1
        assert_eq!(links[3].target, LinkTarget::Anchor);
        assert_eq!(links[3].strength, 0.5);
        assert_eq!(links[4].strength, 1.0);
        assert_eq!(links[5].strength, 1.0);
        assert!(links[3..].iter().all(|l| l.bias == 0.0));

        let result = ForceSimulation::new(graph, seeded(11)).run();
        assert_eq!(result.status, SimulationStatus::Converged);
        assert_eq!(result.edges.len(), 6);
        assert!(result.frame.positions.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn test_converges_within_300_ticks() {
        let simulation = ForceSimulation::new(chain_graph(), seeded(7));
        let frames: Vec<LayoutFrame> = simulation.frames().collect();

        assert!(frames.len() <= 300, "took {} ticks", frames.len());
        let last = frames.last().unwrap();
        assert!(last.alpha < 0.001);

        // Subsequent ticks barely move anything
        let previous = &frames[frames.len() - 2];
        assert!(last.max_displacement(previous) < 0.1);
    }

    #[test]
    fn test_layout_is_centred_and_spread() {
        let result = ForceSimulation::new(chain_graph(), seeded(3)).run();
        assert_eq!(result.status, SimulationStatus::Converged);
        assert_eq!(result.edges.len(), 4);

        let positions = &result.frame.positions;
        let n = positions.len() as f64;
        let cx = positions.iter().map(|p| p.x).sum::<f64>() / n;
        let cy = positions.iter().map(|p| p.y).sum::<f64>() / n;
        assert!((cx - 300.0).abs() < 1.0);
        assert!((cy - 150.0).abs() < 1.0);

        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
                assert!(d > 1.0, "{} and {} overlap", a.id, b.id);
            }
        }
    }

    #[test]
    fn test_frames_restartable_and_deterministic() {
        let simulation = ForceSimulation::new(chain_graph(), seeded(11));
        let first: Vec<LayoutFrame> = simulation.frames().take(10).collect();
        let second: Vec<LayoutFrame> = simulation.frames().take(10).collect();
        assert_eq!(first, second);

        // Streaming and run-to-end share the same ticks
        let all: Vec<LayoutFrame> = simulation.frames().collect();
        let result = simulation.run();
        assert_eq!(all.last(), Some(&result.frame));
    }

    #[test]
    fn test_unseeded_layout_is_deterministic() {
        let simulation = ForceSimulation::new(chain_graph(), LayoutConfig::default());
        assert_eq!(simulation.run(), simulation.run());
    }

    #[test]
    fn test_tick_ceiling_is_soft() {
        let config = LayoutConfig {
            max_ticks: 10,
            ..seeded(1)
        };
        let result = ForceSimulation::new(chain_graph(), config).run();
        assert_eq!(result.status, SimulationStatus::Converged);
        assert_eq!(result.ticks, 10);
        assert!(result.frame.alpha > 0.001);
        assert_eq!(result.frame.positions.len(), 5);
    }

    #[test]
    fn test_abort_stops_frames() {
        let simulation = ForceSimulation::new(chain_graph(), seeded(5));
        let mut frames = simulation.frames();
        assert!(frames.next().is_some());
        assert!(frames.next().is_some());

        simulation.abort_handle().abort();
        assert!(frames.next().is_none());
        assert_eq!(frames.state().status(), SimulationStatus::Cancelled);
        // Last completed tick stays readable
        assert_eq!(frames.state().snapshot().tick, 2);
    }

    #[test]
    fn test_replace_graph_cancels_previous_generation() {
        let mut simulation = ForceSimulation::new(chain_graph(), seeded(5));
        let mut old_frames = simulation.frames();
        assert!(old_frames.next().is_some());

        let mut smaller = chain_graph();
        smaller.nodes.truncate(2);
        smaller.edges.truncate(1);
        simulation.replace_graph(smaller);

        assert!(old_frames.next().is_none());
        assert_eq!(old_frames.state().status(), SimulationStatus::Cancelled);
        assert_eq!(simulation.generation(), 1);

        // The new generation starts from scratch
        let result = simulation.run();
        assert_eq!(result.status, SimulationStatus::Converged);
        assert_eq!(result.frame.positions.len(), 2);
    }

    #[test]
    fn test_stop_is_terminal() {
        let mut state = SimulationState::start(&chain_graph(), &seeded(2));
        assert!(state.tick().is_some());
        state.stop();
        assert_eq!(state.status(), SimulationStatus::Cancelled);
        assert!(state.tick().is_none());
        assert_eq!(state.tick_count(), 1);
    }

    #[test]
    fn test_empty_graph() {
        let result = ForceSimulation::new(TransferGraph::default(), LayoutConfig::default()).run();
        assert_eq!(result.status, SimulationStatus::Converged);
        assert_eq!(result.ticks, 0);
        assert!(result.frame.positions.is_empty());
        assert!(result.edges.is_empty());
    }

    #[test]
    fn test_single_node_sits_near_centre() {
        let graph = TransferGraph {
            nodes: vec![node("0xa")],
            edges: vec![edge(0, "0xa", "0xbeef")],
        };
        let result = ForceSimulation::new(graph, LayoutConfig::default()).run();
        let p = &result.frame.positions[0];
        assert!((p.x - 300.0).abs() < 0.5);
        assert!((p.y - 150.0).abs() < 0.5);
    }
}
