//! Transfer graph construction and force-directed layout.

pub mod types;
pub mod builder;
pub mod simulation;

pub use types::*;
pub use builder::build_graph;
pub use simulation::{AbortHandle, ForceSimulation, Frames, SimulationState};
