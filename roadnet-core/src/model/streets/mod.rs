//! Road network model

pub mod components;
pub mod network;

pub use components::{DirectionClass, EdgeDirection, NetworkLine, RoadEdge, RoadNode};
pub use network::{IndexedNode, IndexedSegment, Network};
