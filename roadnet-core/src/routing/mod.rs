//! Shortest path search over the road graph

pub(crate) mod dijkstra;
pub(crate) mod path;

pub(crate) use dijkstra::{SearchLimits, Seed, ShortestPathTree, shortest_path_tree};
pub(crate) use path::{PartialEdge, RoutePath};
