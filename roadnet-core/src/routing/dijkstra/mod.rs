mod state;
mod tree;

pub(crate) use tree::{SearchLimits, Seed, ShortestPathTree, shortest_path_tree};
