use std::cmp::Ordering;

use petgraph::graph::NodeIndex;

#[derive(Copy, Clone, Debug, PartialEq)]
pub(super) struct State {
    pub(super) cost: f64,
    pub(super) node: NodeIndex,
}

impl Eq for State {}

// Implement Ord for State to use in BinaryHeap
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost, lower node index first among equal costs
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
