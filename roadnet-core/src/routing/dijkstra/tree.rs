use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use petgraph::{
    graph::{DiGraph, EdgeIndex, NodeIndex},
    visit::EdgeRef,
};

use super::state::State;
use crate::model::{RoadEdge, RoadNode};

/// Node where a search starts, with the cost already spent reaching it
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Seed {
    pub(crate) node: NodeIndex,
    pub(crate) cost: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SearchLimits<'a> {
    /// Nodes costlier than this are left unsettled
    pub(crate) cutoff: Option<f64>,
    /// Edges the search may not use, by edge index
    pub(crate) banned: Option<&'a FixedBitSet>,
}

/// Shortest path tree from a set of seeds
#[derive(Debug, Clone)]
pub(crate) struct ShortestPathTree {
    dist: Vec<f64>,
    pred: Vec<Option<EdgeIndex>>,
    /// Seed each root node was started from
    roots: HashMap<NodeIndex, usize>,
    cutoff: f64,
}

impl ShortestPathTree {
    /// Cost of the cheapest path to `node`, `None` if it was not reached
    pub(crate) fn cost(&self, node: NodeIndex) -> Option<f64> {
        let cost = self.dist[node.index()];
        (cost <= self.cutoff && cost.is_finite()).then_some(cost)
    }

    /// Edges from the root to `node` in travel order, with the seed index of the root
    pub(crate) fn edges_to(
        &self,
        graph: &DiGraph<RoadNode, RoadEdge>,
        node: NodeIndex,
    ) -> Option<(usize, Vec<EdgeIndex>)> {
        self.cost(node)?;

        let mut edges = Vec::new();
        let mut current = node;
        while let Some(edge) = self.pred[current.index()] {
            edges.push(edge);
            current = graph.edge_endpoints(edge)?.0;
        }
        edges.reverse();

        let seed = *self.roots.get(&current)?;
        Some((seed, edges))
    }

    /// Reached nodes and their costs, cheapest first
    pub(crate) fn reached(&self) -> Vec<(NodeIndex, f64)> {
        let mut reached: Vec<(NodeIndex, f64)> = self
            .dist
            .iter()
            .enumerate()
            .map(|(node, &cost)| (NodeIndex::new(node), cost))
            .filter(|&(_, cost)| cost.is_finite() && cost <= self.cutoff)
            .collect();
        reached.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        reached
    }
}

/// Multi-source Dijkstra over per-edge `weights`
///
/// Weights are indexed by edge index; non-finite weights are impassable.
pub(crate) fn shortest_path_tree(
    graph: &DiGraph<RoadNode, RoadEdge>,
    weights: &[f64],
    seeds: &[Seed],
    limits: SearchLimits<'_>,
) -> ShortestPathTree {
    let node_count = graph.node_count();
    let cutoff = limits.cutoff.unwrap_or(f64::INFINITY);
    let mut dist = vec![f64::INFINITY; node_count];
    let mut pred: Vec<Option<EdgeIndex>> = vec![None; node_count];
    let mut roots = HashMap::with_capacity(seeds.len());
    let mut heap = BinaryHeap::with_capacity(node_count.min(1000) / 4 + seeds.len());

    for (index, seed) in seeds.iter().enumerate() {
        if seed.cost < dist[seed.node.index()] {
            dist[seed.node.index()] = seed.cost;
            roots.insert(seed.node, index);
            heap.push(State {
                cost: seed.cost,
                node: seed.node,
            });
        }
    }

    while let Some(State { cost, node }) = heap.pop() {
        // Skip if we've found a better path
        if cost > dist[node.index()] {
            continue;
        }

        // Check max cost constraint
        if cost > cutoff {
            break;
        }

        for edge in graph.edges(node) {
            let id = edge.id().index();
            if limits.banned.is_some_and(|banned| banned.contains(id)) {
                continue;
            }
            let weight = weights[id];
            if !weight.is_finite() {
                continue;
            }

            let next = edge.target();
            let next_cost = cost + weight;
            if next_cost < dist[next.index()] {
                dist[next.index()] = next_cost;
                pred[next.index()] = Some(edge.id());
                heap.push(State {
                    cost: next_cost,
                    node: next,
                });
            }
        }
    }

    ShortestPathTree {
        dist,
        pred,
        roots,
        cutoff,
    }
}

#[cfg(test)]
mod tests {
    use geo::{LineString, Point};

    use super::*;
    use crate::model::EdgeDirection;

    /// 0 -> 1 -> 2 plus a direct, more expensive 0 -> 2
    fn triangle() -> (DiGraph<RoadNode, RoadEdge>, Vec<f64>) {
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..3)
            .map(|i| {
                graph.add_node(RoadNode {
                    geometry: Point::new(f64::from(i), 0.0),
                    degree: 2,
                })
            })
            .collect();
        for (line, (a, b)) in [(0, 1), (1, 2), (0, 2)].into_iter().enumerate() {
            graph.add_edge(
                nodes[a],
                nodes[b],
                RoadEdge {
                    line,
                    source_row: Some(line),
                    direction: EdgeDirection::Forward,
                    length: 1.0,
                    costs: Vec::new(),
                    geometry: LineString::new(Vec::new()),
                },
            );
        }
        (graph, vec![2.0, 3.0, 10.0])
    }

    fn seed(node: usize, cost: f64) -> Seed {
        Seed {
            node: NodeIndex::new(node),
            cost,
        }
    }

    #[test]
    fn follows_cheapest_edges() {
        let (graph, weights) = triangle();
        let tree = shortest_path_tree(&graph, &weights, &[seed(0, 0.0)], SearchLimits::default());

        assert_eq!(tree.cost(NodeIndex::new(2)), Some(5.0));
        let (root, edges) = tree.edges_to(&graph, NodeIndex::new(2)).unwrap();
        assert_eq!(root, 0);
        assert_eq!(edges, vec![EdgeIndex::new(0), EdgeIndex::new(1)]);
    }

    #[test]
    fn edges_are_one_way() {
        let (graph, weights) = triangle();
        let tree = shortest_path_tree(&graph, &weights, &[seed(2, 0.0)], SearchLimits::default());

        assert_eq!(tree.cost(NodeIndex::new(0)), None);
        assert!(tree.edges_to(&graph, NodeIndex::new(0)).is_none());
        assert_eq!(tree.edges_to(&graph, NodeIndex::new(2)), Some((0, Vec::new())));
    }

    #[test]
    fn banned_and_impassable_edges_are_skipped() {
        let (graph, mut weights) = triangle();
        let mut banned = FixedBitSet::with_capacity(graph.edge_count());
        banned.insert(1);
        let limits = SearchLimits {
            cutoff: None,
            banned: Some(&banned),
        };

        let tree = shortest_path_tree(&graph, &weights, &[seed(0, 0.0)], limits);
        assert_eq!(tree.cost(NodeIndex::new(2)), Some(10.0));

        weights[2] = f64::INFINITY;
        let tree = shortest_path_tree(&graph, &weights, &[seed(0, 0.0)], limits);
        assert_eq!(tree.cost(NodeIndex::new(2)), None);
    }

    #[test]
    fn cutoff_hides_costlier_nodes() {
        let (graph, weights) = triangle();
        let limits = SearchLimits {
            cutoff: Some(4.0),
            banned: None,
        };
        let tree = shortest_path_tree(&graph, &weights, &[seed(0, 0.0)], limits);

        assert_eq!(
            tree.reached(),
            vec![(NodeIndex::new(0), 0.0), (NodeIndex::new(1), 2.0)]
        );
    }

    #[test]
    fn cheaper_seed_becomes_the_root() {
        let (graph, weights) = triangle();
        let tree = shortest_path_tree(
            &graph,
            &weights,
            &[seed(0, 4.0), seed(1, 1.0)],
            SearchLimits::default(),
        );

        assert_eq!(tree.cost(NodeIndex::new(2)), Some(4.0));
        let (root, edges) = tree.edges_to(&graph, NodeIndex::new(2)).unwrap();
        assert_eq!(root, 1);
        assert_eq!(edges, vec![EdgeIndex::new(1)]);
    }
}
