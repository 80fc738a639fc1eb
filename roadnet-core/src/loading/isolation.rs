//! Removal of disconnected network parts

use petgraph::{
    algo::kosaraju_scc,
    graph::{DiGraph, NodeIndex},
    unionfind::UnionFind,
};

use super::{config::IsolationPolicy, directed::PlannedEdge};

/// Which planned edges survive the isolation policy
pub(crate) fn kept_edges(
    node_count: usize,
    edges: &[PlannedEdge],
    policy: IsolationPolicy,
) -> Vec<bool> {
    match policy {
        IsolationPolicy::KeepAll => vec![true; edges.len()],
        IsolationPolicy::LargestComponent => {
            let keep = largest_weak_component(node_count, edges);
            edges.iter().map(|edge| keep[edge.source]).collect()
        }
        IsolationPolicy::StronglyConnected => {
            let keep = largest_strong_component(node_count, edges);
            edges
                .iter()
                .map(|edge| keep[edge.source] && keep[edge.target])
                .collect()
        }
    }
}

/// Membership of the weakly connected component with most nodes
///
/// Ties go to the component holding the lowest node id.
fn largest_weak_component(node_count: usize, edges: &[PlannedEdge]) -> Vec<bool> {
    let mut sets = UnionFind::new(node_count);
    for edge in edges {
        sets.union(edge.source, edge.target);
    }

    let labels = sets.into_labeling();
    let mut sizes = vec![0usize; node_count];
    for &label in &labels {
        sizes[label] += 1;
    }

    // first node of the largest component, scanning in id order
    let Some(best) = labels
        .iter()
        .copied()
        .reduce(|best, label| if sizes[label] > sizes[best] { label } else { best })
    else {
        return Vec::new();
    };
    labels.iter().map(|&label| label == best).collect()
}

/// Membership of the largest set of mutually reachable nodes
///
/// Ties go to the component holding the lowest node id.
fn largest_strong_component(node_count: usize, edges: &[PlannedEdge]) -> Vec<bool> {
    let mut graph: DiGraph<(), ()> = DiGraph::with_capacity(node_count, edges.len());
    for _ in 0..node_count {
        graph.add_node(());
    }
    for edge in edges {
        graph.add_edge(NodeIndex::new(edge.source), NodeIndex::new(edge.target), ());
    }

    let mut keep = vec![false; node_count];
    let best = kosaraju_scc(&graph)
        .into_iter()
        .filter_map(|component| {
            let lowest = component.iter().min().copied()?;
            Some((component, lowest))
        })
        .max_by(|(a, a_lowest), (b, b_lowest)| {
            a.len().cmp(&b.len()).then(b_lowest.cmp(a_lowest))
        });

    if let Some((component, _)) = best {
        for node in component {
            keep[node.index()] = true;
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EdgeDirection;

    fn edge(source: usize, target: usize) -> PlannedEdge {
        PlannedEdge {
            line: 0,
            direction: EdgeDirection::Forward,
            source,
            target,
            costs: Vec::new(),
        }
    }

    #[test]
    fn largest_component_wins() {
        let edges = vec![edge(0, 1), edge(2, 3), edge(3, 4)];
        let kept = kept_edges(5, &edges, IsolationPolicy::LargestComponent);
        assert_eq!(kept, vec![false, true, true]);
    }

    #[test]
    fn equal_components_keep_lowest_node() {
        let edges = vec![edge(2, 3), edge(0, 1)];
        let kept = kept_edges(4, &edges, IsolationPolicy::LargestComponent);
        assert_eq!(kept, vec![false, true]);
    }

    #[test]
    fn strong_component_drops_one_way_tails() {
        // 0 <-> 1 <-> 2 cycle with a one-way spur 2 -> 3
        let edges = vec![
            edge(0, 1),
            edge(1, 0),
            edge(1, 2),
            edge(2, 1),
            edge(2, 3),
        ];
        let kept = kept_edges(4, &edges, IsolationPolicy::StronglyConnected);
        assert_eq!(kept, vec![true, true, true, true, false]);
    }
}
