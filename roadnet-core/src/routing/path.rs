use geo::{Coord, LineString};
use petgraph::graph::EdgeIndex;

use crate::{
    geometry::{extend_coords, line_substring},
    model::Network,
};

/// Part of an edge between two fractions of its oriented geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PartialEdge {
    pub(crate) edge: EdgeIndex,
    pub(crate) start: f64,
    pub(crate) end: f64,
}

impl PartialEdge {
    pub(crate) fn geometry(&self, network: &Network) -> LineString<f64> {
        line_substring(&network.edge(self.edge).geometry, self.start, self.end)
    }
}

/// Routed path between two query points
///
/// `head` and `tail` are the partially travelled edges at either end when
/// points sit on lines rather than nodes. A `direct` path stays on one edge.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RoutePath {
    pub(crate) cost: f64,
    pub(crate) head: Option<PartialEdge>,
    pub(crate) edges: Vec<EdgeIndex>,
    pub(crate) tail: Option<PartialEdge>,
}

impl RoutePath {
    pub(crate) fn direct(cost: f64, part: PartialEdge) -> Self {
        Self {
            cost,
            head: Some(part),
            edges: Vec::new(),
            tail: None,
        }
    }

    /// No network travelled at all
    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none() && self.edges.is_empty() && self.tail.is_none()
    }

    /// Every edge touched by the path, partial ones included, in travel order
    pub(crate) fn all_edges(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.head
            .iter()
            .map(|part| part.edge)
            .chain(self.edges.iter().copied())
            .chain(self.tail.iter().map(|part| part.edge))
    }

    /// Concatenated geometry of the travelled edges
    pub(crate) fn geometry(&self, network: &Network) -> LineString<f64> {
        let mut coords: Vec<Coord<f64>> = Vec::new();
        if let Some(head) = &self.head {
            extend_coords(&mut coords, &head.geometry(network));
        }
        for &edge in &self.edges {
            extend_coords(&mut coords, &network.edge(edge).geometry);
        }
        if let Some(tail) = &self.tail {
            extend_coords(&mut coords, &tail.geometry(network));
        }
        LineString::new(coords)
    }
}
