//! Immutable road graph with spatial indices for snapping

use std::fmt;

use geo::{Line, Point};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use rstar::{PointDistance, RTree, primitives::GeomWithData};

use super::components::{DirectionClass, NetworkLine, RoadEdge, RoadNode};
use crate::LineId;

pub type IndexedNode = GeomWithData<Point<f64>, NodeIndex>;
pub type IndexedSegment = GeomWithData<Line<f64>, LineId>;

/// Relative slack on squared search radii, absorbing rounding in `distance_2`
const RADIUS_TOLERANCE: f64 = 1e-9;

fn squared_radius(radius: f64) -> f64 {
    radius * radius * (1.0 + RADIUS_TOLERANCE)
}

/// Directed road network
///
/// Built once by [`NetworkBuilder`](crate::NetworkBuilder) and read-only
/// afterwards. Nodes are numbered densely; every node is incident to at least
/// one edge.
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) graph: DiGraph<RoadNode, RoadEdge>,
    pub(crate) lines: Vec<NetworkLine>,
    pub(crate) cost_columns: Vec<String>,
    pub(crate) directed: bool,
    node_rtree: RTree<IndexedNode>,
    segment_rtree: RTree<IndexedSegment>,
}

impl Network {
    pub(crate) fn from_parts(
        graph: DiGraph<RoadNode, RoadEdge>,
        lines: Vec<NetworkLine>,
        cost_columns: Vec<String>,
        directed: bool,
    ) -> Self {
        let node_rtree = build_node_rtree(&graph);
        let segment_rtree = build_segment_rtree(&lines);

        Self {
            graph,
            lines,
            cost_columns,
            directed,
            node_rtree,
            segment_rtree,
        }
    }

    pub fn graph(&self) -> &DiGraph<RoadNode, RoadEdge> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn node(&self, node: NodeIndex) -> &RoadNode {
        &self.graph[node]
    }

    pub fn edge(&self, edge: EdgeIndex) -> &RoadEdge {
        &self.graph[edge]
    }

    /// Source and target node of an edge, `None` for an index from another network
    pub fn edge_endpoints(&self, edge: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(edge)
    }

    pub fn line(&self, line: LineId) -> &NetworkLine {
        &self.lines[line]
    }

    pub fn lines(&self) -> &[NetworkLine] {
        &self.lines
    }

    /// Names of the per-edge cost columns
    pub fn cost_columns(&self) -> &[String] {
        &self.cost_columns
    }

    pub fn cost_column_index(&self, name: &str) -> Option<usize> {
        self.cost_columns.iter().position(|column| column == name)
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Sum of all line lengths in map units
    pub fn total_length(&self) -> f64 {
        self.lines.iter().map(|line| line.length).sum()
    }

    /// Share of lines that can be travelled both ways, in percent
    #[allow(clippy::cast_precision_loss)]
    pub fn percent_bidirectional(&self) -> f64 {
        if self.lines.is_empty() {
            return 0.0;
        }
        let both = self
            .lines
            .iter()
            .filter(|line| line.class == DirectionClass::Both)
            .count();
        both as f64 / self.lines.len() as f64 * 100.0
    }

    /// Nearest node no further than `radius` from `point`
    ///
    /// Equidistant nodes resolve to the lowest node index.
    pub fn nearest_node_within(&self, point: &Point<f64>, radius: f64) -> Option<(NodeIndex, f64)> {
        self.node_rtree
            .locate_within_distance(*point, squared_radius(radius))
            .map(|entry| (entry.data, entry.distance_2(point)))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(node, distance_2)| (node, distance_2.sqrt()))
    }

    /// Nearest line no further than `radius` from `point`
    ///
    /// Equidistant lines resolve to the lowest line id.
    pub fn nearest_line_within(&self, point: &Point<f64>, radius: f64) -> Option<(LineId, f64)> {
        self.segment_rtree
            .locate_within_distance(*point, squared_radius(radius))
            .map(|entry| (entry.data, entry.distance_2(point)))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(line, distance_2)| (line, distance_2.sqrt()))
    }
}

fn build_node_rtree(graph: &DiGraph<RoadNode, RoadEdge>) -> RTree<IndexedNode> {
    let entries = graph
        .node_indices()
        .map(|node| GeomWithData::new(graph[node].geometry, node))
        .collect();
    RTree::bulk_load(entries)
}

fn build_segment_rtree(lines: &[NetworkLine]) -> RTree<IndexedSegment> {
    let entries = lines
        .iter()
        .enumerate()
        .flat_map(|(line_id, line)| {
            line.geometry
                .lines()
                .map(move |segment| GeomWithData::new(segment, line_id))
        })
        .collect();
    RTree::bulk_load(entries)
}

impl fmt::Display for Network {
    /// Lengths are reported in kilometres, assuming metre map units.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let km = self.total_length() / 1000.0;
        if self.directed {
            write!(
                f,
                "DirectedNetwork({km:.0} km, percent_bidirectional={:.0})",
                self.percent_bidirectional()
            )
        } else {
            write!(f, "Network({km:.0} km)")
        }
    }
}
