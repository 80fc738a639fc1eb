//! Road network components - nodes, edges and the cleaned lines behind them

use geo::{LineString, Point};
use petgraph::graph::EdgeIndex;
use serde::{Deserialize, Serialize};

use crate::LineId;

/// Road graph node
#[derive(Debug, Clone)]
pub struct RoadNode {
    /// Node coordinates
    pub geometry: Point<f64>,
    /// Number of network lines meeting at the node
    pub degree: usize,
}

/// Orientation of a directed edge relative to its line geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeDirection {
    Forward,
    Backward,
}

/// Which directed edges a line contributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectionClass {
    Both,
    Forward,
    Backward,
}

impl DirectionClass {
    pub fn directions(self) -> &'static [EdgeDirection] {
        match self {
            DirectionClass::Both => &[EdgeDirection::Forward, EdgeDirection::Backward],
            DirectionClass::Forward => &[EdgeDirection::Forward],
            DirectionClass::Backward => &[EdgeDirection::Backward],
        }
    }
}

/// Road graph edge (directed street segment)
#[derive(Debug, Clone)]
pub struct RoadEdge {
    /// Line this edge was emitted from
    pub line: LineId,
    /// Row of the input feature, `None` for hole lines
    pub source_row: Option<usize>,
    pub direction: EdgeDirection,
    /// Geometric length in map units
    pub length: f64,
    /// Cost values aligned with `Network::cost_columns`
    pub costs: Vec<f64>,
    /// Geometry oriented from source to target node
    pub geometry: LineString<f64>,
}

impl RoadEdge {
    pub fn is_hole(&self) -> bool {
        self.source_row.is_none()
    }
}

/// A cleaned network line
#[derive(Debug, Clone)]
pub struct NetworkLine {
    /// Row of the input feature, `None` for lines added when closing holes
    pub source_row: Option<usize>,
    pub geometry: LineString<f64>,
    pub length: f64,
    pub class: DirectionClass,
    /// Directed edges emitted from this line
    pub edges: Vec<EdgeIndex>,
}

impl NetworkLine {
    pub fn is_hole(&self) -> bool {
        self.source_row.is_none()
    }
}
