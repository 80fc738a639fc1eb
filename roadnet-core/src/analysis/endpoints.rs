//! How resolved query points enter and leave the graph

use petgraph::graph::NodeIndex;

use super::NetworkAnalysis;
use crate::{
    model::{EdgeDirection, QueryPoint},
    resolver::{Snap, SnapTarget},
    routing::{PartialEdge, RoutePath, Seed, ShortestPathTree},
};

/// Graph node a query point connects through
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Anchor {
    pub(crate) node: NodeIndex,
    /// Cost between the query point and `node`
    pub(crate) cost: f64,
    /// Edge part travelled between the snap position and `node`
    pub(crate) partial: Option<PartialEdge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    Departure,
    Arrival,
}

/// Resolved query point ready for routing
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Endpoint {
    pub(crate) point: QueryPoint,
    pub(crate) snap: Snap,
    pub(crate) connector: f64,
    pub(crate) anchors: Vec<Anchor>,
}

impl Endpoint {
    pub(crate) fn seeds(&self) -> Vec<Seed> {
        self.anchors
            .iter()
            .map(|anchor| Seed {
                node: anchor.node,
                cost: anchor.cost,
            })
            .collect()
    }
}

impl NetworkAnalysis<'_> {
    /// Resolves points and builds their anchors, `None` for unreachable points
    pub(crate) fn endpoints(&self, points: &[QueryPoint], role: Role) -> Vec<Option<Endpoint>> {
        self.resolve(points)
            .into_iter()
            .zip(points)
            .map(|(resolution, point)| {
                let snap = *resolution.snap()?;
                let connector = self.rules.connector_cost(snap.distance);
                let anchors = self.anchors(&snap, connector, role);
                (!anchors.is_empty()).then_some(Endpoint {
                    point: *point,
                    snap,
                    connector,
                    anchors,
                })
            })
            .collect()
    }

    fn anchors(&self, snap: &Snap, connector: f64, role: Role) -> Vec<Anchor> {
        match snap.target {
            SnapTarget::Node(node) => vec![Anchor {
                node,
                cost: connector,
                partial: None,
            }],
            SnapTarget::Line { line, fraction } => self
                .network
                .line(line)
                .edges
                .iter()
                .filter_map(|&edge| {
                    let weight = self.weights[edge.index()];
                    if !weight.is_finite() {
                        return None;
                    }
                    let (source, target) = self.network.edge_endpoints(edge)?;
                    let along = edge_fraction(self.network.edge(edge).direction, fraction);
                    let anchor = match role {
                        Role::Departure => Anchor {
                            node: target,
                            cost: connector + (1.0 - along) * weight,
                            partial: (along < 1.0).then_some(PartialEdge {
                                edge,
                                start: along,
                                end: 1.0,
                            }),
                        },
                        Role::Arrival => Anchor {
                            node: source,
                            cost: connector + along * weight,
                            partial: (along > 0.0).then_some(PartialEdge {
                                edge,
                                start: 0.0,
                                end: along,
                            }),
                        },
                    };
                    Some(anchor)
                })
                .collect(),
        }
    }

    /// Cheapest path from the origin of `tree` to `destination`
    pub(crate) fn route(
        &self,
        tree: &ShortestPathTree,
        origin: &Endpoint,
        destination: &Endpoint,
    ) -> Option<RoutePath> {
        if origin.point.geometry == destination.point.geometry {
            return Some(RoutePath {
                cost: 0.0,
                head: None,
                edges: Vec::new(),
                tail: None,
            });
        }

        let via_graph = destination
            .anchors
            .iter()
            .filter_map(|anchor| Some((tree.cost(anchor.node)? + anchor.cost, anchor)))
            .min_by(|a, b| a.0.total_cmp(&b.0));
        let direct = self.direct_path(origin, destination);

        match (via_graph, direct) {
            (Some((cost, _)), Some(direct)) if direct.cost <= cost => Some(direct),
            (Some((cost, anchor)), _) => {
                let (seed, edges) = tree.edges_to(&self.network.graph, anchor.node)?;
                Some(RoutePath {
                    cost,
                    head: origin.anchors[seed].partial,
                    edges,
                    tail: anchor.partial,
                })
            }
            (None, direct) => direct,
        }
    }

    /// Travel along the one line both points snapped to
    fn direct_path(&self, origin: &Endpoint, destination: &Endpoint) -> Option<RoutePath> {
        let (
            SnapTarget::Line {
                line,
                fraction: from,
            },
            SnapTarget::Line {
                line: to_line,
                fraction: to,
            },
        ) = (origin.snap.target, destination.snap.target)
        else {
            return None;
        };
        if line != to_line {
            return None;
        }

        self.network
            .line(line)
            .edges
            .iter()
            .filter_map(|&edge| {
                let direction = self.network.edge(edge).direction;
                let start = edge_fraction(direction, from);
                let end = edge_fraction(direction, to);
                let weight = self.weights[edge.index()];
                (end >= start && weight.is_finite()).then(|| {
                    RoutePath::direct(
                        origin.connector + destination.connector + (end - start) * weight,
                        PartialEdge { edge, start, end },
                    )
                })
            })
            .min_by(|a, b| a.cost.total_cmp(&b.cost))
    }
}

/// Position along an edge geometry from a position along its line
fn edge_fraction(direction: EdgeDirection, line_fraction: f64) -> f64 {
    match direction {
        EdgeDirection::Forward => line_fraction,
        EdgeDirection::Backward => 1.0 - line_fraction,
    }
}
