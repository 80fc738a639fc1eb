use fixedbitset::FixedBitSet;
use geo::{ConvexHull, LineString, MultiLineString, Polygon};
use itertools::Itertools;
use log::warn;
use petgraph::{
    graph::{EdgeIndex, NodeIndex},
    visit::EdgeRef,
};
use rayon::prelude::*;

use super::{
    NetworkAnalysis,
    endpoints::{Endpoint, Role},
};
use crate::{
    Error, LineId, PointId,
    model::QueryPoint,
    routing::{PartialEdge, SearchLimits},
};

/// Lines reached from one origin within one break, merged
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceArea {
    pub origin: PointId,
    pub break_value: f64,
    pub geometry: MultiLineString<f64>,
}

impl ServiceArea {
    /// Convex hull around the reached lines
    pub fn hull(&self) -> Polygon<f64> {
        self.geometry.convex_hull()
    }
}

/// One edge reached from one origin within one break
///
/// An edge reached within several breaks appears once per break.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceAreaEdge {
    pub origin: PointId,
    pub break_value: f64,
    pub edge: EdgeIndex,
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub line: LineId,
    /// Cost at the far end of the reached part
    pub cost: f64,
    pub geometry: LineString<f64>,
}

/// Output of the service area queries
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceAreas {
    Dissolved(Vec<ServiceArea>),
    Edges(Vec<ServiceAreaEdge>),
}

impl ServiceAreas {
    pub fn len(&self) -> usize {
        match self {
            ServiceAreas::Dissolved(areas) => areas.len(),
            ServiceAreas::Edges(edges) => edges.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reached edge or edge part
#[derive(Debug, Clone, Copy, PartialEq)]
struct Reach {
    edge: EdgeIndex,
    cost: f64,
    /// Reached part of the edge geometry, `None` for the whole edge
    part: Option<PartialEdge>,
}

impl NetworkAnalysis<'_> {
    /// Edges reachable from each origin within each break
    ///
    /// An edge `u -> v` is reached when the cost at `u` plus its weight does
    /// not exceed the break. Unreachable origins give no rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBreaks`] unless the breaks are non-empty, finite
    /// and strictly increasing.
    pub fn service_area(
        &self,
        origins: &[QueryPoint],
        breaks: &[f64],
        dissolve: bool,
    ) -> Result<ServiceAreas, Error> {
        self.service_areas(origins, breaks, dissolve, false)
    }

    /// Like [`service_area`](Self::service_area), also including the reachable
    /// part of edges that cannot be travelled to their end
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBreaks`] unless the breaks are non-empty, finite
    /// and strictly increasing.
    pub fn precise_service_area(
        &self,
        origins: &[QueryPoint],
        breaks: &[f64],
        dissolve: bool,
    ) -> Result<ServiceAreas, Error> {
        self.service_areas(origins, breaks, dissolve, true)
    }

    fn service_areas(
        &self,
        origins: &[QueryPoint],
        breaks: &[f64],
        dissolve: bool,
        precise: bool,
    ) -> Result<ServiceAreas, Error> {
        validate_breaks(breaks)?;
        let departures = self.endpoints(origins, Role::Departure);

        let reached: Vec<(PointId, Vec<Vec<Reach>>)> = departures
            .par_iter()
            .flatten()
            .map(|departure| (departure.point.id, self.reach(departure, breaks, precise)))
            .collect();

        if reached.is_empty() {
            warn!("None of the {} origins could be resolved", origins.len());
        }

        let areas = if dissolve {
            ServiceAreas::Dissolved(
                reached
                    .iter()
                    .flat_map(|(origin, per_break)| {
                        breaks
                            .iter()
                            .zip(per_break)
                            .filter_map(move |(&break_value, reaches)| {
                                self.dissolved(*origin, break_value, reaches)
                            })
                    })
                    .collect(),
            )
        } else {
            ServiceAreas::Edges(
                reached
                    .iter()
                    .flat_map(|(origin, per_break)| {
                        breaks.iter().zip(per_break).flat_map(move |(&break_value, reaches)| {
                            reaches
                                .iter()
                                .filter_map(move |reach| self.area_edge(*origin, break_value, reach))
                        })
                    })
                    .collect(),
            )
        };
        Ok(areas)
    }

    /// Reached edges for every break, in break order
    fn reach(&self, departure: &Endpoint, breaks: &[f64], precise: bool) -> Vec<Vec<Reach>> {
        let limits = SearchLimits {
            cutoff: breaks.last().copied(),
            banned: None,
        };
        let tree = self.search(departure, limits);
        let nodes = tree.reached();
        let graph = &self.network.graph;

        breaks
            .iter()
            .map(|&budget| {
                let mut reaches = Vec::new();
                let mut full = FixedBitSet::with_capacity(graph.edge_count());

                for &(node, cost) in nodes.iter().take_while(|(_, cost)| *cost <= budget) {
                    for edge in graph.edges(node) {
                        let weight = self.weights[edge.id().index()];
                        if !weight.is_finite() {
                            continue;
                        }
                        if cost + weight <= budget {
                            full.insert(edge.id().index());
                            reaches.push(Reach {
                                edge: edge.id(),
                                cost: cost + weight,
                                part: None,
                            });
                        } else if precise && cost < budget {
                            reaches.push(Reach {
                                edge: edge.id(),
                                cost: budget,
                                part: Some(PartialEdge {
                                    edge: edge.id(),
                                    start: 0.0,
                                    end: (budget - cost) / weight,
                                }),
                            });
                        }
                    }
                }

                // edge parts between the origin and its first nodes
                for anchor in &departure.anchors {
                    let Some(head) = anchor.partial else {
                        continue;
                    };
                    if full.contains(head.edge.index()) {
                        continue;
                    }
                    let weight = self.weights[head.edge.index()];
                    if anchor.cost <= budget {
                        reaches.push(Reach {
                            edge: head.edge,
                            cost: anchor.cost,
                            part: Some(head),
                        });
                    } else if precise && departure.connector < budget {
                        let end = head.start + (budget - departure.connector) / weight;
                        reaches.push(Reach {
                            edge: head.edge,
                            cost: budget,
                            part: Some(PartialEdge {
                                end: end.min(head.end),
                                ..head
                            }),
                        });
                    }
                }

                reaches
            })
            .collect()
    }

    /// Reached lines as one geometry, each fully reached line once
    fn dissolved(&self, origin: PointId, break_value: f64, reaches: &[Reach]) -> Option<ServiceArea> {
        if reaches.is_empty() {
            return None;
        }

        let full_lines: Vec<LineId> = reaches
            .iter()
            .filter(|reach| reach.part.is_none())
            .map(|reach| self.network.edge(reach.edge).line)
            .unique()
            .sorted()
            .collect();

        let mut lines: Vec<LineString<f64>> = full_lines
            .iter()
            .map(|&line| self.network.line(line).geometry.clone())
            .collect();
        lines.extend(
            reaches
                .iter()
                .filter_map(|reach| reach.part)
                .filter(|part| {
                    full_lines
                        .binary_search(&self.network.edge(part.edge).line)
                        .is_err()
                })
                .map(|part| part.geometry(self.network)),
        );

        Some(ServiceArea {
            origin,
            break_value,
            geometry: MultiLineString::new(lines),
        })
    }

    fn area_edge(&self, origin: PointId, break_value: f64, reach: &Reach) -> Option<ServiceAreaEdge> {
        let (source, target) = self.network.edge_endpoints(reach.edge)?;
        let road = self.network.edge(reach.edge);
        Some(ServiceAreaEdge {
            origin,
            break_value,
            edge: reach.edge,
            source,
            target,
            line: road.line,
            cost: reach.cost,
            geometry: reach
                .part
                .map_or_else(|| road.geometry.clone(), |part| part.geometry(self.network)),
        })
    }
}

fn validate_breaks(breaks: &[f64]) -> Result<(), Error> {
    let increasing = breaks.iter().tuple_windows().all(|(a, b)| a < b);
    if breaks.is_empty() || !increasing || breaks.iter().any(|value| !value.is_finite()) {
        return Err(Error::InvalidBreaks(breaks.to_vec()));
    }
    Ok(())
}
