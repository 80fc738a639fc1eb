//! Snapping of query points onto the network

use geo::{LineLocatePoint, Point};
use log::trace;
use petgraph::graph::NodeIndex;

use crate::{LineId, model::Network, model::QueryPoint};

/// Network location a query point was snapped to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapTarget {
    Node(NodeIndex),
    /// Position on a line as a fraction of its length from the line start
    Line { line: LineId, fraction: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snap {
    pub target: SnapTarget,
    /// Distance from the query point to the target
    pub distance: f64,
    /// The target was only found within the expanded radius
    pub expanded: bool,
}

/// Outcome of resolving one query point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Snapped(Snap),
    Unreachable,
}

impl Resolution {
    pub fn snap(&self) -> Option<&Snap> {
        match self {
            Resolution::Snapped(snap) => Some(snap),
            Resolution::Unreachable => None,
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, Resolution::Unreachable)
    }
}

/// Resolves query points against the spatial indices of a network
///
/// A point snaps to the nearest target within `tolerance`, both inclusive.
/// Failing that, one more search runs with `tolerance * factor`. Equidistant
/// targets resolve to the lowest index.
#[derive(Debug, Clone, Copy)]
pub struct NodeResolver<'a> {
    network: &'a Network,
}

impl<'a> NodeResolver<'a> {
    pub fn new(network: &'a Network) -> Self {
        Self { network }
    }

    /// Snaps each point to the nearest node
    pub fn resolve(&self, points: &[QueryPoint], tolerance: f64, factor: f64) -> Vec<Resolution> {
        points
            .iter()
            .map(|point| {
                self.resolve_point(point, tolerance, factor, |geometry, radius| {
                    self.network
                        .nearest_node_within(geometry, radius)
                        .map(|(node, distance)| (SnapTarget::Node(node), distance))
                })
            })
            .collect()
    }

    /// Snaps each point to the nearest position on the nearest line
    pub fn resolve_on_lines(
        &self,
        points: &[QueryPoint],
        tolerance: f64,
        factor: f64,
    ) -> Vec<Resolution> {
        points
            .iter()
            .map(|point| {
                self.resolve_point(point, tolerance, factor, |geometry, radius| {
                    let (line, distance) = self.network.nearest_line_within(geometry, radius)?;
                    let fraction = self
                        .network
                        .line(line)
                        .geometry
                        .line_locate_point(geometry)
                        .unwrap_or(0.0);
                    Some((SnapTarget::Line { line, fraction }, distance))
                })
            })
            .collect()
    }

    fn resolve_point(
        &self,
        point: &QueryPoint,
        tolerance: f64,
        factor: f64,
        nearest: impl Fn(&Point<f64>, f64) -> Option<(SnapTarget, f64)>,
    ) -> Resolution {
        let snapped = nearest(&point.geometry, tolerance)
            .map(|found| (found, false))
            .or_else(|| nearest(&point.geometry, tolerance * factor).map(|found| (found, true)));

        match snapped {
            Some(((target, distance), expanded)) => {
                trace!(
                    "Point {} snapped to {target:?} at distance {distance:.2}{}",
                    point.id,
                    if expanded { " (expanded search)" } else { "" }
                );
                Resolution::Snapped(Snap {
                    target,
                    distance,
                    expanded,
                })
            }
            None => {
                trace!("Point {} has no network within {}", point.id, tolerance * factor);
                Resolution::Unreachable
            }
        }
    }
}
