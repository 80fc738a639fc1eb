//! Closing small gaps between dead ends and the rest of the network

use geo::{Coord, LineString};
use hashbrown::HashSet;
use rstar::{RTree, primitives::GeomWithData};

use super::{clean::WorkLine, config::HoleFilling, nodes::NodeTable};
use crate::geometry::bearing;

/// Candidates examined per dead end when connecting to any node
const MAX_HOLE_CANDIDATES: usize = 50;

type IndexedCoord = GeomWithData<[f64; 2], usize>;

/// Dead-end node with the line it terminates
struct DeadEnd {
    node: usize,
    /// Node at the other end of the dead-end line
    other_end: usize,
    /// Direction of travel into the dead end, in degrees
    heading: f64,
}

/// Straight lines closing network holes, in dead-end order
///
/// Every unordered node pair is connected at most once.
pub(crate) fn hole_lines(lines: &[WorkLine], filling: HoleFilling) -> Vec<WorkLine> {
    let nodes = NodeTable::from_lines(lines);
    let dead_ends = dead_ends(lines, &nodes);
    let mut connected: HashSet<(usize, usize)> = HashSet::new();
    let mut holes = Vec::new();

    let mut connect = |from: usize, to: usize, fill_value: f64| {
        let pair = (from.min(to), from.max(to));
        if connected.insert(pair) {
            holes.push(WorkLine::hole(
                LineString::new(vec![nodes.coords[from], nodes.coords[to]]),
                fill_value,
            ));
        }
    };

    match filling {
        HoleFilling::ToNodes {
            max_distance,
            max_angle,
            fill_value,
        } => {
            let tree = coord_tree(&nodes.coords, 0..nodes.len());
            for dead_end in &dead_ends {
                let origin = nodes.coords[dead_end.node];
                let candidate = tree
                    .nearest_neighbor_iter_with_distance_2(&[origin.x, origin.y])
                    .take(MAX_HOLE_CANDIDATES)
                    .take_while(|(_, distance_2)| distance_2.sqrt() <= max_distance)
                    .map(|(entry, _)| entry.data)
                    .filter(|&node| node != dead_end.node && node != dead_end.other_end)
                    .find(|&node| {
                        let heading = bearing(origin, nodes.coords[node]);
                        angle_between(dead_end.heading, heading) <= max_angle
                    });
                if let Some(node) = candidate {
                    connect(dead_end.node, node, fill_value);
                }
            }
        }
        HoleFilling::ToDeadends {
            max_distance,
            fill_value,
        } => {
            let tree = coord_tree(&nodes.coords, dead_ends.iter().map(|d| d.node));
            for dead_end in &dead_ends {
                let origin = nodes.coords[dead_end.node];
                let candidate = tree
                    .nearest_neighbor_iter_with_distance_2(&[origin.x, origin.y])
                    .map(|(entry, distance_2)| (entry.data, distance_2.sqrt()))
                    .find(|&(node, _)| node != dead_end.node && node != dead_end.other_end);
                if let Some((node, distance)) = candidate {
                    if distance < max_distance {
                        connect(dead_end.node, node, fill_value);
                    }
                }
            }
        }
    }

    holes
}

fn dead_ends(lines: &[WorkLine], nodes: &NodeTable) -> Vec<DeadEnd> {
    let degrees = nodes.degrees();
    let mut dead_ends = Vec::new();

    for (line, &(source, target)) in lines.iter().zip(&nodes.endpoints) {
        let coords = &line.geometry.0;
        if degrees[source] == 1 {
            dead_ends.push(DeadEnd {
                node: source,
                other_end: target,
                heading: bearing(coords[1], coords[0]),
            });
        }
        if degrees[target] == 1 {
            let last = coords.len() - 1;
            dead_ends.push(DeadEnd {
                node: target,
                other_end: source,
                heading: bearing(coords[last - 1], coords[last]),
            });
        }
    }

    dead_ends.sort_by_key(|dead_end| dead_end.node);
    dead_ends
}

fn coord_tree(coords: &[Coord<f64>], nodes: impl Iterator<Item = usize>) -> RTree<IndexedCoord> {
    let entries = nodes
        .map(|node| GeomWithData::new([coords[node].x, coords[node].y], node))
        .collect();
    RTree::bulk_load(entries)
}

/// Absolute difference of two bearings in degrees, within `0..=180`
fn angle_between(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    diff.min(360.0 - diff)
}
