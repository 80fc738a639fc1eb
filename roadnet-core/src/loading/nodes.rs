use geo::Coord;
use hashbrown::HashMap;

use super::clean::WorkLine;
use crate::geometry::coord_key;

/// Node ids derived from exact line endpoint coordinates
///
/// Nodes are numbered in order of first appearance, source before target.
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeTable {
    pub(crate) coords: Vec<Coord<f64>>,
    /// Source and target node of each line
    pub(crate) endpoints: Vec<(usize, usize)>,
}

impl NodeTable {
    pub(crate) fn from_lines(lines: &[WorkLine]) -> Self {
        let mut ids: HashMap<(u64, u64), usize> = HashMap::with_capacity(lines.len() * 2);
        let mut coords = Vec::with_capacity(lines.len() * 2);
        let mut endpoints = Vec::with_capacity(lines.len());

        let mut node_id = |coord: Coord<f64>| {
            *ids.entry(coord_key(coord)).or_insert_with(|| {
                coords.push(coord);
                coords.len() - 1
            })
        };

        for line in lines {
            let (first, last) = line.endpoints();
            let source = node_id(first);
            let target = node_id(last);
            endpoints.push((source, target));
        }

        Self { coords, endpoints }
    }

    pub(crate) fn len(&self) -> usize {
        self.coords.len()
    }

    /// Number of line ends at each node
    pub(crate) fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.coords.len()];
        for &(source, target) in &self.endpoints {
            degrees[source] += 1;
            degrees[target] += 1;
        }
        degrees
    }
}
