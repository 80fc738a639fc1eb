use fixedbitset::FixedBitSet;
use geo::LineString;
use hashbrown::HashMap;
use itertools::Itertools;
use log::warn;
use petgraph::graph::{EdgeIndex, NodeIndex};
use rayon::prelude::*;

use super::{
    NetworkAnalysis,
    endpoints::{Endpoint, Role},
};
use crate::{
    Error, LineId, PointId,
    model::QueryPoint,
    routing::{RoutePath, SearchLimits},
};

/// Routed path of one origin-destination pair
#[derive(Debug, Clone, PartialEq)]
pub struct PathRow {
    pub origin: PointId,
    pub destination: PointId,
    pub cost: f64,
    pub geometry: LineString<f64>,
}

/// How often a directed edge was used by a set of paths
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeUsage {
    pub edge: EdgeIndex,
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub line: LineId,
    /// Number of paths travelling the edge
    pub n: usize,
    /// Sum of the pair weights of those paths
    pub frequency: f64,
    pub geometry: LineString<f64>,
}

/// One of several alternative routes of a pair, `k` counting from 1
#[derive(Debug, Clone, PartialEq)]
pub struct KRouteRow {
    pub origin: PointId,
    pub destination: PointId,
    pub k: usize,
    pub cost: f64,
    pub geometry: LineString<f64>,
}

/// Output of [`NetworkAnalysis::shortest_path`]
#[derive(Debug, Clone, PartialEq)]
pub enum ShortestPaths {
    Routes(Vec<PathRow>),
    Summary(Vec<EdgeUsage>),
}

/// Path found for one pair, before geometries are built
struct PairPath {
    origin: PointId,
    destination: PointId,
    path: RoutePath,
}

impl NetworkAnalysis<'_> {
    /// Shortest paths between every origin and every destination
    ///
    /// Pairs without a path, or whose points share a location, give no row.
    /// With `summarise` the paths are counted per directed edge instead.
    pub fn shortest_path(
        &self,
        origins: &[QueryPoint],
        destinations: &[QueryPoint],
        summarise: bool,
    ) -> ShortestPaths {
        let paths = self.pair_paths(origins, destinations);

        if summarise {
            return ShortestPaths::Summary(self.edge_usage(&paths, |_, _| 1.0));
        }

        ShortestPaths::Routes(
            paths
                .into_iter()
                .map(|pair| PathRow {
                    origin: pair.origin,
                    destination: pair.destination,
                    cost: pair.path.cost,
                    geometry: pair.path.geometry(self.network),
                })
                .collect(),
        )
    }

    /// Edge usage of all shortest paths, each path weighted by its pair
    ///
    /// `pair_weight` receives origin and destination ids; pass `|_, _| 1.0`
    /// to count paths.
    pub fn route_frequencies(
        &self,
        origins: &[QueryPoint],
        destinations: &[QueryPoint],
        pair_weight: impl Fn(PointId, PointId) -> f64,
    ) -> Vec<EdgeUsage> {
        let paths = self.pair_paths(origins, destinations);
        self.edge_usage(&paths, pair_weight)
    }

    /// Up to `k` alternative routes per pair
    ///
    /// After each route the middle `drop_middle_percent` of its edges is
    /// banned for the following searches, keeping at least one edge at
    /// either end. Fewer routes are returned once no new route is found.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `k` is zero or the percentage is
    /// outside `0..=100`.
    pub fn k_routes(
        &self,
        origins: &[QueryPoint],
        destinations: &[QueryPoint],
        k: usize,
        drop_middle_percent: f64,
    ) -> Result<Vec<KRouteRow>, Error> {
        if k == 0 {
            return Err(Error::InvalidInput("k must be at least 1".to_string()));
        }
        if !(0.0..=100.0).contains(&drop_middle_percent) {
            return Err(Error::InvalidInput(format!(
                "drop_middle_percent must be within 0..=100, got {drop_middle_percent}"
            )));
        }

        let departures = self.endpoints(origins, Role::Departure);
        let arrivals = self.endpoints(destinations, Role::Arrival);

        let rows: Vec<KRouteRow> = departures
            .par_iter()
            .flatten()
            .map(|departure| {
                arrivals
                    .iter()
                    .flatten()
                    .flat_map(|arrival| {
                        self.alternatives(departure, arrival, k, drop_middle_percent)
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();

        if rows.is_empty() {
            warn!("No routes found between the given points");
        }
        Ok(rows)
    }

    fn alternatives(
        &self,
        departure: &Endpoint,
        arrival: &Endpoint,
        k: usize,
        drop_middle_percent: f64,
    ) -> Vec<KRouteRow> {
        let mut banned = FixedBitSet::with_capacity(self.network.edge_count());
        let mut rows = Vec::new();
        let mut previous: Option<RoutePath> = None;

        for route in 1..=k {
            let limits = SearchLimits {
                cutoff: None,
                banned: Some(&banned),
            };
            let tree = self.search(departure, limits);
            let Some(path) = self.route(&tree, departure, arrival) else {
                break;
            };
            if path.is_empty() || previous.as_ref() == Some(&path) {
                break;
            }

            rows.push(KRouteRow {
                origin: departure.point.id,
                destination: arrival.point.id,
                k: route,
                cost: path.cost,
                geometry: path.geometry(self.network),
            });

            let middle = middle_edges(&path.edges, drop_middle_percent);
            if middle.is_empty() {
                break;
            }
            for edge in middle {
                banned.insert(edge.index());
            }
            previous = Some(path);
        }

        rows
    }

    /// Non-empty shortest paths of all resolved pairs, origin-major
    fn pair_paths(&self, origins: &[QueryPoint], destinations: &[QueryPoint]) -> Vec<PairPath> {
        let departures = self.endpoints(origins, Role::Departure);
        let arrivals = self.endpoints(destinations, Role::Arrival);

        let paths: Vec<PairPath> = departures
            .par_iter()
            .flatten()
            .map(|departure| {
                let tree = self.search(departure, SearchLimits::default());
                arrivals
                    .iter()
                    .flatten()
                    .filter_map(|arrival| {
                        let path = self.route(&tree, departure, arrival)?;
                        (!path.is_empty()).then_some(PairPath {
                            origin: departure.point.id,
                            destination: arrival.point.id,
                            path,
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();

        if paths.is_empty() {
            warn!("No paths found between the given points");
        }
        paths
    }

    /// Per-edge path counts, ordered by edge index
    fn edge_usage(
        &self,
        paths: &[PairPath],
        pair_weight: impl Fn(PointId, PointId) -> f64,
    ) -> Vec<EdgeUsage> {
        let mut usage: HashMap<EdgeIndex, (usize, f64)> = HashMap::new();
        for pair in paths {
            let weight = pair_weight(pair.origin, pair.destination);
            for edge in pair.path.all_edges().unique() {
                let entry = usage.entry(edge).or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += weight;
            }
        }

        usage
            .into_iter()
            .sorted_by_key(|(edge, _)| *edge)
            .filter_map(|(edge, (n, frequency))| {
                let (source, target) = self.network.edge_endpoints(edge)?;
                let road = self.network.edge(edge);
                Some(EdgeUsage {
                    edge,
                    source,
                    target,
                    line: road.line,
                    n,
                    frequency,
                    geometry: road.geometry.clone(),
                })
            })
            .collect()
    }
}

/// Edges between the kept ends of a route
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn middle_edges(edges: &[EdgeIndex], drop_middle_percent: f64) -> &[EdgeIndex] {
    let len = edges.len() as f64;
    let keep = (((len - len * drop_middle_percent / 100.0) / 2.0).round() as usize).max(1);
    if keep * 2 >= edges.len() {
        return &[];
    }
    &edges[keep..edges.len() - keep]
}
