//! Query engine answering cost matrix, shortest path and service area queries
//!
//! Every query resolves its points afresh, then runs one multi-source
//! Dijkstra per origin in parallel.

mod endpoints;
mod od_matrix;
mod paths;
mod service_area;

use log::{info, warn};

pub use od_matrix::{OdCostMatrix, OdCostRow, OdOptions};
pub use paths::{EdgeUsage, KRouteRow, PathRow, ShortestPaths};
pub use service_area::{ServiceArea, ServiceAreaEdge, ServiceAreas};

use self::endpoints::Endpoint;
use crate::{
    Error,
    model::{Network, QueryPoint},
    resolver::{NodeResolver, Resolution},
    routing::{SearchLimits, ShortestPathTree, shortest_path_tree},
    rules::Rules,
};

/// Network paired with validated rules
///
/// Construction resolves the weight once; queries only read the network.
#[derive(Debug, Clone)]
pub struct NetworkAnalysis<'a> {
    network: &'a Network,
    rules: Rules,
    /// Weight of every edge by edge index, infinite when impassable
    weights: Vec<f64>,
}

impl<'a> NetworkAnalysis<'a> {
    /// # Errors
    ///
    /// Returns an error if the rules are invalid or the weight is not one of
    /// the network cost columns.
    pub fn new(network: &'a Network, rules: Rules) -> Result<Self, Error> {
        rules.validate()?;
        let weights = rules.edge_weights(network)?;
        info!(
            "Analysis on {network} weighted by '{}', search tolerance {}",
            rules.weight, rules.search_tolerance
        );

        Ok(Self {
            network,
            rules,
            weights,
        })
    }

    pub fn network(&self) -> &'a Network {
        self.network
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Resolves points the way queries do
    pub fn resolve(&self, points: &[QueryPoint]) -> Vec<Resolution> {
        let resolver = NodeResolver::new(self.network);
        let (tolerance, factor) = (self.rules.search_tolerance, self.rules.search_factor);
        let resolved = if self.rules.split_lines {
            resolver.resolve_on_lines(points, tolerance, factor)
        } else {
            resolver.resolve(points, tolerance, factor)
        };

        let unreachable = resolved.iter().filter(|r| r.is_unreachable()).count();
        if unreachable > 0 {
            warn!(
                "{unreachable} of {} points have no network within {}",
                points.len(),
                tolerance * factor
            );
        }
        resolved
    }

    fn search(&self, origin: &Endpoint, limits: SearchLimits<'_>) -> ShortestPathTree {
        shortest_path_tree(&self.network.graph, &self.weights, &origin.seeds(), limits)
    }
}
