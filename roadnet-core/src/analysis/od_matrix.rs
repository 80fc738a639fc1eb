use geo::LineString;
use log::warn;
use rayon::prelude::*;

use super::{
    NetworkAnalysis,
    endpoints::{Endpoint, Role},
};
use crate::{Error, PointId, model::QueryPoint, routing::SearchLimits};

/// Cost between one origin and one destination
#[derive(Debug, Clone, PartialEq)]
pub struct OdCostRow {
    pub origin: PointId,
    pub destination: PointId,
    /// `None` when either point is unreachable or no path exists
    pub cost: Option<f64>,
    /// Routed geometry, when requested and the path travels the network
    pub geometry: Option<LineString<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OdOptions {
    /// Attach routed geometries
    pub lines: bool,
    /// Pair the i-th origin with the i-th destination only
    pub rowwise: bool,
    /// Keep only rows cheaper than this
    pub cutoff: Option<f64>,
    /// Keep only the cheapest reachable destinations of each origin
    pub destination_count: Option<usize>,
}

/// Rows of an OD cost matrix in origin-major order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OdCostMatrix {
    rows: Vec<OdCostRow>,
}

impl OdCostMatrix {
    pub fn rows(&self) -> &[OdCostRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<OdCostRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cost of a pair, `None` if the pair is absent or has no path
    pub fn cost(&self, origin: PointId, destination: PointId) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.origin == origin && row.destination == destination)
            .and_then(|row| row.cost)
    }

    /// Share of rows without a cost, in percent
    #[allow(clippy::cast_precision_loss)]
    pub fn percent_missing(&self) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        let missing = self.rows.iter().filter(|row| row.cost.is_none()).count();
        missing as f64 / self.rows.len() as f64 * 100.0
    }

    /// Mean of the known costs
    #[allow(clippy::cast_precision_loss)]
    pub fn cost_mean(&self) -> Option<f64> {
        let costs: Vec<f64> = self.rows.iter().filter_map(|row| row.cost).collect();
        (!costs.is_empty()).then(|| costs.iter().sum::<f64>() / costs.len() as f64)
    }
}

impl IntoIterator for OdCostMatrix {
    type Item = OdCostRow;
    type IntoIter = std::vec::IntoIter<OdCostRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl NetworkAnalysis<'_> {
    /// Costs between every origin and every destination
    ///
    /// Each origin is searched once for all destinations. Pairs without a
    /// path keep a row with no cost.
    pub fn od_cost_matrix(
        &self,
        origins: &[QueryPoint],
        destinations: &[QueryPoint],
        lines: bool,
    ) -> OdCostMatrix {
        let options = OdOptions {
            lines,
            ..OdOptions::default()
        };
        self.collect_matrix(origins, destinations, &options)
    }

    /// Cost matrix with row selection options
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `rowwise` is set and the point sets
    /// differ in length, or if the cutoff is not a number.
    pub fn od_cost_matrix_with(
        &self,
        origins: &[QueryPoint],
        destinations: &[QueryPoint],
        options: &OdOptions,
    ) -> Result<OdCostMatrix, Error> {
        if options.rowwise && origins.len() != destinations.len() {
            return Err(Error::InvalidInput(format!(
                "rowwise matrix needs as many origins as destinations, got {} and {}",
                origins.len(),
                destinations.len()
            )));
        }
        if options.cutoff.is_some_and(f64::is_nan) {
            return Err(Error::InvalidInput("cutoff must be a number".to_string()));
        }
        Ok(self.collect_matrix(origins, destinations, options))
    }

    fn collect_matrix(
        &self,
        origins: &[QueryPoint],
        destinations: &[QueryPoint],
        options: &OdOptions,
    ) -> OdCostMatrix {
        let departures = self.endpoints(origins, Role::Departure);
        let arrivals = self.endpoints(destinations, Role::Arrival);

        let rows: Vec<OdCostRow> = origins
            .par_iter()
            .enumerate()
            .map(|(index, origin)| {
                let targets = if options.rowwise {
                    index..index + 1
                } else {
                    0..destinations.len()
                };
                let mut rows = self.origin_rows(
                    origin,
                    departures[index].as_ref(),
                    &destinations[targets.clone()],
                    &arrivals[targets],
                    options,
                );
                select_rows(&mut rows, options);
                rows
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();

        let matrix = OdCostMatrix { rows };
        let missing = matrix.percent_missing();
        if missing > 0.0 {
            warn!("{missing:.1} percent of origin-destination pairs have no cost");
        }
        matrix
    }

    fn origin_rows(
        &self,
        origin: &QueryPoint,
        departure: Option<&Endpoint>,
        destinations: &[QueryPoint],
        arrivals: &[Option<Endpoint>],
        options: &OdOptions,
    ) -> Vec<OdCostRow> {
        let empty_row = |destination: &QueryPoint| OdCostRow {
            origin: origin.id,
            destination: destination.id,
            cost: None,
            geometry: None,
        };

        let Some(departure) = departure else {
            return destinations.iter().map(empty_row).collect();
        };

        let limits = SearchLimits {
            cutoff: options.cutoff,
            banned: None,
        };
        let tree = self.search(departure, limits);

        destinations
            .iter()
            .zip(arrivals)
            .map(|(destination, arrival)| {
                let path = arrival
                    .as_ref()
                    .and_then(|arrival| self.route(&tree, departure, arrival));
                match path {
                    Some(path) => OdCostRow {
                        origin: origin.id,
                        destination: destination.id,
                        cost: Some(path.cost),
                        geometry: (options.lines && !path.is_empty())
                            .then(|| path.geometry(self.network)),
                    },
                    None => empty_row(destination),
                }
            })
            .collect()
    }
}

fn select_rows(rows: &mut Vec<OdCostRow>, options: &OdOptions) {
    if let Some(cutoff) = options.cutoff {
        rows.retain(|row| row.cost.is_some_and(|cost| cost < cutoff));
    }

    if let Some(count) = options.destination_count {
        let mut ranked: Vec<(usize, f64)> = rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| Some((index, row.cost?)))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        let mut keep = vec![false; rows.len()];
        for &(index, _) in ranked.iter().take(count) {
            keep[index] = true;
        }

        let mut flags = keep.into_iter();
        rows.retain(|_| flags.next().unwrap_or(false));
    }
}
