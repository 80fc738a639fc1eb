//! Query configuration shared by all analyses on a network

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{Error, loading::MINUTES, model::Network};

pub const DEFAULT_SEARCH_TOLERANCE: f64 = 250.0;
pub const DEFAULT_SEARCH_FACTOR: f64 = 10.0;

/// Cost of the straight hop between a query point and the network
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorCost {
    /// Travel speed in km/h, for time weights
    Kmh(f64),
    /// Factor applied to the snap distance, for length weights
    Multiplier(f64),
}

/// Analysis rules
///
/// ```text
/// { "weight": "minutes", "search_tolerance": 100, "connector": { "kmh": 5 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    /// Cost column to route on, or `"meters"` for geometric length
    pub weight: String,
    /// Snapping radius in map units
    #[serde(default = "default_search_tolerance")]
    pub search_tolerance: f64,
    /// Radius multiplier for the second snapping pass
    #[serde(default = "default_search_factor")]
    pub search_factor: f64,
    /// Snap query points onto lines instead of nodes
    #[serde(default)]
    pub split_lines: bool,
    #[serde(default)]
    pub connector: Option<ConnectorCost>,
}

fn default_search_tolerance() -> f64 {
    DEFAULT_SEARCH_TOLERANCE
}

fn default_search_factor() -> f64 {
    DEFAULT_SEARCH_FACTOR
}

/// What kind of quantity the weight measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WeightKind {
    Length,
    Time,
    Other,
}

/// Weight resolved against a network's cost columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WeightSource {
    Length,
    Column(usize),
}

impl Rules {
    pub fn new(weight: impl Into<String>) -> Self {
        Self {
            weight: weight.into(),
            search_tolerance: DEFAULT_SEARCH_TOLERANCE,
            search_factor: DEFAULT_SEARCH_FACTOR,
            split_lines: false,
            connector: None,
        }
    }

    #[must_use]
    pub fn with_search_tolerance(mut self, tolerance: f64) -> Self {
        self.search_tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_search_factor(mut self, factor: f64) -> Self {
        self.search_factor = factor;
        self
    }

    #[must_use]
    pub fn with_split_lines(mut self, split_lines: bool) -> Self {
        self.split_lines = split_lines;
        self
    }

    #[must_use]
    pub fn with_connector(mut self, connector: ConnectorCost) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Checks the numeric settings
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRules`] for a negative or non-finite tolerance,
    /// a factor below 1, or a connector parameter that is not positive.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.search_tolerance.is_finite() && self.search_tolerance >= 0.0) {
            return Err(Error::InvalidRules(format!(
                "search_tolerance must be a finite non-negative number, got {}",
                self.search_tolerance
            )));
        }
        if !(self.search_factor.is_finite() && self.search_factor >= 1.0) {
            return Err(Error::InvalidRules(format!(
                "search_factor must be a finite number of at least 1, got {}",
                self.search_factor
            )));
        }
        if let Some(ConnectorCost::Kmh(value) | ConnectorCost::Multiplier(value)) = self.connector {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidRules(format!(
                    "connector cost must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn weight_kind(&self) -> WeightKind {
        let weight = self.weight.to_lowercase();
        if weight == "meters" || weight == "metres" {
            WeightKind::Length
        } else if weight == "min" || weight.contains("minut") {
            WeightKind::Time
        } else {
            WeightKind::Other
        }
    }

    /// Finds the weight among the network cost columns
    pub(crate) fn weight_source(&self, network: &Network) -> Result<WeightSource, Error> {
        let kind = self.weight_kind();
        let column = network.cost_column_index(&self.weight).or_else(|| {
            (kind == WeightKind::Time)
                .then(|| network.cost_column_index(MINUTES))
                .flatten()
        });

        let source = match (kind, column) {
            (_, Some(column)) => WeightSource::Column(column),
            (WeightKind::Length, None) => WeightSource::Length,
            _ => return Err(Error::MissingWeight(self.weight.clone())),
        };

        match (self.connector, kind) {
            (Some(ConnectorCost::Kmh(_)), WeightKind::Time)
            | (Some(ConnectorCost::Multiplier(_)), WeightKind::Length)
            | (None, _) => Ok(source),
            (Some(connector), _) => Err(Error::InvalidRules(format!(
                "connector cost {connector:?} does not fit weight '{}'",
                self.weight
            ))),
        }
    }

    /// Per-edge weights indexed by edge index
    ///
    /// Missing and negative weights become impassable.
    pub(crate) fn edge_weights(&self, network: &Network) -> Result<Vec<f64>, Error> {
        let source = self.weight_source(network)?;
        let mut impassable = 0usize;

        let weights: Vec<f64> = network
            .graph
            .edge_weights()
            .map(|edge| {
                let weight = match source {
                    WeightSource::Length => edge.length,
                    WeightSource::Column(column) => edge.costs[column],
                };
                if weight.is_nan() || weight < 0.0 {
                    impassable += 1;
                    f64::INFINITY
                } else {
                    weight
                }
            })
            .collect();

        if !weights.is_empty() && impassable == weights.len() {
            return Err(Error::InvalidRules(format!(
                "weight '{}' has no usable values",
                self.weight
            )));
        }
        if impassable > 0 {
            warn!(
                "{impassable} edges have a missing or negative '{}' weight and are impassable",
                self.weight
            );
        }

        Ok(weights)
    }

    /// Cost of travelling `distance` between a query point and the network
    pub(crate) fn connector_cost(&self, distance: f64) -> f64 {
        match self.connector {
            None => 0.0,
            Some(ConnectorCost::Kmh(kmh)) => distance / 1000.0 / kmh * 60.0,
            Some(ConnectorCost::Multiplier(multiplier)) => distance * multiplier,
        }
    }
}
