//! Emission of directed edges and their cost columns

use hashbrown::HashSet;
use itertools::Itertools;
use log::info;

use super::{
    clean::{LineOrigin, WorkLine},
    config::{DirectionConfig, MINUTES, TravelTime},
    nodes::NodeTable,
};
use crate::{
    Error,
    geometry::line_length,
    model::{ColumnValues, DirectionClass, EdgeDirection, LineFeatures},
};

/// Directed edge waiting to be added to the graph
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlannedEdge {
    /// Index into the working lines
    pub(crate) line: usize,
    pub(crate) direction: EdgeDirection,
    pub(crate) source: usize,
    pub(crate) target: usize,
    pub(crate) costs: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct EdgePlan {
    pub(crate) cost_columns: Vec<String>,
    pub(crate) edges: Vec<PlannedEdge>,
    /// Directions each working line ended up with, `None` if it has no edges
    pub(crate) classes: Vec<Option<DirectionClass>>,
}

/// Numeric feature column copied onto edges
struct CostColumn<'a> {
    values: &'a [Option<f64>],
    /// Column holds a total over the whole feature
    additive: bool,
}

/// Builds the edge list
///
/// Without a direction configuration every line becomes two edges with the
/// same costs.
///
/// # Errors
///
/// Returns an error if a configured column is missing or has the wrong type,
/// if a direction category is unknown, or if a travel time is negative and
/// negative values are not dropped.
pub(crate) fn plan_edges(
    features: &LineFeatures,
    lines: &[WorkLine],
    nodes: &NodeTable,
    config: Option<&DirectionConfig>,
) -> Result<EdgePlan, Error> {
    let travel_time = config.and_then(|config| config.travel_time.as_ref());
    let additive: HashSet<&str> = travel_time
        .map(TravelTime::additive_columns)
        .unwrap_or_default()
        .into_iter()
        .chain([MINUTES])
        .collect();

    let passthrough: Vec<(&str, CostColumn<'_>)> = features
        .numeric_columns()
        .filter(|(name, _)| travel_time.is_none() || *name != MINUTES)
        .map(|(name, values)| {
            (
                name,
                CostColumn {
                    values,
                    additive: additive.contains(name),
                },
            )
        })
        .collect();

    let minutes = travel_time
        .map(|travel_time| MinuteSource::new(features, travel_time))
        .transpose()?;
    let categories = config
        .map(|config| DirectionCategories::new(features, config))
        .transpose()?;
    let drop_negative = config.is_some_and(|config| config.drop_negative);

    let mut cost_columns: Vec<String> = passthrough
        .iter()
        .map(|(name, _)| (*name).to_string())
        .collect();
    if minutes.is_some() {
        cost_columns.push(MINUTES.to_string());
    }

    let mut plan = EdgePlan {
        cost_columns,
        edges: Vec::with_capacity(lines.len() * 2),
        classes: Vec::with_capacity(lines.len()),
    };
    let mut dropped_directions = 0usize;

    for (index, (line, &(source, target))) in lines.iter().zip(&nodes.endpoints).enumerate() {
        let class = match (line.origin, &categories) {
            (LineOrigin::Feature { row, .. }, Some(categories)) => categories.class(row)?,
            _ => DirectionClass::Both,
        };
        let length = line_length(&line.geometry);

        let mut emitted = Vec::with_capacity(2);
        for &direction in class.directions() {
            let mut costs: Vec<f64> = match line.origin {
                LineOrigin::Feature { row, share } => passthrough
                    .iter()
                    .map(|(_, column)| column.value(row, share))
                    .collect(),
                LineOrigin::Hole { fill_value } => vec![fill_value; passthrough.len()],
            };

            if let Some(minutes) = &minutes {
                let cost = match line.origin {
                    LineOrigin::Feature { row, share } => {
                        minutes.value(row, share, length, direction)
                    }
                    LineOrigin::Hole { fill_value } => fill_value,
                };
                if cost < 0.0 {
                    if drop_negative {
                        dropped_directions += 1;
                        continue;
                    }
                    return Err(Error::NegativeCost {
                        row: line.source_row().unwrap_or_default(),
                        cost,
                    });
                }
                costs.push(cost);
            }

            emitted.push(direction);
            let (from, to) = match direction {
                EdgeDirection::Forward => (source, target),
                EdgeDirection::Backward => (target, source),
            };
            plan.edges.push(PlannedEdge {
                line: index,
                direction,
                source: from,
                target: to,
                costs,
            });
        }

        plan.classes.push(match emitted.as_slice() {
            [_, _] => Some(DirectionClass::Both),
            [EdgeDirection::Forward] => Some(DirectionClass::Forward),
            [EdgeDirection::Backward] => Some(DirectionClass::Backward),
            _ => None,
        });
    }

    if dropped_directions > 0 {
        info!("Dropped {dropped_directions} directed edges with negative travel time");
    }

    Ok(plan)
}

impl CostColumn<'_> {
    fn value(&self, row: usize, share: f64) -> f64 {
        match self.values[row] {
            Some(value) if self.additive => value * share,
            Some(value) => value,
            None => f64::NAN,
        }
    }
}

/// Resolved travel time configuration
enum MinuteSource<'a> {
    Asymmetric {
        forward: &'a [Option<f64>],
        backward: &'a [Option<f64>],
    },
    Shared(&'a [Option<f64>]),
    FromSpeed(&'a [Option<f64>]),
    FlatSpeed(f64),
}

impl<'a> MinuteSource<'a> {
    fn new(features: &'a LineFeatures, travel_time: &TravelTime) -> Result<Self, Error> {
        Ok(match travel_time {
            TravelTime::Asymmetric { forward, backward } => MinuteSource::Asymmetric {
                forward: features.numeric(forward)?,
                backward: features.numeric(backward)?,
            },
            TravelTime::Shared(column) => MinuteSource::Shared(features.numeric(column)?),
            TravelTime::FromSpeed { speed_col } => {
                MinuteSource::FromSpeed(features.numeric(speed_col)?)
            }
            TravelTime::FlatSpeed(kmh) => {
                if !(kmh.is_finite() && *kmh > 0.0) {
                    return Err(Error::InvalidInput(format!(
                        "flat speed must be positive, got {kmh}"
                    )));
                }
                MinuteSource::FlatSpeed(*kmh)
            }
        })
    }

    /// Minutes for one direction of a line, NaN when unknown
    fn value(&self, row: usize, share: f64, length: f64, direction: EdgeDirection) -> f64 {
        let total = |values: &[Option<f64>]| values[row].map_or(f64::NAN, |value| value * share);
        let from_speed = |kmh: f64| {
            if kmh > 0.0 {
                length / 1000.0 / kmh * 60.0
            } else {
                f64::NAN
            }
        };

        match self {
            MinuteSource::Asymmetric { forward, .. } if direction == EdgeDirection::Forward => {
                total(forward)
            }
            MinuteSource::Asymmetric { backward, .. } => total(backward),
            MinuteSource::Shared(values) => total(values),
            MinuteSource::FromSpeed(speeds) => speeds[row].map_or(f64::NAN, from_speed),
            MinuteSource::FlatSpeed(kmh) => from_speed(*kmh),
        }
    }
}

/// Direction category of every feature row
struct DirectionCategories<'a> {
    column: &'a str,
    values: Vec<Option<String>>,
    both: &'a str,
    forward: &'a str,
    backward: &'a str,
}

impl<'a> DirectionCategories<'a> {
    fn new(features: &LineFeatures, config: &'a DirectionConfig) -> Result<Self, Error> {
        let (both, forward, backward) = &config.values_bft;
        if [both, forward, backward].iter().all_unique() {
            let column = features
                .column(&config.direction_col)
                .ok_or_else(|| Error::MissingColumn(config.direction_col.clone()))?;
            let values = match &column.values {
                ColumnValues::Text(values) => values.clone(),
                ColumnValues::Numeric(values) => values
                    .iter()
                    .map(|value| value.map(|value| value.to_string()))
                    .collect(),
            };

            Ok(Self {
                column: &config.direction_col,
                values,
                both,
                forward,
                backward,
            })
        } else {
            Err(Error::InvalidInput(format!(
                "direction values must be distinct, got {:?}",
                config.values_bft
            )))
        }
    }

    fn class(&self, row: usize) -> Result<DirectionClass, Error> {
        match self.values[row].as_deref() {
            Some(value) if value == self.both => Ok(DirectionClass::Both),
            Some(value) if value == self.forward => Ok(DirectionClass::Forward),
            Some(value) if value == self.backward => Ok(DirectionClass::Backward),
            value => Err(Error::UnknownDirection {
                column: self.column.to_string(),
                row,
                value: value.map(str::to_string),
            }),
        }
    }
}
