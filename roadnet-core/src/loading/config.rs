use serde::{Deserialize, Serialize};

/// Name of the travel time column produced by a directed build
pub const MINUTES: &str = "minutes";

/// Configuration of the directed network build
///
/// `values_bft` holds the category values meaning, in order, "both ways",
/// "forward only" (along the line geometry) and "backward only".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionConfig {
    pub direction_col: String,
    pub values_bft: (String, String, String),
    #[serde(default)]
    pub travel_time: Option<TravelTime>,
    /// Skip a direction whose travel time is negative instead of failing
    #[serde(default)]
    pub drop_negative: bool,
}

impl DirectionConfig {
    pub fn new(
        direction_col: impl Into<String>,
        values_bft: (impl Into<String>, impl Into<String>, impl Into<String>),
    ) -> Self {
        Self {
            direction_col: direction_col.into(),
            values_bft: (
                values_bft.0.into(),
                values_bft.1.into(),
                values_bft.2.into(),
            ),
            travel_time: None,
            drop_negative: false,
        }
    }

    /// Forward and backward travel time columns
    #[must_use]
    pub fn with_minute_cols(
        mut self,
        forward: impl Into<String>,
        backward: impl Into<String>,
    ) -> Self {
        self.travel_time = Some(TravelTime::Asymmetric {
            forward: forward.into(),
            backward: backward.into(),
        });
        self
    }

    #[must_use]
    pub fn with_travel_time(mut self, travel_time: TravelTime) -> Self {
        self.travel_time = Some(travel_time);
        self
    }

    #[must_use]
    pub fn dropping_negative(mut self) -> Self {
        self.drop_negative = true;
        self
    }
}

/// Source of the `minutes` column of a directed network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelTime {
    /// Separate columns for travel along and against the line geometry
    Asymmetric { forward: String, backward: String },
    /// One column used for both directions
    Shared(String),
    /// Speed column in km/h, minutes derived from length in metres
    FromSpeed { speed_col: String },
    /// Constant speed in km/h
    FlatSpeed(f64),
}

impl TravelTime {
    /// Columns whose values are totals over the whole line
    pub(crate) fn additive_columns(&self) -> Vec<&str> {
        match self {
            TravelTime::Asymmetric { forward, backward } => vec![forward.as_str(), backward.as_str()],
            TravelTime::Shared(column) => vec![column.as_str()],
            TravelTime::FromSpeed { .. } | TravelTime::FlatSpeed(_) => Vec::new(),
        }
    }
}

/// Which connected parts of the network survive the build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationPolicy {
    #[default]
    KeepAll,
    /// Largest weakly connected component
    LargestComponent,
    /// Largest set of nodes mutually reachable along edge directions
    StronglyConnected,
}

/// Gap filling between dead ends and nearby nodes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoleFilling {
    /// Connect dead ends to any node within `max_distance` whose direction
    /// deviates at most `max_angle` degrees from the dead-end line
    ToNodes {
        max_distance: f64,
        max_angle: f64,
        fill_value: f64,
    },
    /// Connect dead ends to the nearest other dead end
    ToDeadends { max_distance: f64, fill_value: f64 },
}
