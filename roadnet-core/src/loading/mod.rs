//! Network construction from raw line features
//!
//! The builder cleans geometries, optionally closes holes and cuts long
//! lines, emits directed edges and removes isolated parts before the graph
//! is assembled.

mod builder;
mod clean;
mod config;
mod cut;
mod directed;
mod holes;
mod isolation;
mod nodes;

pub use builder::NetworkBuilder;
pub use config::{DirectionConfig, HoleFilling, IsolationPolicy, MINUTES, TravelTime};
