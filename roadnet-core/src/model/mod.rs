//! Data model for road network analysis
//!
//! Contains the raw feature table, the built road network and query points.

pub mod features;
pub mod points;
pub mod streets;

pub use features::{Column, ColumnValues, LineFeatures};
pub use points::QueryPoint;
pub use streets::{DirectionClass, EdgeDirection, Network, NetworkLine, RoadEdge, RoadNode};
