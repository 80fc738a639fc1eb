//! Road network analysis: build a routable graph from line features and
//! answer cost matrix, shortest path and service area queries over it.

pub mod analysis;
mod error;
mod geometry;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod resolver;
pub(crate) mod routing;
pub mod rules;

pub use analysis::NetworkAnalysis;
pub use error::Error;
pub use loading::NetworkBuilder;
pub use model::Network;
pub use rules::Rules;

/// Index of a cleaned network line
pub type LineId = usize;
/// Caller-assigned identifier of a query point
pub type PointId = usize;
