pub use crate::{Error, LineId, PointId};

// Network construction
pub use crate::loading::{
    DirectionConfig, HoleFilling, IsolationPolicy, MINUTES, NetworkBuilder, TravelTime,
};
pub use crate::model::{
    Column, ColumnValues, DirectionClass, EdgeDirection, LineFeatures, Network, NetworkLine,
    QueryPoint, RoadEdge, RoadNode,
};

// Queries
pub use crate::analysis::{
    EdgeUsage, KRouteRow, NetworkAnalysis, OdCostMatrix, OdCostRow, OdOptions, PathRow,
    ServiceArea, ServiceAreaEdge, ServiceAreas, ShortestPaths,
};
pub use crate::resolver::{NodeResolver, Resolution, Snap, SnapTarget};
pub use crate::rules::{ConnectorCost, Rules};
