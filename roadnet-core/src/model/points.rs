use geo::Point;

use crate::PointId;

/// Origin or destination of a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryPoint {
    pub id: PointId,
    pub geometry: Point<f64>,
}

impl QueryPoint {
    pub fn new(id: PointId, geometry: Point<f64>) -> Self {
        Self { id, geometry }
    }

    /// Numbers points by their position
    pub fn from_points(points: impl IntoIterator<Item = Point<f64>>) -> Vec<Self> {
        points
            .into_iter()
            .enumerate()
            .map(|(id, geometry)| Self { id, geometry })
            .collect()
    }
}
