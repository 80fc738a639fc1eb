use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry};
use roadnet_core::prelude::*;
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use wkt::ToWkt;

use crate::IoError;

/// Conversion of query results to a `GeoJSON` feature collection
pub trait ToGeoJson {
    /// # Errors
    ///
    /// Returns an error if a feature cannot be built from its JSON form
    fn to_geojson(&self) -> Result<FeatureCollection, IoError>;

    /// # Errors
    ///
    /// Returns an error if the collection cannot be built or serialized
    fn to_geojson_string(&self) -> Result<String, IoError> {
        serde_json::to_string(&self.to_geojson()?).map_err(|e| IoError::GeoJson(e.to_string()))
    }
}

fn feature(geometry: Option<Geometry>, properties: JsonValue) -> Result<Feature, IoError> {
    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": properties,
    });
    serde_json::from_value::<Feature>(value).map_err(|e| IoError::GeoJson(e.to_string()))
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    }
}

fn collect<T>(
    rows: &[T],
    to_feature: impl Fn(&T) -> Result<Feature, IoError>,
) -> Result<FeatureCollection, IoError> {
    rows.iter()
        .map(to_feature)
        .collect::<Result<Vec<_>, _>>()
        .map(collection)
}

impl ToGeoJson for OdCostMatrix {
    fn to_geojson(&self) -> Result<FeatureCollection, IoError> {
        collect(self.rows(), |row| {
            feature(
                row.geometry.as_ref().map(|line| Geometry::new(line.into())),
                json!({
                    "origin": row.origin,
                    "destination": row.destination,
                    "cost": row.cost,
                }),
            )
        })
    }
}

impl ToGeoJson for [PathRow] {
    fn to_geojson(&self) -> Result<FeatureCollection, IoError> {
        collect(self, |row| {
            feature(
                Some(Geometry::new((&row.geometry).into())),
                json!({
                    "origin": row.origin,
                    "destination": row.destination,
                    "cost": row.cost,
                }),
            )
        })
    }
}

impl ToGeoJson for [EdgeUsage] {
    fn to_geojson(&self) -> Result<FeatureCollection, IoError> {
        collect(self, |row| {
            feature(
                Some(Geometry::new((&row.geometry).into())),
                json!({
                    "source": row.source.index(),
                    "target": row.target.index(),
                    "line": row.line,
                    "n": row.n,
                    "frequency": row.frequency,
                }),
            )
        })
    }
}

impl ToGeoJson for ShortestPaths {
    fn to_geojson(&self) -> Result<FeatureCollection, IoError> {
        match self {
            ShortestPaths::Routes(rows) => rows.to_geojson(),
            ShortestPaths::Summary(rows) => rows.to_geojson(),
        }
    }
}

impl ToGeoJson for [KRouteRow] {
    fn to_geojson(&self) -> Result<FeatureCollection, IoError> {
        collect(self, |row| {
            feature(
                Some(Geometry::new((&row.geometry).into())),
                json!({
                    "origin": row.origin,
                    "destination": row.destination,
                    "k": row.k,
                    "cost": row.cost,
                }),
            )
        })
    }
}

impl ToGeoJson for [ServiceArea] {
    fn to_geojson(&self) -> Result<FeatureCollection, IoError> {
        collect(self, |area| {
            feature(
                Some(Geometry::new((&area.geometry).into())),
                json!({
                    "origin": area.origin,
                    "break": area.break_value,
                }),
            )
        })
    }
}

impl ToGeoJson for [ServiceAreaEdge] {
    fn to_geojson(&self) -> Result<FeatureCollection, IoError> {
        collect(self, |row| {
            feature(
                Some(Geometry::new((&row.geometry).into())),
                json!({
                    "origin": row.origin,
                    "break": row.break_value,
                    "source": row.source.index(),
                    "target": row.target.index(),
                    "line": row.line,
                    "cost": row.cost,
                }),
            )
        })
    }
}

impl ToGeoJson for ServiceAreas {
    fn to_geojson(&self) -> Result<FeatureCollection, IoError> {
        match self {
            ServiceAreas::Dissolved(areas) => areas.to_geojson(),
            ServiceAreas::Edges(edges) => edges.to_geojson(),
        }
    }
}

/// Writes a feature collection as a `GeoJSON` file
///
/// # Errors
///
/// Returns an error if serialization or writing fails
pub fn write_geojson(path: impl AsRef<Path>, collection: &FeatureCollection) -> Result<(), IoError> {
    let json = serde_json::to_string(collection).map_err(|e| IoError::GeoJson(e.to_string()))?;
    std::fs::write(path, json)?;
    Ok(())
}

#[derive(Serialize)]
struct OdRecord {
    origin: PointId,
    destination: PointId,
    cost: Option<f64>,
    /// Route as WKT, empty when not requested
    geometry: Option<String>,
}

/// Writes an OD cost matrix as CSV with a WKT geometry column
///
/// # Errors
///
/// Returns an error if the file cannot be written
pub fn write_od_csv(path: impl AsRef<Path>, matrix: &OdCostMatrix) -> Result<(), IoError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in matrix.rows() {
        writer.serialize(OdRecord {
            origin: row.origin,
            destination: row.destination,
            cost: row.cost,
            geometry: row.geometry.as_ref().map(|line| line.to_wkt().to_string()),
        })?;
    }
    writer.flush()?;
    Ok(())
}
