use std::path::Path;

use csv::StringRecord;
use geo::{Geometry, Point};
use log::info;
use roadnet_core::model::{ColumnValues, LineFeatures, QueryPoint};
use wkt::TryFromWkt;

use crate::IoError;

/// CSV file held as raw string records
struct Table {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl Table {
    fn read(path: &Path) -> Result<Self, IoError> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();
        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self { headers, rows })
    }

    fn column_index(&self, name: &str) -> Result<usize, IoError> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| IoError::MissingColumn(name.to_string()))
    }

    fn cells(&self, column: usize) -> impl Iterator<Item = &str> + Clone {
        self.rows
            .iter()
            .map(move |row| row.get(column).unwrap_or_default().trim())
    }
}

/// Reads line features from a CSV file with a WKT geometry column
///
/// Every other column becomes an attribute column. Columns whose non-empty
/// cells all parse as numbers are numeric; empty cells are missing values.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the geometry column is
/// missing, or a geometry is not valid WKT.
pub fn read_lines_csv(path: impl AsRef<Path>, geometry_col: &str) -> Result<LineFeatures, IoError> {
    let path = path.as_ref();
    let table = Table::read(path)?;
    let geometry_index = table.column_index(geometry_col)?;

    let geometries = table
        .cells(geometry_index)
        .enumerate()
        .map(|(row, cell)| {
            Geometry::<f64>::try_from_wkt_str(cell).map_err(|e| IoError::Wkt {
                row,
                message: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut features = LineFeatures::new(geometries);
    for (index, name) in table.headers.iter().enumerate() {
        if index != geometry_index {
            features.push_column(name.to_string(), column_values(table.cells(index)))?;
        }
    }

    info!(
        "Read {} line features with {} attribute columns from {}",
        features.len(),
        features.columns().len(),
        path.display()
    );
    Ok(features)
}

/// Reads query points from a CSV file with a WKT point column
///
/// Without `id_col` points are numbered by row.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a column is missing, a
/// geometry is not a WKT point, or an id is not a non-negative integer.
pub fn read_points_csv(
    path: impl AsRef<Path>,
    geometry_col: &str,
    id_col: Option<&str>,
) -> Result<Vec<QueryPoint>, IoError> {
    let path = path.as_ref();
    let table = Table::read(path)?;
    let geometry_index = table.column_index(geometry_col)?;
    let id_index = id_col.map(|name| table.column_index(name)).transpose()?;

    let points = table
        .cells(geometry_index)
        .enumerate()
        .map(|(row, cell)| {
            let geometry = Point::<f64>::try_from_wkt_str(cell).map_err(|e| IoError::Wkt {
                row,
                message: e.to_string(),
            })?;
            let id = match id_index {
                Some(column) => {
                    let value = table.rows[row].get(column).unwrap_or_default().trim();
                    value.parse().map_err(|_| IoError::InvalidId {
                        row,
                        value: value.to_string(),
                    })?
                }
                None => row,
            };
            Ok(QueryPoint::new(id, geometry))
        })
        .collect::<Result<Vec<_>, IoError>>()?;

    info!("Read {} points from {}", points.len(), path.display());
    Ok(points)
}

fn column_values<'a>(cells: impl Iterator<Item = &'a str> + Clone) -> ColumnValues {
    let numeric = cells
        .clone()
        .filter(|cell| !cell.is_empty())
        .all(|cell| cell.parse::<f64>().is_ok());

    if numeric {
        ColumnValues::Numeric(
            cells
                .map(|cell| cell.parse::<f64>().ok())
                .collect(),
        )
    } else {
        ColumnValues::Text(
            cells
                .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                .collect(),
        )
    }
}
