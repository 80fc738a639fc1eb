//! File adapters around [`roadnet_core`]
//!
//! Line and point tables are read from CSV files with a WKT geometry column.
//! Query results are written as `GeoJSON` feature collections or CSV.

mod error;
mod export;
mod read;

pub use error::IoError;
pub use export::{ToGeoJson, write_geojson, write_od_csv};
pub use read::{read_lines_csv, read_points_csv};

pub use roadnet_core::prelude;
