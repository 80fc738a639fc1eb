//! Geometry cleaning of raw line features

use geo::{Coord, Geometry, LineString};
use log::{info, warn};

use crate::{geometry::line_length, model::LineFeatures};

/// Where a working line came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum LineOrigin {
    /// Piece of an input feature carrying `share` of its length
    Feature { row: usize, share: f64 },
    /// Line added while closing a network hole
    Hole { fill_value: f64 },
}

/// Line string moving through the build phases
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WorkLine {
    pub(crate) origin: LineOrigin,
    pub(crate) geometry: LineString<f64>,
}

impl WorkLine {
    #[cfg(test)]
    pub(crate) fn feature(row: usize, geometry: LineString<f64>) -> Self {
        Self {
            origin: LineOrigin::Feature { row, share: 1.0 },
            geometry,
        }
    }

    pub(crate) fn hole(geometry: LineString<f64>, fill_value: f64) -> Self {
        Self {
            origin: LineOrigin::Hole { fill_value },
            geometry,
        }
    }

    pub(crate) fn source_row(&self) -> Option<usize> {
        match self.origin {
            LineOrigin::Feature { row, .. } => Some(row),
            LineOrigin::Hole { .. } => None,
        }
    }

    /// First and last coordinate
    ///
    /// Working lines always hold at least two coordinates.
    pub(crate) fn endpoints(&self) -> (Coord<f64>, Coord<f64>) {
        let coords = &self.geometry.0;
        (coords[0], coords[coords.len() - 1])
    }
}

#[derive(Debug, Default)]
struct CleaningStats {
    exploded: usize,
    degenerate: usize,
    rings: usize,
    not_lines: usize,
}

/// Turns raw features into simple open line strings
///
/// Multi-part features are split into their parts, each part carrying its
/// share of the feature length. Degenerate lines, closed rings and
/// non-linear geometries are dropped.
pub(crate) fn clean_lines(features: &LineFeatures) -> Vec<WorkLine> {
    let mut stats = CleaningStats::default();
    let mut lines = Vec::with_capacity(features.len());

    for (row, geometry) in features.geometries().iter().enumerate() {
        let parts: Vec<LineString<f64>> = match geometry {
            Geometry::LineString(line) => vec![line.clone()],
            Geometry::Line(line) => vec![LineString::from(*line)],
            Geometry::MultiLineString(multi) => {
                if multi.0.len() > 1 {
                    stats.exploded += 1;
                }
                multi.0.clone()
            }
            _ => {
                stats.not_lines += 1;
                continue;
            }
        };

        let parts: Vec<LineString<f64>> = parts
            .into_iter()
            .filter_map(|part| simplify_part(part, &mut stats))
            .collect();

        let total: f64 = parts.iter().map(line_length).sum();
        for part in parts {
            let share = if total > 0.0 {
                line_length(&part) / total
            } else {
                1.0
            };
            lines.push(WorkLine {
                origin: LineOrigin::Feature { row, share },
                geometry: part,
            });
        }
    }

    if stats.exploded > 0 {
        warn!(
            "{} multi-part features were split into single lines, \
            travel time columns are divided by part length",
            stats.exploded
        );
    }
    if stats.not_lines > 0 {
        warn!("Dropped {} features without line geometry", stats.not_lines);
    }
    if stats.degenerate + stats.rings > 0 {
        info!(
            "Dropped {} degenerate lines and {} closed rings",
            stats.degenerate, stats.rings
        );
    }

    lines
}

fn simplify_part(mut part: LineString<f64>, stats: &mut CleaningStats) -> Option<LineString<f64>> {
    part.0.dedup();
    if part.0.len() < 2 || line_length(&part) <= 0.0 {
        stats.degenerate += 1;
        return None;
    }
    if part.is_closed() {
        stats.rings += 1;
        return None;
    }
    Some(part)
}
