//! Small line-geometry helpers shared by network building and path assembly

use geo::{Coord, Euclidean, Length, LineString};

/// Hashable key of an exact coordinate
pub(crate) fn coord_key(coord: Coord<f64>) -> (u64, u64) {
    // `+ 0.0` folds -0.0 into 0.0
    ((coord.x + 0.0).to_bits(), (coord.y + 0.0).to_bits())
}

pub(crate) fn line_length(line: &LineString<f64>) -> f64 {
    Euclidean.length(line)
}

/// Direction from `from` to `to` in degrees, clockwise from north
pub(crate) fn bearing(from: Coord<f64>, to: Coord<f64>) -> f64 {
    (to.x - from.x).atan2(to.y - from.y).to_degrees()
}

/// Part of `line` between two fractions of its length
pub(crate) fn line_substring(line: &LineString<f64>, start: f64, end: f64) -> LineString<f64> {
    let start = start.clamp(0.0, 1.0);
    let end = end.clamp(start, 1.0);
    let total = line_length(line);
    if total <= 0.0 {
        return line.clone();
    }

    let (from, to) = (start * total, end * total);
    let mut coords: Vec<Coord<f64>> = Vec::new();
    let mut travelled = 0.0;

    for segment in line.lines() {
        let segment_length = segment.dx().hypot(segment.dy());
        if segment_length == 0.0 {
            continue;
        }
        let segment_end = travelled + segment_length;

        if segment_end >= from && travelled <= to {
            let at = |distance: f64| {
                let t = ((distance - travelled) / segment_length).clamp(0.0, 1.0);
                Coord {
                    x: segment.start.x + segment.dx() * t,
                    y: segment.start.y + segment.dy() * t,
                }
            };
            if coords.is_empty() {
                coords.push(at(from));
            }
            if segment_end <= to {
                push_coord(&mut coords, segment.end);
            } else {
                push_coord(&mut coords, at(to));
                break;
            }
        }
        travelled = segment_end;
    }

    if coords.len() == 1 {
        coords.push(coords[0]);
    }
    LineString::new(coords)
}

/// Appends `line` to `coords`, skipping a repeated joint coordinate
pub(crate) fn extend_coords(coords: &mut Vec<Coord<f64>>, line: &LineString<f64>) {
    for &coord in &line.0 {
        push_coord(coords, coord);
    }
}

fn push_coord(coords: &mut Vec<Coord<f64>>, coord: Coord<f64>) {
    if coords.last() != Some(&coord) {
        coords.push(coord);
    }
}
