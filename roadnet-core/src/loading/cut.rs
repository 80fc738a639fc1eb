use super::clean::{LineOrigin, WorkLine};
use crate::geometry::{line_length, line_substring};

/// Splits lines longer than `max_length` into equal pieces
///
/// Each piece carries its share of the source feature so totals like travel
/// time can be divided between the pieces.
pub(crate) fn cut_lines(lines: Vec<WorkLine>, max_length: f64) -> Vec<WorkLine> {
    let mut pieces = Vec::with_capacity(lines.len());

    for line in lines {
        let length = line_length(&line.geometry);
        if length <= max_length {
            pieces.push(line);
            continue;
        }

        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let count = (length / max_length).ceil() as usize;
        #[allow(clippy::cast_precision_loss)]
        let step = 1.0 / count as f64;

        for i in 0..count {
            #[allow(clippy::cast_precision_loss)]
            let (start, end) = (i as f64 * step, (i + 1) as f64 * step);
            let end = if i + 1 == count { 1.0 } else { end };
            let origin = match line.origin {
                LineOrigin::Feature { row, share } => LineOrigin::Feature {
                    row,
                    share: share * step,
                },
                hole @ LineOrigin::Hole { .. } => hole,
            };
            pieces.push(WorkLine {
                origin,
                geometry: line_substring(&line.geometry, start, end),
            });
        }
    }

    pieces
}
