//! Segment start bookkeeping
//!
//! The drawn track line breaks before every track point flagged as a segment start. These
//! helpers scan for track points (skipping waypoints) and move or force the flags so that
//! breaks survive points being deleted, reversed or inserted around them.

use crate::Point;
use std::ops::Range;

/// Scan direction for track point searches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Index of the first track point found scanning from `from` towards `limit` (inclusive)
///
/// Waypoints and invalid points are skipped. Returns `None` when the scan reaches `limit`
/// or runs off either end of the data without finding one.
pub(crate) fn next_track_point(
    points: &[Point],
    from: usize,
    limit: usize,
    direction: Direction,
) -> Option<usize> {
    match direction {
        Direction::Forward => {
            let end = limit.min(points.len().checked_sub(1)?);
            (from..=end).find(|&i| points[i].is_track_point())
        }
        Direction::Backward => {
            if from >= points.len() {
                return None;
            }
            (limit..=from).rev().find(|&i| points[i].is_track_point())
        }
    }
}

/// Flag the first track point at or after `from` as a segment start
///
/// Returns the index of the flagged point, if any.
pub(crate) fn force_segment_start(points: &mut [Point], from: usize) -> Option<usize> {
    let index = next_track_point(points, from, usize::MAX, Direction::Forward)?;
    points[index].set_segment_start(true);
    Some(index)
}

/// Shift the segment start flags of the track points in `start..=end` forward by one
///
/// Each track point takes the flag of the previous track point in the range; the first one
/// receives `true`. Waypoints are skipped and keep their own flag.
pub(crate) fn shift_segment_starts(points: &mut [Point], start: usize, end: usize) {
    let end = match points.len().checked_sub(1) {
        Some(last) => end.min(last),
        None => return,
    };
    if start > end {
        return;
    }
    let mut carried = true;
    for point in points[start..=end]
        .iter_mut()
        .filter(|p| !p.is_waypoint())
    {
        let own = point.segment_start();
        point.set_segment_start(carried);
        carried = own;
    }
}

/// Index ranges of the drawn segments
///
/// A segment runs from a segment-start track point up to (not including) the next one.
/// Waypoints before the first segment start belong to no segment; waypoints inside a segment
/// are included in its range.
pub(crate) fn segment_ranges(points: &[Point]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut current: Option<usize> = None;
    let mut last_track_point = 0;
    for (index, point) in points.iter().enumerate() {
        if !point.is_track_point() {
            continue;
        }
        if point.segment_start() || current.is_none() {
            if let Some(start) = current {
                ranges.push(start..last_track_point + 1);
            }
            current = Some(index);
        }
        last_track_point = index;
    }
    if let Some(start) = current {
        ranges.push(start..last_track_point + 1);
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(pattern: &str) -> Vec<Point> {
        // 'S' = segment start, 't' = track point, 'w' = waypoint
        pattern
            .chars()
            .enumerate()
            .map(|(i, c)| match c {
                'w' => Point::waypoint(i as f64, 0.0, format!("wp{i}")),
                _ => {
                    let mut point = Point::new(i as f64, 0.0, None);
                    point.set_segment_start(c == 'S');
                    point
                }
            })
            .collect()
    }

    fn flags(points: &[Point]) -> String {
        points
            .iter()
            .map(|p| match (p.is_waypoint(), p.segment_start()) {
                (true, _) => 'w',
                (false, true) => 'S',
                (false, false) => 't',
            })
            .collect()
    }

    #[test]
    fn test_next_track_point_skips_waypoints() {
        let points = track("wwtSw");
        assert_eq!(next_track_point(&points, 0, usize::MAX, Direction::Forward), Some(2));
        assert_eq!(next_track_point(&points, 4, usize::MAX, Direction::Forward), None);
        assert_eq!(next_track_point(&points, 10, usize::MAX, Direction::Forward), None);
        assert_eq!(next_track_point(&points, 0, 1, Direction::Forward), None);
    }

    #[test]
    fn test_previous_track_point() {
        let points = track("tww");
        assert_eq!(next_track_point(&points, 2, 0, Direction::Backward), Some(0));
        assert_eq!(next_track_point(&points, 2, 1, Direction::Backward), None);
        assert_eq!(next_track_point(&points, 5, 0, Direction::Backward), None);
        assert_eq!(next_track_point(&[], 0, 0, Direction::Backward), None);
    }

    #[test]
    fn test_shift_segment_starts() {
        let mut points = track("ttStwt");
        shift_segment_starts(&mut points, 0, 5);
        assert_eq!(flags(&points), "SttSwt");

        let mut points = track("tSt");
        shift_segment_starts(&mut points, 1, 2);
        assert_eq!(flags(&points), "tSS");
    }

    #[test]
    fn test_shift_out_of_range_is_harmless() {
        let mut points = track("St");
        shift_segment_starts(&mut points, 5, 9);
        assert_eq!(flags(&points), "St");
        shift_segment_starts(&mut [], 0, 3);
    }

    #[test]
    fn test_force_segment_start() {
        let mut points = track("Stwt");
        assert_eq!(force_segment_start(&mut points, 2), Some(3));
        assert_eq!(flags(&points), "StwS");
        assert_eq!(force_segment_start(&mut points, 4), None);
    }

    #[test]
    fn test_segment_ranges() {
        let points = track("wStwtSt");
        assert_eq!(segment_ranges(&points), vec![1..5, 5..7]);
        assert!(segment_ranges(&track("ww")).is_empty());
        // A track whose first point lacks the flag still forms one segment
        assert_eq!(segment_ranges(&track("tt")), vec![0..2]);
    }
}
