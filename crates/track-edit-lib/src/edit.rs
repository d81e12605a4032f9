//! Range edits: reversal, cut-and-move, interpolation, averaging and waypoint reordering
//!
//! Every operation validates its arguments before touching anything. A refused operation
//! returns an error (or `false` for "nothing to do") and leaves the track and its listener
//! untouched; a successful one invalidates the derived geometry and notifies exactly once.

use crate::segment;
use crate::{Altitude, AltitudeFormat, Point, Result, Track, TrackError};

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Track {
    /// Reverse the order of the points `start..=end`
    ///
    /// Segment start flags inside the block are shifted so that breaks stay between the same
    /// pairs of points, then the first track point of the block and the first one after it
    /// are made segment starts.
    pub fn reverse_range(&mut self, start: usize, end: usize) -> Result<()> {
        if start >= end || end >= self.count {
            return Err(TrackError::InvalidRange {
                start,
                end,
                len: self.count,
            });
        }
        let points = self.live_mut();
        points[start..=end].reverse();
        segment::shift_segment_starts(points, start, end);
        segment::force_segment_start(points, start);
        segment::force_segment_start(points, end + 1);
        tracing::debug!("Reversed points {}..={}", start, end);
        self.changed();
        Ok(())
    }

    /// Move the points `section_start..=section_end` to just before the point at `move_to`
    ///
    /// A section starting at the very first point cannot be moved, nor can a section be
    /// moved into or directly behind itself. `move_to == len()` moves it to the end.
    pub fn cut_and_move_section(
        &mut self,
        section_start: usize,
        section_end: usize,
        move_to: usize,
    ) -> Result<()> {
        let valid = section_start > 0
            && section_end > section_start
            && section_end < self.count
            && move_to <= self.count
            && (move_to < section_start || move_to > section_end + 1);
        if !valid {
            return Err(TrackError::InvalidMove {
                start: section_start,
                end: section_end,
                target: move_to,
            });
        }
        let section_len = section_end - section_start + 1;
        let points = self.live_mut();
        if move_to < section_start {
            // Section slides back, the gap before it slides forward
            points[move_to..=section_end].rotate_right(section_len);
        } else {
            // Section slides forward, the gap after it slides back
            points[section_start..move_to].rotate_left(section_len);
        }
        segment::force_segment_start(points, 0);
        tracing::debug!(
            "Moved points {}..={} to before {}",
            section_start,
            section_end,
            move_to
        );
        self.changed();
        Ok(())
    }

    /// Insert `count` points evenly spaced between the point at `start` and the next one
    pub fn interpolate(&mut self, start: usize, count: usize) -> Result<()> {
        self.check_index(start)?;
        if count == 0 {
            return Err(TrackError::EmptyInput);
        }
        let (from, to) = match self.live().get(start..=start + 1) {
            Some([from, to]) => (from, to),
            _ => return Err(TrackError::NoFollowingPoint { index: start }),
        };
        let inserted = from.interpolate(to, count);
        self.splice_in(inserted, start + 1);
        tracing::debug!("Interpolated {} points after {}", count, start);
        self.changed();
        Ok(())
    }

    /// Insert the mean of the points `start..=end` after `end`
    ///
    /// Latitude and longitude are averaged as offsets from the first point. Altitude is
    /// averaged over the points that have one (zero if none), in the configured unit, and
    /// keeps its fractional part rather than being cut to a whole unit. The new point is a
    /// segment of its own: it and the next track point after the range start segments. The
    /// averaged points are kept.
    ///
    /// No correction is made for ranges crossing the antimeridian.
    pub fn average(&mut self, start: usize, end: usize) -> Result<()> {
        if end <= start || end >= self.count {
            return Err(TrackError::InvalidRange {
                start,
                end,
                len: self.count,
            });
        }
        let altitude_format: AltitudeFormat = self.config.altitude_format;
        let range = &self.live()[start..=end];
        let (first_latitude, first_longitude) = (range[0].latitude(), range[0].longitude());

        let mut latitude_diff = 0.0;
        let mut longitude_diff = 0.0;
        let mut altitude_total = 0.0;
        let mut altitude_count = 0usize;
        for point in range {
            latitude_diff += point.latitude() - first_latitude;
            longitude_diff += point.longitude() - first_longitude;
            if let Some(altitude) = point.altitude() {
                altitude_total += altitude.value_in(altitude_format);
                altitude_count += 1;
            }
        }
        let n = range.len() as f64;
        let mean_altitude = if altitude_count > 0 {
            altitude_total / altitude_count as f64
        } else {
            0.0
        };

        let mut mean = Point::new(
            first_latitude + latitude_diff / n,
            first_longitude + longitude_diff / n,
            Some(Altitude::new(mean_altitude, altitude_format)),
        );
        mean.set_segment_start(true);
        segment::force_segment_start(self.live_mut(), end + 1);
        self.splice_in(vec![mean], end + 1);
        tracing::debug!("Averaged points {}..={}", start, end);
        self.changed();
        Ok(())
    }

    /// Move all waypoints before (`at_start`) or after all other points, keeping order
    ///
    /// Returns false without changing anything if there are no waypoints, only waypoints, or
    /// the points are already arranged that way.
    pub fn collect_waypoints(&mut self, at_start: bool) -> bool {
        let mut waypoints = 0usize;
        let mut others = 0usize;
        let mut waypoint_after_other = false;
        let mut other_after_waypoint = false;
        for point in self.live() {
            if point.is_waypoint() {
                waypoints += 1;
                waypoint_after_other |= others > 0;
            } else {
                others += 1;
                other_after_waypoint |= waypoints > 0;
            }
        }
        let already_arranged = if at_start {
            !waypoint_after_other
        } else {
            !other_after_waypoint
        };
        if waypoints == 0 || others == 0 || already_arranged {
            return false;
        }

        // Stable sort on a boolean key is a stable partition
        if at_start {
            self.live_mut().sort_by_key(|point| !point.is_waypoint());
        } else {
            self.live_mut().sort_by_key(Point::is_waypoint);
        }
        tracing::debug!(
            "Collected {} waypoints at the {}",
            waypoints,
            if at_start { "start" } else { "end" }
        );
        self.changed();
        true
    }

    /// Place each waypoint directly after its nearest track point
    ///
    /// Nearness is measured on the projected coordinates. Non-waypoints keep their order;
    /// waypoints matched to the same point keep theirs. Returns false if there are no
    /// waypoints or nothing else.
    pub fn interleave_waypoints(&mut self) -> bool {
        let count = self.count;
        let waypoint_count = self.waypoints().count();
        if waypoint_count == 0 || waypoint_count == count {
            return false;
        }

        // followers[i] lists the waypoints to place after point i
        let mut followers: Vec<Vec<usize>> = vec![Vec::new(); count];
        {
            let points = self.live();
            let scaled = self.scaled();
            for (index, point) in points.iter().enumerate() {
                if !point.is_waypoint() {
                    continue;
                }
                let (Some(x), Some(y)) = (scaled.x(index), scaled.y(index)) else {
                    continue;
                };
                if let Some(nearest) = scaled.nearest(x, y, None, |i| points[i].is_waypoint()) {
                    followers[nearest].push(index);
                }
            }
        }

        let mut slots: Vec<Option<Point>> = self.points.drain(..count).map(Some).collect();
        let mut reordered = Vec::with_capacity(count);
        for index in 0..count {
            if slots[index].as_ref().is_some_and(|p| !p.is_waypoint()) {
                reordered.extend(slots[index].take());
            }
            for &waypoint in &followers[index] {
                reordered.extend(slots[waypoint].take());
            }
        }
        self.points.splice(0..0, reordered);
        tracing::debug!("Interleaved {} waypoints", waypoint_count);
        self.changed();
        true
    }

    /// Index of the point closest to the projected position `(x, y)`, by L1 distance
    ///
    /// The first of several equally close points wins. A positive `max_distance` limits how
    /// far away the match may be. No correction is made across the antimeridian.
    pub fn nearest_point(
        &self,
        x: f64,
        y: f64,
        max_distance: Option<f64>,
        track_points_only: bool,
    ) -> Option<usize> {
        let points = self.live();
        self.scaled().nearest(x, y, max_distance, |i| {
            track_points_only && points[i].is_waypoint()
        })
    }

    /// Shift the timestamps of the points `start..=end` by `seconds`
    ///
    /// Returns whether any point had a timestamp to shift.
    pub fn add_time_offset(&mut self, start: usize, end: usize, seconds: i64) -> Result<bool> {
        if start >= end || end >= self.count {
            return Err(TrackError::InvalidRange {
                start,
                end,
                len: self.count,
            });
        }
        let mut found = false;
        for point in &mut self.live_mut()[start..=end] {
            found |= point.add_time_offset(seconds);
        }
        if found {
            tracing::debug!("Shifted times of {}..={} by {}s", start, end, seconds);
            self.notify();
        }
        Ok(found)
    }

    /// Add an altitude offset to the points `start..=end`, rounding to `decimals` places
    ///
    /// Returns whether any point had an altitude to change.
    pub fn add_altitude_offset(
        &mut self,
        start: usize,
        end: usize,
        offset: f64,
        format: AltitudeFormat,
        decimals: u32,
    ) -> Result<bool> {
        if start >= end || end >= self.count {
            return Err(TrackError::InvalidRange {
                start,
                end,
                len: self.count,
            });
        }
        let mut found = false;
        for point in &mut self.live_mut()[start..=end] {
            found |= point.add_altitude_offset(offset, format, decimals);
        }
        if found {
            tracing::debug!("Shifted altitudes of {}..={} by {}", start, end, offset);
            self.changed();
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn create_test_track(n: usize) -> Track {
        let mut track = Track::default();
        track.append_points((0..n).map(|i| Point::new(i as f64, 0.0, None)).collect());
        track
    }

    fn latitudes(track: &Track) -> Vec<f64> {
        track.points().iter().map(Point::latitude).collect()
    }

    fn segment_flags(track: &Track) -> Vec<bool> {
        track.points().iter().map(Point::segment_start).collect()
    }

    fn counting_track(n: usize) -> (Track, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut track = create_test_track(n);
        track.set_listener(Some(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })));
        (track, calls)
    }

    #[test]
    fn test_reverse_range() {
        let mut track = create_test_track(5);
        track.reverse_range(0, 4).unwrap();
        assert_eq!(latitudes(&track), vec![4.0, 3.0, 2.0, 1.0, 0.0]);
        assert!(track.point(0).unwrap().segment_start());
    }

    #[test]
    fn test_reverse_inner_range_anchors_both_ends() {
        let mut track = create_test_track(6);
        track.reverse_range(1, 3).unwrap();
        assert_eq!(latitudes(&track), vec![0.0, 3.0, 2.0, 1.0, 4.0, 5.0]);
        assert_eq!(
            segment_flags(&track),
            vec![true, true, false, false, true, false]
        );
    }

    #[test]
    fn test_reverse_keeps_interior_break() {
        let mut track = create_test_track(4);
        // Break between points 1 and 2
        track.set_segment_start(2, true).unwrap();
        track.reverse_range(0, 3).unwrap();
        // Now 3,2,1,0 with the break between 2 and 1
        assert_eq!(latitudes(&track), vec![3.0, 2.0, 1.0, 0.0]);
        assert_eq!(segment_flags(&track), vec![true, false, true, false]);
    }

    #[test]
    fn test_reverse_rejects_bad_ranges() {
        let (mut track, calls) = counting_track(4);
        let before = track.clone_contents();
        assert!(track.reverse_range(2, 2).is_err());
        assert!(track.reverse_range(3, 1).is_err());
        assert!(track.reverse_range(1, 4).is_err());
        assert_eq!(track.points(), before.as_slice());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cut_and_move_backward() {
        let mut track = create_test_track(7);
        // Move 1..=2 to before point 5
        track.cut_and_move_section(1, 2, 5).unwrap();
        assert_eq!(latitudes(&track), vec![0.0, 3.0, 4.0, 1.0, 2.0, 5.0, 6.0]);
    }

    #[test]
    fn test_cut_and_move_forward() {
        let mut track = create_test_track(7);
        // Move 4..=5 to before point 1
        track.cut_and_move_section(4, 5, 1).unwrap();
        assert_eq!(latitudes(&track), vec![0.0, 4.0, 5.0, 1.0, 2.0, 3.0, 6.0]);
    }

    #[test]
    fn test_cut_and_move_to_edges() {
        let mut track = create_test_track(5);
        track.cut_and_move_section(1, 2, 5).unwrap();
        assert_eq!(latitudes(&track), vec![0.0, 3.0, 4.0, 1.0, 2.0]);

        let mut track = create_test_track(5);
        track.cut_and_move_section(3, 4, 0).unwrap();
        assert_eq!(latitudes(&track), vec![3.0, 4.0, 0.0, 1.0, 2.0]);
        assert!(track.point(0).unwrap().segment_start());
    }

    #[test]
    fn test_cut_and_move_rejections() {
        let (mut track, calls) = counting_track(6);
        let before = track.clone_contents();

        // Section at the very start
        assert!(track.cut_and_move_section(0, 2, 4).is_err());
        // Into itself or directly behind itself
        assert!(track.cut_and_move_section(1, 3, 2).is_err());
        assert!(track.cut_and_move_section(1, 3, 4).is_err());
        assert!(track.cut_and_move_section(1, 3, 1).is_err());
        // Degenerate or out of range
        assert!(track.cut_and_move_section(2, 2, 5).is_err());
        assert!(track.cut_and_move_section(2, 6, 0).is_err());
        assert!(track.cut_and_move_section(1, 2, 7).is_err());

        assert_eq!(track.points(), before.as_slice());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_interpolate() {
        let mut track = Track::default();
        track.append_points(vec![Point::new(0.0, 0.0, None), Point::new(10.0, 10.0, None)]);
        track.interpolate(0, 3).unwrap();

        assert_eq!(track.len(), 5);
        assert_eq!(latitudes(&track), vec![0.0, 2.5, 5.0, 7.5, 10.0]);
        let longitudes: Vec<f64> = track.points().iter().map(Point::longitude).collect();
        assert_eq!(longitudes, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
    }

    #[test]
    fn test_interpolate_rejections() {
        let (mut track, calls) = counting_track(2);
        assert_eq!(
            track.interpolate(1, 2),
            Err(TrackError::NoFollowingPoint { index: 1 })
        );
        assert_eq!(track.interpolate(0, 0), Err(TrackError::EmptyInput));
        assert!(track.interpolate(2, 1).is_err());
        assert_eq!(track.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_average() {
        let mut track = Track::default();
        track.append_points(vec![
            Point::new(10.0, 0.0, Some(Altitude::new(100.0, AltitudeFormat::Metres))),
            Point::new(20.0, 0.0, None),
            Point::new(30.0, 0.0, Some(Altitude::new(200.0, AltitudeFormat::Metres))),
            Point::new(40.0, 0.0, None),
        ]);
        track.average(0, 2).unwrap();

        assert_eq!(track.len(), 5);
        let mean = track.point(3).unwrap();
        assert_eq!(mean.latitude(), 20.0);
        assert_eq!(mean.longitude(), 0.0);
        assert_eq!(mean.altitude().map(Altitude::value), Some(150.0));
        assert!(mean.segment_start());
        assert!(track.point(4).unwrap().segment_start());
        // Averaged points stay
        assert_eq!(track.point(2).unwrap().latitude(), 30.0);
    }

    #[test]
    fn test_average_in_configured_unit() {
        let mut track = Track::new(Config::with_metric_units(false));
        track.append_points(vec![
            Point::new(0.0, 0.0, Some(Altitude::new(0.3048, AltitudeFormat::Metres))),
            Point::new(0.0, 0.0, Some(Altitude::new(3.0, AltitudeFormat::Feet))),
        ]);
        track.average(0, 1).unwrap();
        let altitude = track.point(2).unwrap().altitude().copied().unwrap();
        assert_eq!(altitude.format(), AltitudeFormat::Feet);
        assert!((altitude.value() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_altitude_keeps_fraction() {
        let mut track = Track::default();
        track.append_points(vec![
            Point::new(0.0, 0.0, Some(Altitude::new(100.0, AltitudeFormat::Metres))),
            Point::new(0.0, 0.0, Some(Altitude::new(101.0, AltitudeFormat::Metres))),
        ]);
        track.average(0, 1).unwrap();
        assert_eq!(track.point(2).unwrap().altitude().map(Altitude::value), Some(100.5));
    }

    #[test]
    fn test_average_without_altitudes() {
        let mut track = create_test_track(2);
        track.average(0, 1).unwrap();
        let altitude = track.point(2).unwrap().altitude().copied();
        assert_eq!(altitude, Some(Altitude::new(0.0, AltitudeFormat::Metres)));
        assert!(track.average(1, 1).is_err());
        assert!(track.average(1, 3).is_err());
    }

    #[test]
    fn test_collect_waypoints() {
        let mut track = create_test_track(3);
        track.insert_point(Point::waypoint(50.0, 0.0, "a"), 1).unwrap();
        track.append_points(vec![Point::waypoint(51.0, 0.0, "b")]);
        // 0, a, 1, 2, b

        assert!(track.collect_waypoints(true));
        assert_eq!(latitudes(&track), vec![50.0, 51.0, 0.0, 1.0, 2.0]);
        let order = track.clone_contents();
        assert!(!track.collect_waypoints(true));
        assert_eq!(track.points(), order.as_slice());

        assert!(track.collect_waypoints(false));
        assert_eq!(latitudes(&track), vec![0.0, 1.0, 2.0, 50.0, 51.0]);
        assert!(!track.collect_waypoints(false));
    }

    #[test]
    fn test_collect_waypoints_needs_mixed_data() {
        let mut track = create_test_track(3);
        assert!(!track.collect_waypoints(true));

        let mut only_waypoints = Track::default();
        only_waypoints.append_points(vec![Point::waypoint(0.0, 0.0, "a")]);
        assert!(!only_waypoints.collect_waypoints(false));
    }

    #[test]
    fn test_interleave_waypoints() {
        let mut track = create_test_track(4);
        track.append_points(vec![
            Point::waypoint(2.1, 0.0, "near two"),
            Point::waypoint(0.2, 0.0, "near zero"),
            Point::waypoint(2.2, 0.0, "also near two"),
        ]);

        assert!(track.interleave_waypoints());
        let names: Vec<&str> = track
            .points()
            .iter()
            .map(|p| p.waypoint_name().unwrap_or("-"))
            .collect();
        assert_eq!(
            names,
            vec!["-", "near zero", "-", "-", "near two", "also near two", "-"]
        );
    }

    #[test]
    fn test_interleave_needs_mixed_data() {
        let mut track = create_test_track(3);
        assert!(!track.interleave_waypoints());
    }

    #[test]
    fn test_nearest_point() {
        let mut track = Track::default();
        track.append_points(vec![
            Point::waypoint(0.0, 0.0, "origin"),
            Point::new(0.0, 0.001, None),
            Point::new(5.0, 5.0, None),
        ]);
        let (x, y) = (track.x(0).unwrap(), track.y(0).unwrap());

        assert_eq!(track.nearest_point(x, y, None, false), Some(0));
        assert_eq!(track.nearest_point(x, y, None, true), Some(1));
        assert_eq!(track.nearest_point(x, y, Some(1e-9), true), None);
        assert_eq!(track.nearest_point(x, y, Some(-1.0), true), Some(1));
        assert_eq!(Track::default().nearest_point(x, y, None, false), None);
    }

    #[test]
    fn test_time_offset() {
        let mut track = create_test_track(3);
        assert_eq!(track.add_time_offset(0, 2, 60), Ok(false));

        track
            .edit_point(1, &[(Field::Timestamp, "1000".to_string())])
            .unwrap();
        let (mut watched, calls) = (track, Arc::new(AtomicUsize::new(0)));
        let counter = calls.clone();
        watched.set_listener(Some(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })));
        let _ = watched.x_range();

        assert_eq!(watched.add_time_offset(0, 2, 60), Ok(true));
        assert_eq!(
            watched.point(1).unwrap().timestamp().map(Timestamp::unix_seconds),
            Some(1060)
        );
        // Times do not affect the geometry
        assert_eq!(watched.cache_state(), CacheState::Fresh);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(watched.add_time_offset(1, 1, 60).is_err());
    }

    #[test]
    fn test_altitude_offset() {
        let mut track = Track::default();
        track.append_points(vec![
            Point::new(0.0, 0.0, Some(Altitude::new(100.0, AltitudeFormat::Metres))),
            Point::new(1.0, 0.0, None),
        ]);
        assert_eq!(track.altitude_range().max(), Some(100.0));

        assert_eq!(
            track.add_altitude_offset(0, 1, 50.0, AltitudeFormat::Metres, 0),
            Ok(true)
        );
        assert_eq!(track.cache_state(), CacheState::Stale);
        assert_eq!(track.altitude_range().max(), Some(150.0));
        assert!(track
            .add_altitude_offset(0, 5, 1.0, AltitudeFormat::Metres, 0)
            .is_err());
    }
}
