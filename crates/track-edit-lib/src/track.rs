//! Track storage module
//!
//! This module provides the [`Track`] struct: the ordered point sequence of a recorded track,
//! its field schema and the low-level insert/delete primitives every higher edit builds on.
//! Only the first `len()` stored points are meaningful; [`Track::crop_to`] shortens the track
//! without releasing the points behind the new end.

use crate::projection::ProjectionCache;
use crate::segment::{self, Direction};
use crate::{
    AltitudeFormat, CacheState, ChangeListener, Config, Field, FieldList, Point, PointId,
    Projection, Result, Scaled, TrackError, ValueRange,
};
use geo::Rect;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// A recorded track: track points and waypoints in display order
pub struct Track {
    /// Stored points; only `[0, count)` is meaningful
    pub(crate) points: Vec<Point>,
    /// Number of meaningful points
    pub(crate) count: usize,
    schema: FieldList,
    /// Carried unchanged for writing the track back out
    metadata: Option<gpx::Metadata>,
    pub(crate) config: Config,
    projection: Arc<dyn Projection>,
    cache: ProjectionCache,
    listener: Option<Arc<dyn ChangeListener>>,
}

impl Default for Track {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Track")
            .field("count", &self.count)
            .field("schema", &self.schema)
            .field("config", &self.config)
            .field("cache", &self.cache.state())
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Track {
    /// Create an empty track
    pub fn new(config: Config) -> Self {
        Self {
            points: Vec::new(),
            count: 0,
            schema: FieldList::default(),
            metadata: None,
            projection: Arc::new(config.projection),
            config,
            cache: ProjectionCache::default(),
            listener: None,
        }
    }

    /// Create an empty track reporting its changes to `listener`
    pub fn with_listener(config: Config, listener: Arc<dyn ChangeListener>) -> Self {
        let mut track = Self::new(config);
        track.listener = Some(listener);
        track
    }

    /// Replace the change listener
    pub fn set_listener(&mut self, listener: Option<Arc<dyn ChangeListener>>) {
        self.listener = listener;
    }

    /// Use a custom projection for the display coordinates
    pub fn set_projection(&mut self, projection: Arc<dyn Projection>) {
        self.projection = projection;
        self.cache.invalidate();
    }

    // ------------------------------------------------------------------
    // Mutation plumbing
    // ------------------------------------------------------------------

    /// Meaningful points
    #[inline]
    pub(crate) fn live(&self) -> &[Point] {
        &self.points[..self.count]
    }

    #[inline]
    pub(crate) fn live_mut(&mut self) -> &mut [Point] {
        &mut self.points[..self.count]
    }

    /// Drop stored points past the meaningful end before resizing the sequence
    #[inline]
    fn discard_cropped(&mut self) {
        self.points.truncate(self.count);
    }

    /// Tell the listener about a change that leaves the geometry untouched
    #[inline]
    pub(crate) fn notify(&self) {
        if let Some(listener) = &self.listener {
            listener.data_changed();
        }
    }

    /// Invalidate the derived geometry and notify
    #[inline]
    pub(crate) fn changed(&mut self) {
        self.cache.invalidate();
        self.notify();
    }

    /// Insert points without notifying; `index` must be at most `count`
    pub(crate) fn splice_in(&mut self, points: Vec<Point>, index: usize) {
        self.discard_cropped();
        self.points.splice(index..index, points);
        self.count = self.points.len();
    }

    #[inline]
    pub(crate) fn check_index(&self, index: usize) -> Result<()> {
        if index < self.count {
            Ok(())
        } else {
            Err(TrackError::IndexOutOfBounds {
                index,
                len: self.count,
            })
        }
    }

    // ------------------------------------------------------------------
    // Bulk loading and replacement
    // ------------------------------------------------------------------

    /// Replace schema and points with freshly parsed rows
    ///
    /// Rows whose coordinates do not parse are discarded. The first track point is made a
    /// segment start. Previous points, schema and metadata are dropped; an empty schema leaves
    /// an empty track.
    pub fn load<I, R, S>(&mut self, schema: FieldList, rows: I, altitude_format: AltitudeFormat)
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        #[cfg(feature = "profiling")]
        profiling::scope!("track::load");

        self.metadata = None;
        if schema.is_empty() {
            self.points.clear();
            self.count = 0;
            self.schema = schema;
            self.changed();
            return;
        }

        let mut discarded = 0usize;
        let points: Vec<Point> = rows
            .into_iter()
            .map(|row| Point::from_row(row.as_ref(), &schema, altitude_format))
            .filter(|point| {
                let valid = point.is_valid();
                discarded += usize::from(!valid);
                valid
            })
            .collect();
        if discarded > 0 {
            tracing::warn!("Discarded {} rows without valid coordinates", discarded);
        }

        self.schema = schema;
        self.count = points.len();
        self.points = points;
        segment::force_segment_start(&mut self.points, 0);
        tracing::debug!("Loaded {} points", self.count);
        self.changed();
    }

    /// Take over the contents of another, already loaded track
    pub fn load_track(&mut self, other: Track) {
        self.points = other.points;
        self.count = other.count;
        self.schema = other.schema;
        self.metadata = other.metadata;
        self.changed();
    }

    /// Append another track's points and merge its schema into this one
    pub fn combine(&mut self, mut other: Track) {
        self.schema = self.schema.merge(&other.schema);
        other.discard_cropped();
        self.discard_cropped();
        self.points.append(&mut other.points);
        self.count = self.points.len();
        self.changed();
    }

    /// Replace all points, keeping the schema
    pub fn replace_contents(&mut self, points: Vec<Point>) {
        self.count = points.len();
        self.points = points;
        segment::force_segment_start(self.live_mut(), 0);
        self.changed();
    }

    /// Shorten the track to `len` points without releasing the points behind it
    pub fn crop_to(&mut self, len: usize) -> Result<()> {
        if len >= self.count {
            return Err(TrackError::IndexOutOfBounds {
                index: len,
                len: self.count,
            });
        }
        self.count = len;
        self.changed();
        Ok(())
    }

    /// Add the given fields to the schema
    pub fn extend_field_list(&mut self, fields: &FieldList) {
        self.schema = self.schema.merge(fields);
    }

    // ------------------------------------------------------------------
    // Insertion and deletion primitives
    // ------------------------------------------------------------------

    /// Insert a block of points before `index` (`index == len()` appends)
    ///
    /// The first track point of the result is always a segment start.
    pub fn insert_range(&mut self, points: Vec<Point>, index: usize) -> Result<()> {
        if index > self.count {
            return Err(TrackError::IndexOutOfBounds {
                index,
                len: self.count,
            });
        }
        let inserted = points.len();
        self.splice_in(points, index);
        segment::force_segment_start(self.live_mut(), 0);
        tracing::debug!("Inserted {} points at {}", inserted, index);
        self.changed();
        Ok(())
    }

    /// Insert a single point before `index`
    pub fn insert_point(&mut self, point: Point, index: usize) -> Result<()> {
        self.insert_range(vec![point], index)
    }

    /// Append points to the end of the track; nothing happens for an empty list
    pub fn append_points(&mut self, points: Vec<Point>) {
        if points.is_empty() {
            return;
        }
        let end = self.count;
        self.splice_in(points, end);
        segment::force_segment_start(self.live_mut(), 0);
        self.changed();
    }

    /// Delete the points `start..=end`
    ///
    /// If any deleted point started a segment, the next remaining track point starts one, so
    /// the break stays visible.
    pub fn delete_range(&mut self, start: usize, end: usize) -> Result<()> {
        if end < start || end >= self.count {
            return Err(TrackError::InvalidRange {
                start,
                end,
                len: self.count,
            });
        }
        let had_segment_start = self.live()[start..=end]
            .iter()
            .any(Point::segment_start);
        if had_segment_start {
            segment::force_segment_start(self.live_mut(), end + 1);
        }
        self.discard_cropped();
        self.points.drain(start..=end);
        self.count = self.points.len();
        tracing::debug!("Deleted points {}..={}", start, end);
        self.changed();
        Ok(())
    }

    /// Delete a single point
    pub fn delete_point(&mut self, index: usize) -> Result<()> {
        self.delete_range(index, index)
    }

    /// Remove every point marked for deletion, returning how many were removed
    ///
    /// A removed segment start is carried over to the next surviving track point.
    pub fn delete_marked_points(&mut self) -> usize {
        if !self.has_marked_points() {
            return 0;
        }
        self.discard_cropped();
        let before = self.points.len();
        let mut pending_break = false;
        self.points.retain_mut(|point| {
            if point.is_marked_for_deletion() {
                pending_break |= point.segment_start();
                return false;
            }
            if pending_break && point.is_track_point() {
                point.set_segment_start(true);
                pending_break = false;
            }
            true
        });
        self.count = self.points.len();
        let deleted = before - self.count;
        tracing::debug!("Deleted {} marked points", deleted);
        self.changed();
        deleted
    }

    pub fn has_marked_points(&self) -> bool {
        self.live().iter().any(Point::is_marked_for_deletion)
    }

    /// Set or clear the deletion mark of one point
    pub fn mark_for_deletion(&mut self, index: usize, marked: bool) -> Result<()> {
        self.check_index(index)?;
        self.points[index].set_marked_for_deletion(marked);
        self.notify();
        Ok(())
    }

    pub fn clear_deletion_markers(&mut self) {
        for point in self.live_mut() {
            point.set_marked_for_deletion(false);
        }
        self.notify();
    }

    /// Set or clear the segment start flag of one point
    pub fn set_segment_start(&mut self, index: usize, segment_start: bool) -> Result<()> {
        self.check_index(index)?;
        self.points[index].set_segment_start(segment_start);
        self.notify();
        Ok(())
    }

    /// Apply field edits to one point, adding unseen fields to the schema
    ///
    /// Values a typed field cannot parse are skipped with a warning.
    pub fn edit_point(&mut self, index: usize, edits: &[(Field, String)]) -> Result<()> {
        self.check_index(index)?;
        if edits.is_empty() {
            return Err(TrackError::EmptyInput);
        }
        for (field, value) in edits {
            if !self.points[index].set_field_value(field, value) {
                tracing::warn!("Rejected value {:?} for field {} of point {}", value, field, index);
            }
            self.schema.extend(field.clone());
        }
        self.changed();
        Ok(())
    }

    /// Force a recomputation of the derived geometry on the next read
    pub fn request_rescale(&mut self) {
        self.cache.invalidate();
    }

    // ------------------------------------------------------------------
    // Copies for undo
    // ------------------------------------------------------------------

    /// Copy of the points `start..=end` (same identities), empty for an invalid range
    pub fn clone_range(&self, start: usize, end: usize) -> Vec<Point> {
        if end < start {
            return Vec::new();
        }
        self.live()
            .get(start..=end)
            .map(<[Point]>::to_vec)
            .unwrap_or_default()
    }

    /// Copy of all points (same identities)
    pub fn clone_contents(&self) -> Vec<Point> {
        self.live().to_vec()
    }

    // ------------------------------------------------------------------
    // Information
    // ------------------------------------------------------------------

    /// Number of points in the track
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn point(&self, index: usize) -> Option<&Point> {
        self.live().get(index)
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        self.live()
    }

    #[inline]
    pub fn schema(&self) -> &FieldList {
        &self.schema
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn metadata(&self) -> Option<&gpx::Metadata> {
        self.metadata.as_ref()
    }

    pub fn set_metadata(&mut self, metadata: Option<gpx::Metadata>) {
        self.metadata = metadata;
    }

    /// Current position of a point, `None` if it is no longer in the track
    pub fn index_of(&self, id: PointId) -> Option<usize> {
        self.live().iter().position(|point| point.id() == id)
    }

    /// All waypoints, in track order
    pub fn waypoints(&self) -> impl Iterator<Item = &Point> + '_ {
        self.live().iter().filter(|point| point.is_waypoint())
    }

    /// True if any point has a value for the field
    pub fn has_data(&self, field: &Field) -> bool {
        match self.count {
            0 => false,
            n => self.has_data_in_range(field, 0, n - 1),
        }
    }

    /// True if any point in `start..=end` has a value for the field
    pub fn has_data_in_range(&self, field: &Field, start: usize, end: usize) -> bool {
        if end < start {
            return false;
        }
        let end = end.min(self.count.saturating_sub(1));
        self.live()
            .get(start..=end)
            .is_some_and(|points| points.iter().any(|p| p.field_value(field).is_some()))
    }

    pub fn has_altitude_data(&self) -> bool {
        self.live().iter().any(Point::has_altitude)
    }

    /// First and last index of the points inside `bounds` (x = longitude, y = latitude)
    pub fn range_indices_within(&self, bounds: Rect<f64>) -> Option<(usize, usize)> {
        let inside = |point: &Point| {
            let (lon, lat) = (point.longitude(), point.latitude());
            lon >= bounds.min().x && lon <= bounds.max().x && lat >= bounds.min().y && lat <= bounds.max().y
        };
        let first = self.live().iter().position(inside)?;
        let last = self.live().iter().rposition(inside)?;
        Some((first, last))
    }

    /// Index ranges of the drawn line segments, see [`Track::next_track_point`]
    pub fn segment_ranges(&self) -> Vec<Range<usize>> {
        segment::segment_ranges(self.live())
    }

    // ------------------------------------------------------------------
    // Track point search
    // ------------------------------------------------------------------

    /// Index of the first track point at or after `from`, ignoring waypoints
    pub fn next_track_point(&self, from: usize) -> Option<usize> {
        segment::next_track_point(self.live(), from, usize::MAX, Direction::Forward)
    }

    /// Index of the first track point scanning from `from` towards `limit` (inclusive)
    pub fn next_track_point_within(
        &self,
        from: usize,
        limit: usize,
        direction: Direction,
    ) -> Option<usize> {
        segment::next_track_point(self.live(), from, limit, direction)
    }

    /// Index of the last track point at or before `from`, ignoring waypoints
    pub fn previous_track_point(&self, from: usize) -> Option<usize> {
        segment::next_track_point(self.live(), from, 0, Direction::Backward)
    }

    /// Shift the segment start flags in `start..=end` forward by one track point
    ///
    /// Used by range reversal and by undoing it.
    pub fn shift_segment_starts(&mut self, start: usize, end: usize) -> Result<()> {
        if end < start || end >= self.count {
            return Err(TrackError::InvalidRange {
                start,
                end,
                len: self.count,
            });
        }
        segment::shift_segment_starts(self.live_mut(), start, end);
        self.notify();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Derived geometry
    // ------------------------------------------------------------------

    /// Projected coordinates and ranges, recomputed first if stale
    pub fn scaled(&self) -> &Scaled {
        self.cache.get_or_scale(self.live(), self.projection.as_ref())
    }

    #[inline]
    pub fn cache_state(&self) -> CacheState {
        self.cache.state()
    }

    #[inline]
    pub fn x(&self, index: usize) -> Option<f64> {
        self.scaled().x(index)
    }

    #[inline]
    pub fn y(&self, index: usize) -> Option<f64> {
        self.scaled().y(index)
    }

    #[inline]
    pub fn x_range(&self) -> ValueRange {
        self.scaled().x_range()
    }

    #[inline]
    pub fn y_range(&self) -> ValueRange {
        self.scaled().y_range()
    }

    #[inline]
    pub fn latitude_range(&self) -> ValueRange {
        self.scaled().latitude_range()
    }

    #[inline]
    pub fn longitude_range(&self) -> ValueRange {
        self.scaled().longitude_range()
    }

    /// Altitude extent in metres
    #[inline]
    pub fn altitude_range(&self) -> ValueRange {
        self.scaled().altitude_range()
    }

    #[inline]
    pub fn projected_bounds(&self) -> Option<Rect<f64>> {
        self.scaled().projected_bounds()
    }

    #[inline]
    pub fn has_waypoints(&self) -> bool {
        self.scaled().has_waypoint()
    }

    #[inline]
    pub fn has_track_points(&self) -> bool {
        self.scaled().has_track_point()
    }
}
