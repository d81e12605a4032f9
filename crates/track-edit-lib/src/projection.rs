//! Lazily derived display geometry
//!
//! Viewers need each point projected onto a plane plus the extent of the data along every
//! axis. Computing this is a full pass over the track, so it is done on first read and kept
//! until the next mutation. The cache is either stale (nothing computed) or fresh (holding a
//! [`Scaled`] built by [`Scaled::compute`]); no other state exists.

use crate::{AltitudeFormat, Point, utils};
use geo::{Coord, Rect};
use std::cell::OnceCell;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maps geographic coordinates onto the display plane
///
/// Both functions must be deterministic and monotonic.
pub trait Projection: Send + Sync {
    fn x(&self, longitude: f64) -> f64;
    fn y(&self, latitude: f64) -> f64;
}

/// Built-in projections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProjectionKind {
    /// Normalised map tile space, both axes in 0..1, y growing southwards
    #[default]
    Tile,
    /// EPSG:3857 meters, y growing northwards
    WebMercator,
}

impl Projection for ProjectionKind {
    #[inline]
    fn x(&self, longitude: f64) -> f64 {
        match self {
            ProjectionKind::Tile => utils::tile_x(longitude),
            ProjectionKind::WebMercator => utils::wgs84_to_mercator(0.0, longitude).x(),
        }
    }

    #[inline]
    fn y(&self, latitude: f64) -> f64 {
        match self {
            ProjectionKind::Tile => utils::tile_y(latitude),
            ProjectionKind::WebMercator => utils::wgs84_to_mercator(latitude, 0.0).y(),
        }
    }
}

/// Minimum and maximum of a set of values; empty until the first value is added
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValueRange {
    min: f64,
    max: f64,
}

impl Default for ValueRange {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl ValueRange {
    #[inline]
    pub fn add(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    #[inline]
    pub fn min(&self) -> Option<f64> {
        (!self.is_empty()).then_some(self.min)
    }

    #[inline]
    pub fn max(&self) -> Option<f64> {
        (!self.is_empty()).then_some(self.max)
    }

    /// Distance between min and max, zero when empty
    #[inline]
    pub fn span(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max - self.min
        }
    }

    #[inline]
    pub fn mid(&self) -> Option<f64> {
        (!self.is_empty()).then(|| (self.min + self.max) / 2.0)
    }
}

/// Whether the derived geometry is currently computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Stale,
    Fresh,
}

/// Projected coordinates and value ranges of the points `[0, count)` of a track
#[derive(Debug, Clone, Default)]
pub struct Scaled {
    xs: Vec<f64>,
    ys: Vec<f64>,
    x_range: ValueRange,
    y_range: ValueRange,
    latitude_range: ValueRange,
    longitude_range: ValueRange,
    /// Accumulated in metres
    altitude_range: ValueRange,
    has_waypoint: bool,
    has_track_point: bool,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Scaled {
    /// Scan the points once for value ranges, then project each one
    pub(crate) fn compute(points: &[Point], projection: &dyn Projection) -> Self {
        #[cfg(feature = "profiling")]
        profiling::scope!("scaled::compute");

        let mut scaled = Scaled::default();
        for point in points.iter().filter(|p| p.is_valid()) {
            scaled.longitude_range.add(point.longitude());
            scaled.latitude_range.add(point.latitude());
            if let Some(altitude) = point.altitude() {
                scaled
                    .altitude_range
                    .add(altitude.value_in(AltitudeFormat::Metres));
            }
            if point.is_waypoint() {
                scaled.has_waypoint = true;
            } else {
                scaled.has_track_point = true;
            }
        }

        scaled.xs.reserve_exact(points.len());
        scaled.ys.reserve_exact(points.len());
        for point in points {
            let x = projection.x(point.longitude());
            let y = projection.y(point.latitude());
            scaled.x_range.add(x);
            scaled.y_range.add(y);
            scaled.xs.push(x);
            scaled.ys.push(y);
        }

        tracing::trace!("Scaled {} points", points.len());
        scaled
    }

    #[inline]
    pub fn x(&self, index: usize) -> Option<f64> {
        self.xs.get(index).copied()
    }

    #[inline]
    pub fn y(&self, index: usize) -> Option<f64> {
        self.ys.get(index).copied()
    }

    #[inline]
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    #[inline]
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    #[inline]
    pub fn x_range(&self) -> ValueRange {
        self.x_range
    }

    #[inline]
    pub fn y_range(&self) -> ValueRange {
        self.y_range
    }

    #[inline]
    pub fn latitude_range(&self) -> ValueRange {
        self.latitude_range
    }

    #[inline]
    pub fn longitude_range(&self) -> ValueRange {
        self.longitude_range
    }

    /// Altitude extent in metres
    #[inline]
    pub fn altitude_range(&self) -> ValueRange {
        self.altitude_range
    }

    #[inline]
    pub fn has_waypoint(&self) -> bool {
        self.has_waypoint
    }

    #[inline]
    pub fn has_track_point(&self) -> bool {
        self.has_track_point
    }

    /// Bounding box of the projected points, `None` for an empty track
    pub fn projected_bounds(&self) -> Option<Rect<f64>> {
        Some(Rect::new(
            Coord {
                x: self.x_range.min()?,
                y: self.y_range.min()?,
            },
            Coord {
                x: self.x_range.max()?,
                y: self.y_range.max()?,
            },
        ))
    }

    /// Index of the point closest to `(x, y)` by L1 distance
    ///
    /// Ties go to the lowest index. With `max_distance` set to a positive value, a best match
    /// further away than that is reported as not found. `skip` filters out candidates.
    pub(crate) fn nearest(
        &self,
        x: f64,
        y: f64,
        max_distance: Option<f64>,
        mut skip: impl FnMut(usize) -> bool,
    ) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, (px, py)) in self.xs.iter().zip(&self.ys).enumerate() {
            if skip(index) {
                continue;
            }
            let distance = (px - x).abs() + (py - y).abs();
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((index, distance));
            }
        }
        let (index, distance) = best?;
        match max_distance {
            Some(max) if max > 0.0 && distance > max => None,
            _ => Some(index),
        }
    }
}

/// Holder of the derived geometry: empty means stale, filled means fresh
#[derive(Debug, Clone, Default)]
pub(crate) struct ProjectionCache {
    scaled: OnceCell<Scaled>,
}

impl ProjectionCache {
    /// Return the fresh geometry, computing it first if stale
    pub(crate) fn get_or_scale(&self, points: &[Point], projection: &dyn Projection) -> &Scaled {
        self.scaled
            .get_or_init(|| Scaled::compute(points, projection))
    }

    /// Drop the derived geometry so the next read recomputes it
    #[inline]
    pub(crate) fn invalidate(&mut self) {
        self.scaled.take();
    }

    #[inline]
    pub(crate) fn state(&self) -> CacheState {
        if self.scaled.get().is_some() {
            CacheState::Fresh
        } else {
            CacheState::Stale
        }
    }
}
