//! Point storage: typed coordinates, altitude, timestamp and free field values
//!
//! A [`Point`] is either a track point (part of the recorded line) or a waypoint (a named
//! location). Identity is carried by [`PointId`], not by value: two points at the same
//! coordinates are still different points, and a clone is the same point.

use crate::{Field, FieldList};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Source of fresh point identities
static NEXT_POINT_ID: AtomicU64 = AtomicU64::new(1);

const METRES_PER_FOOT: f64 = 0.3048;

/// Stable identity of a point, used to find it again after structural edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointId(u64);

impl PointId {
    fn fresh() -> Self {
        PointId(NEXT_POINT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Unit an altitude value is expressed in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AltitudeFormat {
    #[default]
    Metres,
    Feet,
}

impl AltitudeFormat {
    #[inline]
    fn metres_per_unit(self) -> f64 {
        match self {
            AltitudeFormat::Metres => 1.0,
            AltitudeFormat::Feet => METRES_PER_FOOT,
        }
    }
}

/// Altitude value tagged with its unit
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Altitude {
    value: f64,
    format: AltitudeFormat,
}

impl Altitude {
    pub fn new(value: f64, format: AltitudeFormat) -> Self {
        Self { value, format }
    }

    /// Parse a decimal altitude, `None` if empty or not a finite number
    pub fn parse(text: &str, format: AltitudeFormat) -> Option<Self> {
        let value: f64 = text.trim().parse().ok()?;
        value.is_finite().then_some(Self { value, format })
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    pub fn format(&self) -> AltitudeFormat {
        self.format
    }

    /// Value converted to the requested unit
    #[inline]
    pub fn value_in(&self, format: AltitudeFormat) -> f64 {
        if format == self.format {
            self.value
        } else {
            self.value * self.format.metres_per_unit() / format.metres_per_unit()
        }
    }

    /// Add an offset given in `offset_format`, rounding the result to `decimals` places
    pub fn add_offset(&mut self, offset: f64, offset_format: AltitudeFormat, decimals: u32) {
        let offset = Altitude::new(offset, offset_format).value_in(self.format);
        let scale = 10f64.powi(decimals.min(15) as i32);
        self.value = ((self.value + offset) * scale).round() / scale;
    }
}

/// Point in time, UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Parse an RFC 3339 date-time or a count of seconds since the Unix epoch
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
            return Some(Timestamp(datetime.with_timezone(&Utc)));
        }
        let seconds: i64 = text.parse().ok()?;
        Self::from_unix_seconds(seconds)
    }

    pub fn from_unix_seconds(seconds: i64) -> Option<Self> {
        DateTime::from_timestamp(seconds, 0).map(Timestamp)
    }

    #[inline]
    pub fn datetime(&self) -> DateTime<Utc> {
        self.0
    }

    #[inline]
    pub fn unix_seconds(&self) -> i64 {
        self.0.timestamp()
    }

    /// Shift by a number of seconds, returns false (unchanged) on overflow
    pub fn add_offset(&mut self, seconds: i64) -> bool {
        match TimeDelta::try_seconds(seconds).and_then(|delta| self.0.checked_add_signed(delta)) {
            Some(shifted) => {
                self.0 = shifted;
                true
            }
            None => false,
        }
    }

    fn lerp(&self, other: &Timestamp, fraction: f64) -> Option<Timestamp> {
        let span = (other.0 - self.0).num_milliseconds() as f64;
        let delta = TimeDelta::try_milliseconds((span * fraction).round() as i64)?;
        self.0.checked_add_signed(delta).map(Timestamp)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339())
    }
}

/// A single track point or waypoint
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    id: PointId,
    latitude: f64,
    longitude: f64,
    altitude: Option<Altitude>,
    timestamp: Option<Timestamp>,
    /// Values of untyped fields (name, description, custom columns)
    values: HashMap<Field, String>,
    waypoint: bool,
    segment_start: bool,
    marked_for_deletion: bool,
    valid: bool,
}

impl Point {
    /// Create a valid track point (invalid if the coordinates are out of range)
    pub fn new(latitude: f64, longitude: f64, altitude: Option<Altitude>) -> Self {
        Self {
            id: PointId::fresh(),
            latitude,
            longitude,
            altitude,
            timestamp: None,
            values: HashMap::new(),
            waypoint: false,
            segment_start: false,
            marked_for_deletion: false,
            valid: latitude_in_range(latitude) && longitude_in_range(longitude),
        }
    }

    /// Create a named waypoint
    pub fn waypoint(latitude: f64, longitude: f64, name: impl Into<String>) -> Self {
        let mut point = Self::new(latitude, longitude, None);
        let name = name.into();
        point.waypoint = !name.trim().is_empty();
        point.values.insert(Field::WaypointName, name);
        point
    }

    /// Build a point from one raw row of string values laid out according to `schema`
    ///
    /// The point is valid when both latitude and longitude parse and are in range. It is a
    /// waypoint when it carries a non-empty waypoint name.
    pub fn from_row<S: AsRef<str>>(
        values: &[S],
        schema: &FieldList,
        altitude_format: AltitudeFormat,
    ) -> Self {
        let mut raw = HashMap::new();
        for (field, value) in schema.iter().zip(values) {
            let value = value.as_ref().trim();
            if !value.is_empty() {
                raw.insert(field.clone(), value.to_string());
            }
        }

        let latitude = raw
            .get(&Field::Latitude)
            .and_then(|s| parse_coordinate(s, 'N', 'S', 90.0));
        let longitude = raw
            .get(&Field::Longitude)
            .and_then(|s| parse_coordinate(s, 'E', 'W', 180.0));
        let altitude = raw
            .get(&Field::Altitude)
            .and_then(|s| Altitude::parse(s, altitude_format));
        let timestamp = raw.get(&Field::Timestamp).and_then(|s| Timestamp::parse(s));
        let segment_start = raw.get(&Field::NewSegment).is_some_and(|s| is_truthy(s));
        let waypoint = raw.contains_key(&Field::WaypointName);

        raw.retain(|field, _| !field.is_typed());

        Self {
            id: PointId::fresh(),
            latitude: latitude.unwrap_or_default(),
            longitude: longitude.unwrap_or_default(),
            altitude,
            timestamp,
            values: raw,
            waypoint,
            segment_start,
            marked_for_deletion: false,
            valid: latitude.is_some() && longitude.is_some(),
        }
    }

    #[inline]
    pub fn id(&self) -> PointId {
        self.id
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    #[inline]
    pub fn altitude(&self) -> Option<&Altitude> {
        self.altitude.as_ref()
    }

    #[inline]
    pub fn has_altitude(&self) -> bool {
        self.altitude.is_some()
    }

    #[inline]
    pub fn timestamp(&self) -> Option<&Timestamp> {
        self.timestamp.as_ref()
    }

    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[inline]
    pub fn is_waypoint(&self) -> bool {
        self.waypoint
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// A valid point which is not a waypoint
    #[inline]
    pub fn is_track_point(&self) -> bool {
        self.valid && !self.waypoint
    }

    #[inline]
    pub fn segment_start(&self) -> bool {
        self.segment_start
    }

    #[inline]
    pub fn set_segment_start(&mut self, segment_start: bool) {
        self.segment_start = segment_start;
    }

    #[inline]
    pub fn is_marked_for_deletion(&self) -> bool {
        self.marked_for_deletion
    }

    #[inline]
    pub fn set_marked_for_deletion(&mut self, marked: bool) {
        self.marked_for_deletion = marked;
    }

    pub fn waypoint_name(&self) -> Option<&str> {
        self.values.get(&Field::WaypointName).map(String::as_str)
    }

    /// Value of any field as text
    pub fn field_value(&self, field: &Field) -> Option<String> {
        match field {
            Field::Latitude => Some(self.latitude.to_string()),
            Field::Longitude => Some(self.longitude.to_string()),
            Field::Altitude => self.altitude.map(|a| a.value.to_string()),
            Field::Timestamp => self.timestamp.map(|t| t.to_string()),
            Field::NewSegment => self.segment_start.then(|| "1".to_string()),
            other => self.values.get(other).cloned(),
        }
    }

    /// Set a field from text
    ///
    /// Typed fields are re-parsed; an unparseable value is rejected and false returned. An
    /// empty value clears altitude, timestamp and free fields. The waypoint classification
    /// is fixed at creation and is not affected by name edits.
    pub fn set_field_value(&mut self, field: &Field, value: &str) -> bool {
        let trimmed = value.trim();
        match field {
            Field::Latitude => match parse_coordinate(trimmed, 'N', 'S', 90.0) {
                Some(latitude) => self.latitude = latitude,
                None => return false,
            },
            Field::Longitude => match parse_coordinate(trimmed, 'E', 'W', 180.0) {
                Some(longitude) => self.longitude = longitude,
                None => return false,
            },
            Field::Altitude if trimmed.is_empty() => self.altitude = None,
            Field::Altitude => {
                let format = self.altitude.map(|a| a.format).unwrap_or_default();
                match Altitude::parse(trimmed, format) {
                    Some(altitude) => self.altitude = Some(altitude),
                    None => return false,
                }
            }
            Field::Timestamp if trimmed.is_empty() => self.timestamp = None,
            Field::Timestamp => match Timestamp::parse(trimmed) {
                Some(timestamp) => self.timestamp = Some(timestamp),
                None => return false,
            },
            Field::NewSegment => self.segment_start = is_truthy(trimmed),
            other if trimmed.is_empty() => {
                self.values.remove(other);
            }
            other => {
                self.values.insert(other.clone(), trimmed.to_string());
            }
        }
        true
    }

    /// Apply an altitude offset, false if the point has no altitude
    pub(crate) fn add_altitude_offset(
        &mut self,
        offset: f64,
        format: AltitudeFormat,
        decimals: u32,
    ) -> bool {
        match self.altitude.as_mut() {
            Some(altitude) => {
                altitude.add_offset(offset, format, decimals);
                true
            }
            None => false,
        }
    }

    /// Apply a time offset in seconds, false if the point has no timestamp
    pub(crate) fn add_time_offset(&mut self, seconds: i64) -> bool {
        self.timestamp
            .as_mut()
            .is_some_and(|timestamp| timestamp.add_offset(seconds))
    }

    /// Create `count` new track points evenly spaced between this point and `other`
    ///
    /// Altitude and timestamp are interpolated only when both ends have one. The new points
    /// are never segment starts.
    pub fn interpolate(&self, other: &Point, count: usize) -> Vec<Point> {
        let steps = (count + 1) as f64;
        (1..=count)
            .map(|i| {
                let fraction = i as f64 / steps;
                let altitude = match (self.altitude, other.altitude) {
                    (Some(from), Some(to)) => {
                        let to = to.value_in(from.format);
                        Some(Altitude::new(
                            from.value + (to - from.value) * fraction,
                            from.format,
                        ))
                    }
                    _ => None,
                };
                let mut point = Point::new(
                    lerp(self.latitude, other.latitude, fraction),
                    lerp(self.longitude, other.longitude, fraction),
                    altitude,
                );
                if let (Some(from), Some(to)) = (self.timestamp, other.timestamp) {
                    point.timestamp = from.lerp(&to, fraction);
                }
                point
            })
            .collect()
    }
}

#[inline]
fn lerp(from: f64, to: f64, fraction: f64) -> f64 {
    from + (to - from) * fraction
}

#[inline]
fn latitude_in_range(latitude: f64) -> bool {
    latitude.is_finite() && latitude.abs() <= 90.0
}

#[inline]
fn longitude_in_range(longitude: f64) -> bool {
    longitude.is_finite() && longitude.abs() <= 180.0
}

fn is_truthy(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "y" | "yes"
    )
}

/// Parse decimal degrees with an optional hemisphere letter before or after the number
fn parse_coordinate(text: &str, positive: char, negative: char, limit: f64) -> Option<f64> {
    let text = text.trim();
    let mut sign = 1.0;
    let mut number = text;
    for hemisphere in [positive, negative] {
        let stripped = text
            .strip_prefix(|c: char| c.eq_ignore_ascii_case(&hemisphere))
            .or_else(|| text.strip_suffix(|c: char| c.eq_ignore_ascii_case(&hemisphere)));
        if let Some(rest) = stripped {
            number = rest.trim();
            if hemisphere == negative {
                sign = -1.0;
            }
            break;
        }
    }
    let value: f64 = number.parse().ok()?;
    let value = value * sign;
    (value.is_finite() && value.abs() <= limit).then_some(value)
}
