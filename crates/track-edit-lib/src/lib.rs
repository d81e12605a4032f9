//! Track Edit Library - Editable GPS Track Model
//!
//! This library holds a recorded track as an ordered, mutable sequence of points and
//! provides the range edits an interactive editor needs: deletion, reversal, cut-and-move,
//! interpolation, averaging and waypoint reordering. Every edit keeps the "segment start"
//! flags consistent so that the line drawn through the track breaks where it should.
//!
//! Display geometry (projected x/y and the value ranges used by map and profile views) is
//! derived lazily and thrown away by every mutation, so readers never see stale values.
//!
//! # Architecture
//!
//! - **[`Point`]**: A single track point or waypoint with typed coordinates and free fields
//! - **[`FieldList`]**: Ordered, duplicate-free schema of the fields seen across loads
//! - **[`Track`]**: The point sequence itself, with bulk and range editing operations
//! - **[`Scaled`]**: Lazily computed projected coordinates and value ranges
//! - **[`ChangeListener`]**: Observer told about every successful mutation
//!
//! # Example
//!
//! ```rust
//! use track_edit_lib::{Point, Track};
//!
//! let mut track = Track::default();
//! track.append_points((0..5).map(|i| Point::new(f64::from(i), 7.0, None)).collect());
//! track.reverse_range(0, 4).unwrap();
//! assert_eq!(track.point(0).map(|p| p.latitude()), Some(4.0));
//! ```

mod config;
mod edit;
mod field;
mod import;
mod notify;
mod point;
mod projection;
mod segment;
mod track;
pub mod utils;

// Public API exports
pub use config::Config;
pub use field::{Field, FieldList};
pub use notify::ChangeListener;
pub use point::{Altitude, AltitudeFormat, Point, PointId, Timestamp};
pub use projection::{CacheState, Projection, ProjectionKind, Scaled, ValueRange};
pub use segment::Direction;
pub use track::Track;

/// Reasons a track operation was refused.
///
/// A refused operation leaves the track exactly as it was and sends no change notification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackError {
    #[error("Invalid range {start}..={end} for a track of {len} points")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("Index {index} out of bounds for a track of {len} points")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Cannot move section {start}..={end} to before point {target}")]
    InvalidMove {
        start: usize,
        end: usize,
        target: usize,
    },

    #[error("No point follows index {index}")]
    NoFollowingPoint { index: usize },

    #[error("Nothing to apply")]
    EmptyInput,

    #[error("Empty track")]
    EmptyTrack,
}

pub type Result<T> = std::result::Result<T, TrackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that all public types are accessible
        let _: fn(Config) -> Track = Track::new;
        let _: fn() -> Config = Config::default;
    }

    #[test]
    fn test_error_messages() {
        let err = TrackError::InvalidRange {
            start: 5,
            end: 2,
            len: 10,
        };
        assert_eq!(
            err.to_string(),
            "Invalid range 5..=2 for a track of 10 points"
        );
        assert_eq!(TrackError::EmptyTrack.to_string(), "Empty track");
    }
}
