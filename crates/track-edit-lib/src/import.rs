//! Conversion of parsed GPX documents into a [`Track`]
//!
//! Reading and parsing files is left to the `gpx` crate; this module only lays the parsed
//! waypoints and track points out as rows and loads them, so imported points go through the
//! same validation as any other load.

use crate::{AltitudeFormat, Config, Field, FieldList, Result, Track, TrackError};

/// Columns of the rows produced from GPX data
const COLUMNS: [Field; 6] = [
    Field::Latitude,
    Field::Longitude,
    Field::Altitude,
    Field::Timestamp,
    Field::WaypointName,
    Field::NewSegment,
];

fn waypoint_row(waypoint: &gpx::Waypoint, name: Option<&str>, segment_start: bool) -> Vec<String> {
    let position = waypoint.point();
    vec![
        position.y().to_string(),
        position.x().to_string(),
        waypoint.elevation.map(|e| e.to_string()).unwrap_or_default(),
        waypoint
            .time
            .as_ref()
            .and_then(|time| time.format().ok())
            .unwrap_or_default(),
        name.unwrap_or_default().to_string(),
        if segment_start { "1" } else { "" }.to_string(),
    ]
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Track {
    /// Build a track from GPX data
    ///
    /// Named waypoints come first, then the points of every track segment in document order,
    /// with the first point of each segment starting a segment. The document metadata is
    /// kept for writing the track back out.
    ///
    /// # Returns
    /// The loaded track, or [`TrackError::EmptyTrack`] if no point had valid coordinates
    pub fn from_gpx(gpx_data: &gpx::Gpx, config: Config) -> Result<Self> {
        #[cfg(feature = "profiling")]
        profiling::scope!("track::from_gpx");

        let mut rows = Vec::new();
        for waypoint in &gpx_data.waypoints {
            // An unnamed waypoint would otherwise load as a track point
            let name = waypoint.name.as_deref().filter(|n| !n.trim().is_empty());
            rows.push(waypoint_row(waypoint, Some(name.unwrap_or("Waypoint")), false));
        }
        for track in &gpx_data.tracks {
            for segment in &track.segments {
                for (i, point) in segment.points.iter().enumerate() {
                    rows.push(waypoint_row(point, None, i == 0));
                }
            }
        }

        let mut loaded = Track::new(config);
        loaded.load(FieldList::new(COLUMNS), rows, AltitudeFormat::Metres);
        if loaded.is_empty() {
            return Err(TrackError::EmptyTrack);
        }
        loaded.set_metadata(gpx_data.metadata.clone());
        tracing::info!(
            "Imported {} points ({} waypoints, {} segments)",
            loaded.len(),
            loaded.waypoints().count(),
            loaded.segment_ranges().len()
        );
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpx::{Gpx, Track as GpxTrack, TrackSegment, Waypoint};

    fn create_test_waypoint(lat: f64, lon: f64) -> Waypoint {
        Waypoint::new(geo::Point::new(lon, lat))
    }

    fn create_test_gpx() -> Gpx {
        let mut gpx = Gpx::default();

        let mut summit = create_test_waypoint(46.0, 7.5);
        summit.name = Some("Summit".to_string());
        summit.elevation = Some(3000.0);
        gpx.waypoints.push(summit);

        let mut track = GpxTrack::default();
        for segment_index in 0..2 {
            let mut segment = TrackSegment::default();
            for i in 0..3 {
                segment.points.push(create_test_waypoint(
                    45.0 + segment_index as f64 + i as f64 * 0.001,
                    7.0 + i as f64 * 0.001,
                ));
            }
            track.segments.push(segment);
        }
        gpx.tracks.push(track);
        gpx
    }

    #[test]
    fn test_from_gpx() {
        let track = Track::from_gpx(&create_test_gpx(), Config::default()).unwrap();

        assert_eq!(track.len(), 7);
        assert_eq!(track.waypoints().count(), 1);
        let summit = track.point(0).unwrap();
        assert_eq!(summit.waypoint_name(), Some("Summit"));
        assert_eq!(summit.altitude().map(|a| a.value()), Some(3000.0));

        assert_eq!(track.segment_ranges(), vec![1..4, 4..7]);
        assert!(track.point(1).unwrap().segment_start());
        assert!(!track.point(2).unwrap().segment_start());
        assert!(track.point(4).unwrap().segment_start());
        assert_eq!(track.schema().len(), COLUMNS.len());
    }

    #[test]
    fn test_from_gpx_keeps_metadata() {
        let mut gpx = create_test_gpx();
        let mut metadata = gpx::Metadata::default();
        metadata.name = Some("Morning ride".to_string());
        gpx.metadata = Some(metadata);

        let track = Track::from_gpx(&gpx, Config::default()).unwrap();
        assert_eq!(
            track.metadata().and_then(|m| m.name.as_deref()),
            Some("Morning ride")
        );
        assert!(Track::from_gpx(&create_test_gpx(), Config::default())
            .unwrap()
            .metadata()
            .is_none());
    }

    #[test]
    fn test_from_gpx_unnamed_waypoint_stays_waypoint() {
        let mut gpx = Gpx::default();
        gpx.waypoints.push(create_test_waypoint(1.0, 2.0));
        let track = Track::from_gpx(&gpx, Config::default()).unwrap();
        assert!(track.point(0).unwrap().is_waypoint());
        assert!(!track.has_track_points());
    }

    #[test]
    fn test_empty_gpx_fails() {
        let result = Track::from_gpx(&Gpx::default(), Config::default());
        assert_eq!(result.unwrap_err(), TrackError::EmptyTrack);
    }
}
