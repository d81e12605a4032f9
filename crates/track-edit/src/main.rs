//! Track Edit - command-line front end for track-edit-lib
//!
//! Loads a GPX file, applies at most one range edit and logs a summary of the result.
//! Set `RUST_LOG=debug` to see every change notification.

mod settings;

use clap::Parser;
use settings::{Edit, Settings};
use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use track_edit_lib::{Track, TrackError, ValueRange};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Failed to open file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse GPX: {0}")]
    Gpx(#[from] gpx::errors::GpxError),

    #[error("Edit refused: {0}")]
    Track(#[from] TrackError),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::parse();
    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings) -> Result<(), CliError> {
    let file = File::open(&settings.input)?;
    let gpx_data = gpx::read(BufReader::new(file))?;

    let mut track = Track::from_gpx(&gpx_data, settings.config())?;
    track.set_listener(Some(Arc::new(|| tracing::debug!("Track changed"))));

    if let Some(edit) = &settings.edit {
        apply(&mut track, edit, settings)?;
    }
    summarize(&track);
    Ok(())
}

fn apply(track: &mut Track, edit: &Edit, settings: &Settings) -> Result<(), CliError> {
    match *edit {
        Edit::Reverse { start, end } => track.reverse_range(start, end)?,
        Edit::Delete { start, end } => track.delete_range(start, end)?,
        Edit::CutMove { start, end, to } => track.cut_and_move_section(start, end, to)?,
        Edit::Interpolate { index, count } => track.interpolate(index, count)?,
        Edit::Average { start, end } => track.average(start, end)?,
        Edit::CollectWaypoints { at_end } => {
            if !track.collect_waypoints(!at_end) {
                tracing::info!("Waypoints already collected, nothing to do");
            }
        }
        Edit::Interleave => {
            if !track.interleave_waypoints() {
                tracing::info!("Nothing to interleave");
            }
        }
        Edit::TimeOffset {
            start,
            end,
            seconds,
        } => {
            if !track.add_time_offset(start, end, seconds)? {
                tracing::warn!("No timestamps in {}..={}", start, end);
            }
        }
        Edit::AltitudeOffset {
            start,
            end,
            offset,
            decimals,
        } => {
            let format = settings.altitude_format();
            if !track.add_altitude_offset(start, end, offset, format, decimals)? {
                tracing::warn!("No altitudes in {}..={}", start, end);
            }
        }
    }
    Ok(())
}

fn describe(range: ValueRange) -> String {
    match (range.min(), range.max()) {
        (Some(min), Some(max)) => format!("{:.5} to {:.5}", min, max),
        _ => "none".to_string(),
    }
}

fn summarize(track: &Track) {
    let segments = track.segment_ranges();
    tracing::info!(
        "{} points, {} waypoints, {} segments",
        track.len(),
        track.waypoints().count(),
        segments.len()
    );
    for (i, segment) in segments.iter().enumerate() {
        tracing::info!("Segment {}: points {}..{}", i, segment.start, segment.end);
    }
    tracing::info!("Latitude: {}", describe(track.latitude_range()));
    tracing::info!("Longitude: {}", describe(track.longitude_range()));
    tracing::info!("Altitude (m): {}", describe(track.altitude_range()));
}
