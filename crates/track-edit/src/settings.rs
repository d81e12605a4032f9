use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use track_edit_lib::{AltitudeFormat, Config, ProjectionKind};

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Track Edit - Apply a range edit to a GPX track and report the result
pub struct Settings {
    /// GPX file to load
    #[clap(value_name = "FILE")]
    pub input: PathBuf,

    /// Work with altitudes in feet instead of metres
    #[clap(long, default_value = "false")]
    pub imperial: bool,

    /// Projection used for display coordinates and nearest-point searches
    #[clap(long, value_enum, default_value = "tile")]
    pub projection: ProjectionArg,

    /// Edit to apply; without one the track is only summarised
    #[clap(subcommand)]
    pub edit: Option<Edit>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionArg {
    Tile,
    WebMercator,
}

impl From<ProjectionArg> for ProjectionKind {
    fn from(arg: ProjectionArg) -> Self {
        match arg {
            ProjectionArg::Tile => ProjectionKind::Tile,
            ProjectionArg::WebMercator => ProjectionKind::WebMercator,
        }
    }
}

/// Range edits, all indices inclusive and zero-based
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Edit {
    /// Reverse the points START..=END
    Reverse { start: usize, end: usize },
    /// Delete the points START..=END
    Delete { start: usize, end: usize },
    /// Move the points START..=END to before the point at TO
    CutMove { start: usize, end: usize, to: usize },
    /// Insert COUNT points between INDEX and the next point
    Interpolate { index: usize, count: usize },
    /// Insert the mean of START..=END after END
    Average { start: usize, end: usize },
    /// Move every waypoint to the start (or end) of the track
    CollectWaypoints {
        #[clap(long)]
        at_end: bool,
    },
    /// Place each waypoint after its nearest track point
    Interleave,
    /// Shift the timestamps of START..=END by SECONDS
    TimeOffset {
        start: usize,
        end: usize,
        #[clap(allow_negative_numbers = true)]
        seconds: i64,
    },
    /// Add OFFSET to the altitudes of START..=END, in the working unit
    AltitudeOffset {
        start: usize,
        end: usize,
        #[clap(allow_negative_numbers = true)]
        offset: f64,
        /// Decimal places to round the result to
        #[clap(long, default_value = "1")]
        decimals: u32,
    },
}

impl Settings {
    /// Library configuration matching the command line
    pub fn config(&self) -> Config {
        Config {
            projection: self.projection.into(),
            ..Config::with_metric_units(!self.imperial)
        }
    }

    pub fn altitude_format(&self) -> AltitudeFormat {
        self.config().altitude_format
    }
}
