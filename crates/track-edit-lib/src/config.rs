//! Track configuration

use crate::{AltitudeFormat, ProjectionKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a track
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Unit used when new altitudes are computed, e.g. by averaging.
    /// Default: metres
    pub altitude_format: AltitudeFormat,
    /// Projection used for the display coordinates.
    /// Default: normalised tile space
    pub projection: ProjectionKind,
}

impl Config {
    /// Configuration for metric or imperial display units
    pub fn with_metric_units(metric: bool) -> Self {
        Self {
            altitude_format: if metric {
                AltitudeFormat::Metres
            } else {
                AltitudeFormat::Feet
            },
            ..Self::default()
        }
    }
}
