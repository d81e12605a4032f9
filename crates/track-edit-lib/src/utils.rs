//! Utility functions for projecting geographic coordinates onto a plane

use geo::Point;

/// Web Mercator bounds in meters (EPSG:3857)
pub const EARTH_MERCATOR_MAX: f64 = 20037508.34;
pub const EARTH_MERCATOR_MIN: f64 = -20037508.34;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Precomputed constant: EARTH_MERCATOR_MAX / 180.0
const LON_TO_X_FACTOR: f64 = EARTH_MERCATOR_MAX / 180.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / PI
const Y_FACTOR: f64 = EARTH_MERCATOR_MAX / std::f64::consts::PI;

/// Mercator northing of a latitude on the unit sphere, `ln(tan φ + sec φ)`
#[inline(always)]
fn mercator_northing(lat: f64) -> f64 {
    let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    (lat_rad.tan() + (1.0 / lat_rad.cos())).ln()
}

/// Convert WGS84 (lat, lon) to Web Mercator (x, y) in meters
///
/// # Arguments
/// * `lat` - Latitude in degrees (clamped to -85.05 to 85.05)
/// * `lon` - Longitude in degrees (-180 to 180)
///
/// # Returns
/// A `Point<f64>` with x (easting) and y (northing) in meters
#[inline(always)]
pub fn wgs84_to_mercator(lat: f64, lon: f64) -> Point<f64> {
    Point::new(lon * LON_TO_X_FACTOR, mercator_northing(lat) * Y_FACTOR)
}

/// Normalised tile-space x of a longitude: 0.0 at 180°W, 1.0 at 180°E
#[inline(always)]
pub fn tile_x(lon: f64) -> f64 {
    (lon + 180.0) / 360.0
}

/// Normalised tile-space y of a latitude: 0.0 at the northern Mercator limit, 1.0 at the southern
///
/// Grows southwards, like pixel rows on a map tile.
#[inline(always)]
pub fn tile_y(lat: f64) -> f64 {
    (1.0 - mercator_northing(lat) / std::f64::consts::PI) / 2.0
}
