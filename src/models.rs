//! Core value types for the route pipeline.
//!
//! Everything here is transient: a route plan is recomputed whenever the
//! waypoints, start time or duration change, and none of the derived
//! entities (track points, weather samples, statistics) carry persistent
//! identity. Only the waypoint list and the final totals are handed back
//! to the storage layer.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A geographic coordinate (WGS84 degrees) with optional elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    /// Latitude in degrees, [-90, 90]
    pub lat: f64,
    /// Longitude in degrees, [-180, 180]
    pub lng: f64,
    /// Elevation in metres above sea level, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            elevation: None,
        }
    }

    pub fn with_elevation(lat: f64, lng: f64, elevation: f64) -> Self {
        Self {
            lat,
            lng,
            elevation: Some(elevation),
        }
    }

    /// Elevation, treating unknown as sea level.
    pub fn elevation_m(&self) -> f64 {
        self.elevation.unwrap_or(0.0)
    }

    /// Whether the coordinate lies within valid WGS84 bounds.
    pub fn in_bounds(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A sampled point within a single segment, as produced by the aggregator.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SegmentPoint {
    /// Latitude, rounded to 6 decimal places
    pub lat: f64,
    /// Longitude, rounded to 6 decimal places
    pub lng: f64,
    /// Elevation in metres, rounded to 2 decimal places (0.0 when the lookup failed)
    pub elevation: f64,
    /// Index of the point within its segment
    pub point_index: usize,
    /// Hours from the segment start to this point
    pub time_offset_hours: f64,
}

/// A point of the merged multi-segment track.
///
/// `global_index` is strictly increasing along the track and matches
/// traversal order; `time_offset_hours` is measured from the route start.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackPoint {
    pub lat: f64,
    pub lng: f64,
    pub elevation: f64,
    /// Which segment this point came from
    pub segment_index: usize,
    /// Position in the merged track
    pub global_index: usize,
    /// Hours from the route start
    pub time_offset_hours: f64,
    /// True for segment boundaries (the user's waypoints)
    pub is_main_point: bool,
}

/// One hourly weather reading from the forecast provider.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WeatherSample {
    /// Air temperature in °C
    pub temperature: f64,
    /// Precipitation in mm
    pub precipitation: f64,
    /// WMO weather code from the provider
    pub weathercode: i32,
    /// Wind speed in m/s
    pub windspeed: f64,
    /// Provider timestamp the reading applies to
    pub time: String,
}

/// A weather sample bound to a track point and a moment on the time axis.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WeatherTimelineEntry {
    /// Index of the track point the sample applies to. Segment-local when
    /// produced by the aggregator, rewritten to the global index when
    /// segments are stitched.
    pub point_index: usize,
    /// Segment the sample belongs to (assigned during stitching)
    pub segment_index: usize,
    pub lat: f64,
    pub lng: f64,
    /// Hours from the route start
    pub time_offset_hours: f64,
    /// Absolute expected arrival time at the point
    pub estimated_time: NaiveDateTime,
    pub weather: WeatherSample,
}

/// Cost breakdown for one pair of consecutive track points.
#[derive(Debug, Clone, Copy)]
pub struct SegmentStats {
    /// Horizontal distance in metres
    pub distance: f64,
    /// Metres climbed (≥ 0)
    pub climb: f64,
    /// Metres descended (≥ 0)
    pub descent: f64,
    /// distance × terrain multiplier × weather multiplier
    pub difficulty: f64,
    /// Inclination angle in degrees
    pub slope: f64,
    /// Stacked weather penalty, 1.0 when no weather data was available
    pub weather_multiplier: f64,
}

/// Aggregated statistics for one segment.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SegmentStatistics {
    /// Horizontal distance in metres (rounded to whole metres)
    pub total_distance: f64,
    /// Unitless difficulty score
    pub total_difficulty: f64,
    /// Total climb in metres
    pub total_climb: f64,
    /// Total descent in metres
    pub total_descent: f64,
    pub max_elevation: f64,
    pub min_elevation: f64,
    /// (climb / distance) × 100, one decimal place; 0.0 for zero distance
    pub avg_slope: f64,
    /// Hours the segment is expected to take
    pub estimated_duration_hours: f64,
}

/// Relative difficulty classification of a whole route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum DifficultyLabel {
    Easy,
    Moderate,
    Hard,
    Expert,
}

impl std::fmt::Display for DifficultyLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DifficultyLabel::Easy => "Easy",
            DifficultyLabel::Moderate => "Moderate",
            DifficultyLabel::Hard => "Hard",
            DifficultyLabel::Expert => "Expert",
        };
        f.write_str(s)
    }
}

/// Statistics for a stitched multi-segment route.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RouteStatistics {
    pub total_distance: f64,
    pub total_difficulty: f64,
    pub total_climb: f64,
    pub total_descent: f64,
    pub max_elevation: f64,
    pub min_elevation: f64,
    /// (climb / distance) × 100, one decimal place; 0.0 for zero distance
    pub avg_slope: f64,
    /// Sum of per-segment durations
    pub estimated_duration_hours: f64,
    /// Relative difficulty label; absent when the 3D distance is zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_label: Option<DifficultyLabel>,
}

/// Round to `dp` decimal places. Track coordinates use 6, elevations 2,
/// slopes 1 — matching what the map client expects to render.
pub(crate) fn round_dp(v: f64, dp: u32) -> f64 {
    let factor = 10f64.powi(dp as i32);
    (v * factor).round() / factor
}
