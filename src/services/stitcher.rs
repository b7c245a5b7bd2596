//! Segment stitching.
//!
//! Joins per-segment aggregation results into one continuous track with
//! a single monotonic time axis, and resolves the persisted waypoint
//! encoding (a linked list of (this, next) coordinate pairs) back into
//! the ordered sequence the aggregator expects.

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{
    round_dp, Coordinate, RouteStatistics, TrackPoint, WeatherTimelineEntry,
};
use crate::services::aggregator::SegmentAggregate;
use crate::services::{difficulty, geo};

/// A merged multi-segment route ready for presentation.
#[derive(Debug, Clone)]
pub struct StitchedRoute {
    pub track: Vec<TrackPoint>,
    pub weather_timeline: Vec<WeatherTimelineEntry>,
    pub statistics: RouteStatistics,
    pub segments: usize,
}

/// Concatenate per-segment results into one track.
///
/// Consecutive segments share an endpoint: segment N's last point is
/// segment N+1's first, so every segment but the final one contributes
/// all points except its last. Weather entries keep their own point
/// mapping (an entry for a dropped shared endpoint lands on the next
/// segment's first point). Time offsets shift by the cumulative sum of
/// preceding segment durations.
pub fn combine_segments(
    segments: &[SegmentAggregate],
    start_time: NaiveDateTime,
    fallback_duration_hours: f64,
) -> StitchedRoute {
    let mut track: Vec<TrackPoint> = Vec::new();
    let mut weather_timeline: Vec<WeatherTimelineEntry> = Vec::new();

    let mut total_distance = 0.0;
    let mut total_difficulty = 0.0;
    let mut total_climb = 0.0;
    let mut total_descent = 0.0;
    let mut cumulative_offset_hours = 0.0;

    for (segment_index, segment) in segments.iter().enumerate() {
        let is_final = segment_index == segments.len() - 1;
        let keep = if is_final {
            segment.track.len()
        } else {
            segment.track.len().saturating_sub(1)
        };
        let base = track.len();

        for (i, point) in segment.track[..keep].iter().enumerate() {
            track.push(TrackPoint {
                lat: point.lat,
                lng: point.lng,
                elevation: point.elevation,
                segment_index,
                global_index: base + i,
                time_offset_hours: cumulative_offset_hours + point.time_offset_hours,
                is_main_point: i == 0 || i == segment.track.len() - 1,
            });
        }

        for entry in &segment.weather_timeline {
            let offset = cumulative_offset_hours + entry.time_offset_hours;
            weather_timeline.push(WeatherTimelineEntry {
                point_index: base + entry.point_index,
                segment_index,
                lat: entry.lat,
                lng: entry.lng,
                time_offset_hours: round_dp(offset, 1),
                estimated_time: start_time
                    + chrono::Duration::seconds((offset * 3600.0) as i64),
                weather: entry.weather.clone(),
            });
        }

        let segment_duration = segment.statistics.estimated_duration_hours;
        cumulative_offset_hours += if segment_duration > 0.0 {
            segment_duration
        } else {
            fallback_duration_hours
        };

        total_distance += segment.statistics.total_distance;
        total_difficulty += segment.statistics.total_difficulty;
        total_climb += segment.statistics.total_climb;
        total_descent += segment.statistics.total_descent;
    }

    // Construction order already matches traversal order; the sort makes
    // the "strictly increasing global index" invariant hold regardless.
    track.sort_by_key(|p| p.global_index);

    let (max_elevation, min_elevation) = if track.is_empty() {
        (0.0, 0.0)
    } else {
        (
            track.iter().map(|p| p.elevation).fold(f64::NEG_INFINITY, f64::max),
            track.iter().map(|p| p.elevation).fold(f64::INFINITY, f64::min),
        )
    };

    let merged_coords: Vec<Coordinate> = track
        .iter()
        .map(|p| Coordinate::with_elevation(p.lat, p.lng, p.elevation))
        .collect();
    let distance_3d = geo::track_distance_3d(&merged_coords);
    let difficulty_label = if distance_3d > 0.0 {
        Some(difficulty::classify_difficulty(total_difficulty, distance_3d))
    } else {
        None
    };

    let avg_slope = if total_distance > 0.0 {
        round_dp(total_climb / total_distance * 100.0, 1)
    } else {
        0.0
    };

    StitchedRoute {
        track,
        weather_timeline,
        statistics: RouteStatistics {
            total_distance: total_distance.round(),
            total_difficulty: total_difficulty.round(),
            total_climb: total_climb.round(),
            total_descent: total_descent.round(),
            max_elevation,
            min_elevation,
            avg_slope,
            estimated_duration_hours: cumulative_offset_hours,
            difficulty_label,
        },
        segments: segments.len(),
    }
}

/// A waypoint as the storage layer hands it back: coordinates plus a
/// pointer to the next waypoint's coordinates, both as `"lat,lng"`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct StoredWaypoint {
    /// Coordinates as "lat,lng"
    pub coords: String,
    /// Coordinates of the following waypoint, absent for the chain tail
    pub next: Option<String>,
}

/// Reconstruct the visiting order of a waypoint chain.
///
/// The start is the waypoint that is nobody's `next`; the chain is
/// followed from there. When no unambiguous start exists (cycle,
/// duplicate heads) or the chain does not cover every waypoint, falls
/// back to storage order with a warning.
pub fn resolve_waypoint_chain(dots: &[StoredWaypoint]) -> Result<Vec<Coordinate>, AppError> {
    let parsed: Vec<Coordinate> = dots
        .iter()
        .map(|d| parse_coords(&d.coords))
        .collect::<Result<_, _>>()?;

    if dots.len() < 2 {
        return Ok(parsed);
    }

    let referenced: std::collections::HashSet<&str> = dots
        .iter()
        .filter_map(|d| d.next.as_deref())
        .map(str::trim)
        .collect();

    let heads: Vec<usize> = dots
        .iter()
        .enumerate()
        .filter(|(_, d)| !referenced.contains(d.coords.trim()))
        .map(|(i, _)| i)
        .collect();

    let &start = match heads.as_slice() {
        [single] => single,
        _ => {
            tracing::warn!(
                "waypoint chain has {} head candidates, falling back to storage order",
                heads.len()
            );
            return Ok(parsed);
        }
    };

    let by_coords: std::collections::HashMap<&str, usize> = dots
        .iter()
        .enumerate()
        .map(|(i, d)| (d.coords.trim(), i))
        .collect();

    let mut order = Vec::with_capacity(dots.len());
    let mut visited = vec![false; dots.len()];
    let mut current = Some(start);
    while let Some(i) = current {
        if visited[i] {
            break;
        }
        visited[i] = true;
        order.push(parsed[i]);
        current = dots[i]
            .next
            .as_deref()
            .map(str::trim)
            .and_then(|next| by_coords.get(next).copied());
    }

    if order.len() != dots.len() {
        tracing::warn!(
            "waypoint chain resolves {} of {} points, falling back to storage order",
            order.len(),
            dots.len()
        );
        return Ok(parsed);
    }

    Ok(order)
}

fn parse_coords(s: &str) -> Result<Coordinate, AppError> {
    let mut parts = s.split(',');
    let (Some(lat), Some(lng), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AppError::InvalidInput(format!(
            "malformed coordinates '{}', expected 'lat,lng'",
            s
        )));
    };
    let lat: f64 = lat.trim().parse().map_err(|_| {
        AppError::InvalidInput(format!("invalid latitude in '{}'", s))
    })?;
    let lng: f64 = lng.trim().parse().map_err(|_| {
        AppError::InvalidInput(format!("invalid longitude in '{}'", s))
    })?;
    Ok(Coordinate::new(lat, lng))
}
