//! Route HTTP endpoints.
//!
//! - GET /api/v1/routes/elevations?start_lat=..&start_lng=..&end_lat=..&end_lng=..&start_date_time=ISO&duration_hours=N
//! - POST /api/v1/routes/plan

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::errors::{AppError, ErrorResponse};
use crate::models::{
    Coordinate, RouteStatistics, SegmentPoint, SegmentStatistics, TrackPoint,
    WeatherTimelineEntry,
};
use crate::services::aggregator::RouteAggregator;
use crate::services::stitcher::{self, StoredWaypoint};

/// Maximum allowed value for `duration_hours` (3 days).
const MAX_DURATION_HOURS: f64 = 72.0;

/// Default travel duration when the caller does not supply one.
const DEFAULT_DURATION_HOURS: f64 = 3.0;

/// Shared application state for route endpoints.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) aggregator: Arc<RouteAggregator>,
}

// ---------------------------------------------------------------------------
// Query parameter and body structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, IntoParams)]
pub struct ElevationsQuery {
    /// Segment start latitude in degrees
    pub start_lat: f64,
    /// Segment start longitude in degrees
    pub start_lng: f64,
    /// Segment end latitude in degrees
    pub end_lat: f64,
    /// Segment end longitude in degrees
    pub end_lng: f64,
    /// Local departure time, ISO 8601 without offset (e.g. "2026-06-01T15:00:00")
    pub start_date_time: String,
    /// Planned travel time over the segment in hours (default 3)
    pub duration_hours: Option<f64>,
}

/// An ordered waypoint in a plan request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WaypointInput {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
}

/// Body for `POST /api/v1/routes/plan`.
///
/// Waypoints come either as an ordered `waypoints` list or as
/// `stored_waypoints`, the linked-list form a persistence layer hands
/// back; exactly one of the two must be non-empty.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlanRouteRequest {
    /// Waypoints in visiting order
    #[serde(default)]
    pub waypoints: Vec<WaypointInput>,
    /// Waypoints as (coords, next) pairs in arbitrary storage order
    #[serde(default)]
    pub stored_waypoints: Vec<StoredWaypoint>,
    /// Optional route name, echoed back in the response
    pub name: Option<String>,
    /// Local departure time, ISO 8601 without offset
    pub start_date_time: String,
    /// Planned travel time per segment in hours (default 3)
    pub duration_hours: Option<f64>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Aggregated data for a single segment.
#[derive(Debug, Serialize, ToSchema)]
pub struct ElevationsResponse {
    /// Sampled points with elevations, in traversal order
    pub track: Vec<SegmentPoint>,
    /// Weather at each sampled point (empty when the forecast was unavailable)
    pub weather_timeline: Vec<WeatherTimelineEntry>,
    /// Segment totals
    pub statistics: SegmentStatistics,
    /// Number of sampled points
    pub points_count: usize,
    /// Travel time the aggregation assumed, in hours
    pub total_duration_hours: f64,
}

/// A fully stitched multi-segment route plan.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlanRouteResponse {
    /// Route name, when one was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Merged track across all segments
    pub track: Vec<TrackPoint>,
    /// Weather entries remapped to global point indices
    pub weather_timeline: Vec<WeatherTimelineEntry>,
    /// Route totals with the difficulty classification
    pub statistics: RouteStatistics,
    /// Number of segments the route was split into
    pub segments: usize,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn parse_start_time(raw: &str) -> Result<NaiveDateTime, AppError> {
    raw.parse().map_err(|e| {
        AppError::InvalidInput(format!("Invalid start_date_time '{}': {}", raw, e))
    })
}

fn validate_duration(duration_hours: Option<f64>) -> Result<f64, AppError> {
    let duration = duration_hours.unwrap_or(DEFAULT_DURATION_HOURS);
    // is_finite() first because NaN passes range comparisons
    // (NaN <= 0.0 is false, NaN > 72.0 is also false).
    if !duration.is_finite() {
        return Err(AppError::InvalidInput(
            "duration_hours must be a finite number".to_string(),
        ));
    }
    if duration <= 0.0 || duration > MAX_DURATION_HOURS {
        return Err(AppError::InvalidInput(format!(
            "duration_hours must be between 0 (exclusive) and {}",
            MAX_DURATION_HOURS as u64
        )));
    }
    Ok(duration)
}

fn validate_coordinate(lat: f64, lng: f64, label: &str) -> Result<Coordinate, AppError> {
    let coordinate = Coordinate::new(lat, lng);
    if !coordinate.in_bounds() {
        return Err(AppError::InvalidInput(format!(
            "{} coordinate ({}, {}) is out of bounds",
            label, lat, lng
        )));
    }
    Ok(coordinate)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Aggregate a single segment between two coordinates.
///
/// Samples points along the straight line between start and end, looks up
/// their elevations, attaches a weather timeline and scores the segment's
/// difficulty. All validation happens before any external call goes out.
#[utoipa::path(
    get,
    path = "/api/v1/routes/elevations",
    tag = "Routes",
    params(ElevationsQuery),
    responses(
        (status = 200, description = "Aggregated segment data", body = ElevationsResponse),
        (status = 400, description = "Invalid coordinates, datetime or duration", body = ErrorResponse),
        (status = 502, description = "External elevation/weather service error", body = ErrorResponse),
    )
)]
pub async fn get_segment_elevations(
    State(state): State<AppState>,
    Query(params): Query<ElevationsQuery>,
) -> Result<Json<ElevationsResponse>, AppError> {
    let start = validate_coordinate(params.start_lat, params.start_lng, "start")?;
    let end = validate_coordinate(params.end_lat, params.end_lng, "end")?;
    let start_time = parse_start_time(&params.start_date_time)?;
    let duration_hours = validate_duration(params.duration_hours)?;

    let segment = state
        .aggregator
        .aggregate_segment(&start, &end, start_time, duration_hours)
        .await?;

    Ok(Json(ElevationsResponse {
        points_count: segment.track.len(),
        total_duration_hours: duration_hours,
        track: segment.track,
        weather_timeline: segment.weather_timeline,
        statistics: segment.statistics,
    }))
}

/// Plan a full route over an ordered list of waypoints.
///
/// Aggregates every consecutive waypoint pair, stitches the segments into
/// one continuous track with a single time axis and classifies the overall
/// difficulty.
#[utoipa::path(
    post,
    path = "/api/v1/routes/plan",
    tag = "Routes",
    request_body = PlanRouteRequest,
    responses(
        (status = 200, description = "Stitched route plan", body = PlanRouteResponse),
        (status = 400, description = "Invalid waypoints, datetime or duration", body = ErrorResponse),
        (status = 502, description = "External elevation/weather service error", body = ErrorResponse),
    )
)]
pub async fn plan_route(
    State(state): State<AppState>,
    Json(body): Json<PlanRouteRequest>,
) -> Result<Json<PlanRouteResponse>, AppError> {
    let start_time = parse_start_time(&body.start_date_time)?;
    let duration_hours = validate_duration(body.duration_hours)?;

    let waypoints: Vec<Coordinate> = if !body.waypoints.is_empty() {
        body.waypoints
            .iter()
            .enumerate()
            .map(|(i, w)| validate_coordinate(w.lat, w.lng, &format!("waypoint {}", i)))
            .collect::<Result<_, _>>()?
    } else {
        let resolved = stitcher::resolve_waypoint_chain(&body.stored_waypoints)?;
        for (i, w) in resolved.iter().enumerate() {
            validate_coordinate(w.lat, w.lng, &format!("waypoint {}", i))?;
        }
        resolved
    };

    if waypoints.len() < 2 {
        return Err(AppError::InvalidInput(
            "a route needs at least two waypoints".to_string(),
        ));
    }

    let segments = state
        .aggregator
        .aggregate_route(&waypoints, start_time, duration_hours)
        .await?;
    let stitched = stitcher::combine_segments(&segments, start_time, duration_hours);

    Ok(Json(PlanRouteResponse {
        name: body.name,
        track: stitched.track,
        weather_timeline: stitched.weather_timeline,
        statistics: stitched.statistics,
        segments: stitched.segments,
    }))
}
