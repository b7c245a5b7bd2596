//! Route densification.
//!
//! Splits a segment between two waypoints into evenly spaced sample
//! points using straight-line interpolation in lat/lng space. This is a
//! stated approximation: not great-circle interpolation, acceptable at
//! the short segment lengths the planner works with.
//!
//! The point count is derived from the outbound-call budget rather than
//! segment geometry — every sampled point costs one rate-limited
//! elevation lookup, so the cap is "how many calls we can afford", not
//! "how finely this path deserves sampling". Long segments therefore get
//! coarse tracks; a deliberate simplification.

use crate::errors::AppError;
use crate::models::Coordinate;
use crate::services::rate_limit::RateLimiter;

/// Fewest points a segment may have (its two endpoints).
pub const MIN_POINTS_PER_SEGMENT: usize = 2;

/// Most points a segment may have.
pub const MAX_POINTS_PER_SEGMENT: usize = 5;

/// Derive the per-segment sample count from the wall-clock budget:
/// how many rate-limited calls fit in `budget_secs`, clamped to `[2, 5]`.
pub fn max_points_for_budget(budget_secs: u32, limiter: &RateLimiter) -> usize {
    let interval_secs = limiter.interval().as_secs_f64();
    let affordable = if interval_secs > 0.0 {
        (budget_secs as f64 / interval_secs).floor() as usize
    } else {
        MAX_POINTS_PER_SEGMENT
    };
    affordable.clamp(MIN_POINTS_PER_SEGMENT, MAX_POINTS_PER_SEGMENT)
}

/// Produce `n` evenly spaced coordinates from `start` to `end` inclusive.
///
/// Elevations are not interpolated — sampled points carry no elevation
/// until the fetcher fills them in.
pub fn split_route(
    start: &Coordinate,
    end: &Coordinate,
    n: usize,
) -> Result<Vec<Coordinate>, AppError> {
    if n < MIN_POINTS_PER_SEGMENT {
        return Err(AppError::InvalidInput(format!(
            "a segment needs at least {} sample points, got {}",
            MIN_POINTS_PER_SEGMENT, n
        )));
    }

    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        let fraction = i as f64 / (n - 1) as f64;
        points.push(Coordinate::new(
            start.lat + (end.lat - start.lat) * fraction,
            start.lng + (end.lng - start.lng) * fraction,
        ));
    }

    Ok(points)
}
