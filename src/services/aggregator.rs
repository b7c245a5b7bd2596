//! Per-segment aggregation pipeline.
//!
//! Takes a pair of waypoints, samples intermediate points, enriches them
//! with elevation and weather from Open-Meteo and derives the segment's
//! difficulty statistics. External lookups degrade gracefully: a failed
//! elevation call leaves that point at sea level, a failed forecast call
//! drops the weather timeline, and the pipeline keeps going either way.

use chrono::NaiveDateTime;

use crate::errors::AppError;
use crate::models::{
    round_dp, Coordinate, SegmentPoint, SegmentStatistics, WeatherSample,
    WeatherTimelineEntry,
};
use crate::services::open_meteo::{self, OpenMeteoClient};
use crate::services::{difficulty, sampler};

/// Everything known about one aggregated segment.
#[derive(Debug, Clone)]
pub struct SegmentAggregate {
    pub track: Vec<SegmentPoint>,
    pub weather_timeline: Vec<WeatherTimelineEntry>,
    pub statistics: SegmentStatistics,
}

pub struct RouteAggregator {
    client: OpenMeteoClient,
    points_per_segment: usize,
}

impl RouteAggregator {
    pub fn new(client: OpenMeteoClient, points_per_segment: usize) -> Self {
        Self {
            client,
            points_per_segment,
        }
    }

    /// Aggregate a single segment between two waypoints.
    ///
    /// The forecast is fetched once, at the segment midpoint, and reused
    /// for every sampled point; elevation is fetched per point. Both go
    /// through the shared rate limiter.
    pub async fn aggregate_segment(
        &self,
        start: &Coordinate,
        end: &Coordinate,
        start_time: NaiveDateTime,
        duration_hours: f64,
    ) -> Result<SegmentAggregate, AppError> {
        let sampled = sampler::split_route(start, end, self.points_per_segment)?;
        let n = sampled.len();

        let midpoint = &sampled[n / 2];
        let forecast = match self
            .client
            .fetch_weather_forecast(midpoint.lat, midpoint.lng, start_time, duration_hours)
            .await
        {
            Ok(hourly) => Some(hourly),
            Err(err) => {
                tracing::warn!(
                    lat = midpoint.lat,
                    lng = midpoint.lng,
                    "weather forecast unavailable, continuing without it: {err}"
                );
                None
            }
        };

        let mut track: Vec<SegmentPoint> = Vec::with_capacity(n);
        let mut weather_timeline: Vec<WeatherTimelineEntry> = Vec::new();
        let mut samples: Vec<Option<WeatherSample>> = Vec::with_capacity(n);
        let mut elevated: Vec<Coordinate> = Vec::with_capacity(n);

        for (i, point) in sampled.iter().enumerate() {
            let elevation = match self.client.fetch_elevation(point.lat, point.lng).await {
                Ok(elevation) => elevation,
                Err(err) => {
                    tracing::warn!(
                        lat = point.lat,
                        lng = point.lng,
                        "elevation lookup failed, assuming sea level: {err}"
                    );
                    0.0
                }
            };

            let time_offset_hours = i as f64 / (n - 1) as f64 * duration_hours;
            let sample = forecast
                .as_ref()
                .and_then(|f| open_meteo::distribute_weather_by_time(f, time_offset_hours));

            track.push(SegmentPoint {
                lat: round_dp(point.lat, 6),
                lng: round_dp(point.lng, 6),
                elevation: round_dp(elevation, 2),
                point_index: i,
                time_offset_hours,
            });
            if let Some(ref weather) = sample {
                weather_timeline.push(WeatherTimelineEntry {
                    point_index: i,
                    segment_index: 0,
                    lat: round_dp(point.lat, 6),
                    lng: round_dp(point.lng, 6),
                    time_offset_hours: round_dp(time_offset_hours, 1),
                    estimated_time: start_time
                        + chrono::Duration::seconds((time_offset_hours * 3600.0) as i64),
                    weather: weather.clone(),
                });
            }
            samples.push(sample);
            elevated.push(Coordinate::with_elevation(point.lat, point.lng, elevation));
        }

        let mut total_distance = 0.0;
        let mut total_difficulty = 0.0;
        let mut total_climb = 0.0;
        let mut total_descent = 0.0;

        for i in 1..n {
            // Weather conditions at the point being reached score the leg.
            let stats =
                difficulty::segment_stats(&elevated[i - 1], &elevated[i], samples[i].as_ref());
            total_distance += stats.distance;
            total_difficulty += stats.difficulty;
            total_climb += stats.climb;
            total_descent += stats.descent;
        }

        let max_elevation = elevated
            .iter()
            .map(Coordinate::elevation_m)
            .fold(f64::NEG_INFINITY, f64::max);
        let min_elevation = elevated
            .iter()
            .map(Coordinate::elevation_m)
            .fold(f64::INFINITY, f64::min);
        let avg_slope = if total_distance > 0.0 {
            round_dp(total_climb / total_distance * 100.0, 1)
        } else {
            0.0
        };

        Ok(SegmentAggregate {
            track,
            weather_timeline,
            statistics: SegmentStatistics {
                total_distance: total_distance.round(),
                total_difficulty: total_difficulty.round(),
                total_climb: total_climb.round(),
                total_descent: total_descent.round(),
                max_elevation,
                min_elevation,
                avg_slope,
                estimated_duration_hours: duration_hours,
            },
        })
    }

    /// Aggregate every consecutive waypoint pair of a route.
    pub async fn aggregate_route(
        &self,
        waypoints: &[Coordinate],
        start_time: NaiveDateTime,
        duration_hours: f64,
    ) -> Result<Vec<SegmentAggregate>, AppError> {
        if waypoints.len() < 2 {
            return Err(AppError::InvalidInput(
                "a route needs at least two waypoints".to_string(),
            ));
        }

        let mut segments = Vec::with_capacity(waypoints.len() - 1);
        for pair in waypoints.windows(2) {
            segments.push(
                self.aggregate_segment(&pair[0], &pair[1], start_time, duration_hours)
                    .await?,
            );
        }
        Ok(segments)
    }
}
