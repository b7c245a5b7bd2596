//! Open-Meteo client.
//!
//! Fetches point elevations and hourly weather forecasts. Every call —
//! elevation or forecast — waits on the shared [`RateLimiter`] before
//! going out, and is individually bounded by a 10 s timeout. There is no
//! whole-route deadline; callers own the overall pacing.
//!
//! See: https://open-meteo.com/en/docs

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::WeatherSample;
use crate::services::rate_limit::RateLimiter;

/// Per-request timeout for upstream calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Hourly variables requested from the forecast endpoint.
const HOURLY_FIELDS: &str = "temperature_2m,precipitation,weathercode,windspeed_10m";

/// Client for the Open-Meteo elevation and forecast APIs.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: reqwest::Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
}

// --- Open-Meteo JSON response types ---

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    #[serde(default)]
    elevation: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: Option<HourlyForecast>,
}

/// Hourly forecast series, parallel arrays indexed by hour.
#[derive(Debug, Clone, Deserialize)]
pub struct HourlyForecast {
    pub time: Vec<String>,
    pub temperature_2m: Vec<f64>,
    pub precipitation: Vec<f64>,
    pub weathercode: Vec<i32>,
    pub windspeed_10m: Vec<f64>,
}

impl OpenMeteoClient {
    pub fn new(base_url: &str, limiter: Arc<RateLimiter>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter,
        }
    }

    /// Look up the ground elevation at a coordinate, in metres.
    pub async fn fetch_elevation(&self, lat: f64, lng: f64) -> Result<f64, AppError> {
        self.limiter.acquire().await;

        let url = format!(
            "{}/v1/elevation?latitude={}&longitude={}",
            self.base_url, lat, lng
        );

        let response = self.http.get(&url).send().await.map_err(|e| {
            AppError::UpstreamError(format!("elevation request failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamError(format!(
                "elevation API returned HTTP {}",
                response.status()
            )));
        }

        let body: ElevationResponse = response.json().await.map_err(|e| {
            AppError::UpstreamError(format!("elevation JSON parse error: {}", e))
        })?;

        body.elevation.first().copied().ok_or_else(|| {
            AppError::UpstreamError("elevation data not found for these coordinates".to_string())
        })
    }

    /// Fetch an hourly forecast covering `[start, start + duration_hours]`.
    pub async fn fetch_weather_forecast(
        &self,
        lat: f64,
        lng: f64,
        start: NaiveDateTime,
        duration_hours: f64,
    ) -> Result<HourlyForecast, AppError> {
        self.limiter.acquire().await;

        let end = start + chrono::Duration::seconds((duration_hours * 3600.0) as i64);
        let url = format!(
            "{}/v1/forecast?latitude={}&longitude={}&hourly={}&start_date={}&end_date={}&timezone=auto",
            self.base_url,
            lat,
            lng,
            HOURLY_FIELDS,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        );

        let response = self.http.get(&url).send().await.map_err(|e| {
            AppError::UpstreamError(format!("forecast request failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamError(format!(
                "forecast API returned HTTP {}",
                response.status()
            )));
        }

        let body: ForecastResponse = response.json().await.map_err(|e| {
            AppError::UpstreamError(format!("forecast JSON parse error: {}", e))
        })?;

        body.hourly.ok_or_else(|| {
            AppError::UpstreamError("forecast response has no hourly data".to_string())
        })
    }
}

/// Pick the forecast bucket for a time offset from the forecast start.
///
/// Nearest-past-hour sampling, not interpolation: the bucket at
/// `floor(offset_hours)` applies, clamped to the last available index.
/// Returns `None` for an empty or ragged series.
pub fn distribute_weather_by_time(
    forecast: &HourlyForecast,
    offset_hours: f64,
) -> Option<WeatherSample> {
    if forecast.time.is_empty() {
        return None;
    }
    let index = (offset_hours.floor().max(0.0) as usize).min(forecast.time.len() - 1);

    Some(WeatherSample {
        temperature: *forecast.temperature_2m.get(index)?,
        precipitation: *forecast.precipitation.get(index)?,
        weathercode: *forecast.weathercode.get(index)?,
        windspeed: *forecast.windspeed_10m.get(index)?,
        time: forecast.time.get(index)?.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, requests_per_minute: u32) -> OpenMeteoClient {
        OpenMeteoClient::new(
            &server.uri(),
            Arc::new(RateLimiter::new(requests_per_minute)),
        )
    }

    fn hourly(n: usize) -> HourlyForecast {
        HourlyForecast {
            time: (0..n).map(|h| format!("2026-06-01T{:02}:00", h)).collect(),
            temperature_2m: (0..n).map(|h| h as f64).collect(),
            precipitation: vec![0.0; n],
            weathercode: vec![0; n],
            windspeed_10m: vec![2.0; n],
        }
    }

    #[tokio::test]
    async fn test_fetch_elevation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/elevation"))
            .and(query_param("latitude", "53.7571"))
            .and(query_param("longitude", "87.135"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "elevation": [214.0]
                })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, 6000);
        let elevation = client.fetch_elevation(53.7571, 87.135).await.unwrap();
        assert_eq!(elevation, 214.0);
    }

    #[tokio::test]
    async fn test_fetch_elevation_empty_array_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/elevation"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "elevation": [] })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, 6000);
        let err = client.fetch_elevation(0.0, 0.0).await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamError(_)));
    }

    #[tokio::test]
    async fn test_fetch_elevation_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/elevation"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server, 6000);
        let err = client.fetch_elevation(0.0, 0.0).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"), "got: {}", err);
    }

    #[tokio::test]
    async fn test_fetch_forecast() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("hourly", HOURLY_FIELDS))
            .and(query_param("start_date", "2026-06-01"))
            .and(query_param("end_date", "2026-06-01"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "hourly": {
                        "time": ["2026-06-01T15:00", "2026-06-01T16:00"],
                        "temperature_2m": [5.0, 4.5],
                        "precipitation": [0.0, 0.2],
                        "weathercode": [0, 2],
                        "windspeed_10m": [2.0, 3.1]
                    }
                })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, 6000);
        let start = "2026-06-01T15:30:00"
            .parse::<NaiveDateTime>()
            .unwrap();
        let forecast = client
            .fetch_weather_forecast(53.7571, 87.135, start, 3.0)
            .await
            .unwrap();
        assert_eq!(forecast.time.len(), 2);
        assert_eq!(forecast.temperature_2m[0], 5.0);
        assert_eq!(forecast.weathercode[1], 2);
    }

    #[tokio::test]
    async fn test_forecast_spanning_midnight_requests_next_date() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("start_date", "2026-06-01"))
            .and(query_param("end_date", "2026-06-02"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "hourly": {
                        "time": ["2026-06-01T23:00"],
                        "temperature_2m": [5.0],
                        "precipitation": [0.0],
                        "weathercode": [0],
                        "windspeed_10m": [2.0]
                    }
                })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, 6000);
        let start = "2026-06-01T23:00:00"
            .parse::<NaiveDateTime>()
            .unwrap();
        assert!(client
            .fetch_weather_forecast(53.0, 87.0, start, 3.0)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_fetch_forecast_missing_hourly_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "latitude": 53.0 })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, 6000);
        let start = "2026-06-01T15:00:00"
            .parse::<NaiveDateTime>()
            .unwrap();
        let err = client
            .fetch_weather_forecast(53.0, 87.0, start, 3.0)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamError(_)));
    }

    #[tokio::test]
    async fn test_calls_are_spaced_by_the_shared_limiter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/elevation"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "elevation": [100.0] })),
            )
            .mount(&server)
            .await;

        // 1200 rpm → 50 ms between call starts; 3 calls span ≥ 100 ms.
        let client = client_for(&server, 1200);
        let start = std::time::Instant::now();
        for _ in 0..3 {
            client.fetch_elevation(53.0, 87.0).await.unwrap();
        }
        assert!(
            start.elapsed() >= Duration::from_millis(100),
            "3 rate-limited calls finished in {:?}",
            start.elapsed()
        );
    }

    #[test]
    fn test_distribute_picks_floor_of_offset() {
        let forecast = hourly(6);
        let sample = distribute_weather_by_time(&forecast, 2.9).unwrap();
        assert_eq!(sample.temperature, 2.0);
        assert_eq!(sample.time, "2026-06-01T02:00");
    }

    #[test]
    fn test_distribute_clamps_to_last_bucket() {
        let forecast = hourly(3);
        let sample = distribute_weather_by_time(&forecast, 12.0).unwrap();
        assert_eq!(sample.time, "2026-06-01T02:00");
    }

    #[test]
    fn test_distribute_offset_zero_uses_first_bucket() {
        let forecast = hourly(3);
        let sample = distribute_weather_by_time(&forecast, 0.0).unwrap();
        assert_eq!(sample.time, "2026-06-01T00:00");
    }

    #[test]
    fn test_distribute_empty_series() {
        let forecast = hourly(0);
        assert!(distribute_weather_by_time(&forecast, 1.0).is_none());
    }

    #[test]
    fn test_distribute_ragged_series() {
        let mut forecast = hourly(3);
        forecast.windspeed_10m.truncate(1);
        assert!(distribute_weather_by_time(&forecast, 2.0).is_none());
    }
}
