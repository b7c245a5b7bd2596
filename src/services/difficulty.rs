//! Empirical difficulty model.
//!
//! Terrain cost follows Minetti-style energy-expenditure curves: ascent
//! cost grows polynomially with the inclination angle, while descent cost
//! is V-shaped — gentle downhills are cheaper than flat ground, with a
//! minimum around 10°, after which braking on steep descents makes the
//! multiplier climb again. Weather stacks independent multiplicative
//! penalties on top.

use crate::models::{Coordinate, DifficultyLabel, SegmentStats, WeatherSample};
use crate::services::geo;

/// WMO weather codes treated as adverse conditions: fog, drizzle, rain,
/// snow, showers and thunderstorms.
pub const ADVERSE_WEATHER_CODES: &[i32] = &[
    45, 48, 51, 53, 55, 56, 57, 61, 63, 65, 66, 67, 71, 73, 75, 77, 80, 81, 82, 85, 86, 95, 96, 99,
];

/// Energy-cost multiplier for ascending at `angle_deg` degrees.
/// 1.0 on flat ground, monotonically increasing for positive angles.
pub fn climbing_difficulty(angle_deg: f64) -> f64 {
    1.0 + 0.092 * angle_deg + 0.00023 * angle_deg.powi(2) + 0.0000075 * angle_deg.powi(3)
}

/// Energy-cost multiplier for descending at `angle_deg` degrees.
///
/// Gentle slopes reduce the cost linearly down to 0.5 at 10°; beyond
/// that the descent gets harder again at 0.03 per degree.
pub fn descending_difficulty(angle_deg: f64) -> f64 {
    let angle_abs = angle_deg.abs();
    if angle_abs <= 10.0 {
        1.0 - 0.05 * angle_abs
    } else {
        0.5 + 0.03 * (angle_abs - 10.0)
    }
}

/// Terrain cost multiplier for a segment, selected by the sign of the
/// elevation delta.
pub fn terrain_multiplier(inclination_deg: f64, elevation_delta: f64) -> f64 {
    if elevation_delta > 0.0 {
        climbing_difficulty(inclination_deg)
    } else {
        descending_difficulty(inclination_deg)
    }
}

/// Stacked weather penalty, always ≥ 1.
///
/// Temperature extremes, wind, precipitation and adverse weather codes
/// each contribute an independent factor; several applicable penalties
/// multiply together (cold + windy + rainy compounds).
pub fn weather_multiplier(weather: &WeatherSample) -> f64 {
    let mut multiplier = 1.0;

    let temp = weather.temperature;
    if temp < -10.0 {
        multiplier *= 1.4;
    } else if temp < 0.0 {
        multiplier *= 1.2;
    } else if temp > 30.0 {
        multiplier *= 1.3;
    } else if temp > 25.0 {
        multiplier *= 1.1;
    }

    let wind = weather.windspeed;
    if wind > 15.0 {
        multiplier *= 1.4;
    } else if wind > 10.0 {
        multiplier *= 1.2;
    } else if wind > 6.0 {
        multiplier *= 1.1;
    }

    let precipitation = weather.precipitation;
    if precipitation > 5.0 {
        multiplier *= 1.5;
    } else if precipitation > 2.0 {
        multiplier *= 1.3;
    } else if precipitation > 0.5 {
        multiplier *= 1.1;
    }

    if ADVERSE_WEATHER_CODES.contains(&weather.weathercode) {
        multiplier *= 1.3;
    }

    multiplier
}

/// Cost breakdown for the segment between two consecutive track points,
/// with an optional weather sample applied at the later point.
pub fn segment_stats(
    p1: &Coordinate,
    p2: &Coordinate,
    weather: Option<&WeatherSample>,
) -> SegmentStats {
    let (_, inclination_rad) = geo::angle_3d(p1, p2, geo::EARTH_RADIUS_M);
    let distance = geo::horizontal_distance(p1, p2);
    let slope = inclination_rad.to_degrees();

    let elevation_delta = p2.elevation_m() - p1.elevation_m();
    let climb = elevation_delta.max(0.0);
    let descent = (-elevation_delta).max(0.0);

    let terrain = terrain_multiplier(slope, elevation_delta);
    let weather_mult = weather.map(weather_multiplier).unwrap_or(1.0);

    SegmentStats {
        distance,
        climb,
        descent,
        difficulty: distance * terrain * weather_mult,
        slope,
        weather_multiplier: weather_mult,
    }
}

/// Classify a route by relative difficulty = `total_difficulty / distance_3d`.
///
/// Undefined for `distance_3d == 0` — callers must guard before calling.
pub fn classify_difficulty(total_difficulty: f64, distance_3d: f64) -> DifficultyLabel {
    let relative = total_difficulty / distance_3d;
    if relative < 1.1 {
        DifficultyLabel::Easy
    } else if relative < 1.5 {
        DifficultyLabel::Moderate
    } else if relative < 2.0 {
        DifficultyLabel::Hard
    } else {
        DifficultyLabel::Expert
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(temp: f64, precip: f64, code: i32, wind: f64) -> WeatherSample {
        WeatherSample {
            temperature: temp,
            precipitation: precip,
            weathercode: code,
            windspeed: wind,
            time: "2026-06-01T12:00".to_string(),
        }
    }

    #[test]
    fn test_flat_ground_is_unit_cost() {
        assert_eq!(climbing_difficulty(0.0), 1.0);
        assert_eq!(descending_difficulty(0.0), 1.0);
    }

    #[test]
    fn test_climbing_monotonically_increases() {
        let mut prev = climbing_difficulty(0.0);
        for deg in 1..=45 {
            let cost = climbing_difficulty(deg as f64);
            assert!(cost > prev, "cost should grow with angle, at {}°", deg);
            prev = cost;
        }
    }

    #[test]
    fn test_descending_minimum_at_ten_degrees() {
        assert_eq!(descending_difficulty(10.0), 0.5);
        assert!(descending_difficulty(5.0) > 0.5);
        assert!(descending_difficulty(20.0) > 0.5);
    }

    #[test]
    fn test_descending_curve_is_continuous_at_kink() {
        let eps = 1e-9;
        let below = descending_difficulty(10.0 - eps);
        let above = descending_difficulty(10.0 + eps);
        assert!((below - above).abs() < 1e-7);
    }

    #[test]
    fn test_descending_ignores_sign() {
        assert_eq!(descending_difficulty(-5.0), descending_difficulty(5.0));
    }

    #[test]
    fn test_weather_multiplier_clear_day() {
        let w = sample(5.0, 0.0, 0, 2.0);
        assert_eq!(weather_multiplier(&w), 1.0);
    }

    #[test]
    fn test_weather_multiplier_penalties_compound() {
        // Hard frost + strong wind + heavy rain + adverse code.
        let w = sample(-15.0, 6.0, 65, 16.0);
        let expected = 1.4 * 1.4 * 1.5 * 1.3;
        assert!((weather_multiplier(&w) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_weather_multiplier_band_edges() {
        // -10 exactly is light frost, not hard frost.
        assert!((weather_multiplier(&sample(-10.0, 0.0, 0, 0.0)) - 1.2).abs() < 1e-12);
        // 6 m/s exactly carries no wind penalty.
        assert_eq!(weather_multiplier(&sample(10.0, 0.0, 0, 6.0)), 1.0);
        // 0.5 mm exactly carries no precipitation penalty.
        assert_eq!(weather_multiplier(&sample(10.0, 0.5, 0, 0.0)), 1.0);
    }

    #[test]
    fn test_adverse_code_alone() {
        let fog = sample(10.0, 0.0, 45, 2.0);
        assert!((weather_multiplier(&fog) - 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_classification_thresholds() {
        assert_eq!(classify_difficulty(1.0, 1.0), DifficultyLabel::Easy);
        // Boundary values fall into the next class up.
        assert_eq!(classify_difficulty(1.1, 1.0), DifficultyLabel::Moderate);
        assert_eq!(classify_difficulty(1.5, 1.0), DifficultyLabel::Hard);
        assert_eq!(classify_difficulty(2.0, 1.0), DifficultyLabel::Expert);
        assert_eq!(classify_difficulty(5000.0, 1000.0), DifficultyLabel::Expert);
    }

    #[test]
    fn test_segment_stats_uphill() {
        let a = Coordinate::with_elevation(53.7571, 87.135, 200.0);
        let b = Coordinate::with_elevation(53.7600, 87.140, 250.0);
        let stats = segment_stats(&a, &b, None);
        assert!(stats.distance > 0.0);
        assert_eq!(stats.climb, 50.0);
        assert_eq!(stats.descent, 0.0);
        assert!(stats.slope > 0.0);
        assert_eq!(stats.weather_multiplier, 1.0);
        assert!(stats.difficulty > stats.distance, "uphill costs extra");
    }

    #[test]
    fn test_segment_stats_gentle_downhill_is_cheap() {
        let a = Coordinate::with_elevation(53.7571, 87.135, 250.0);
        let b = Coordinate::with_elevation(53.7600, 87.140, 240.0);
        let stats = segment_stats(&a, &b, None);
        assert_eq!(stats.climb, 0.0);
        assert_eq!(stats.descent, 10.0);
        assert!(stats.difficulty < stats.distance);
    }

    #[test]
    fn test_segment_stats_weather_scales_difficulty() {
        let a = Coordinate::with_elevation(53.7571, 87.135, 200.0);
        let b = Coordinate::with_elevation(53.7600, 87.140, 250.0);
        let dry = segment_stats(&a, &b, None);
        let rainy = segment_stats(&a, &b, Some(&sample(5.0, 3.0, 63, 2.0)));
        // 1.3 precipitation band × 1.3 adverse code.
        let expected = dry.difficulty * 1.3 * 1.3;
        assert!((rainy.difficulty - expected).abs() < 1e-6);
        assert!((rainy.weather_multiplier - 1.69).abs() < 1e-12);
    }
}
