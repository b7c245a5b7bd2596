//! Great-circle geometry with altitude correction.
//!
//! Distances use the haversine central angle on a sphere whose radius is
//! inflated by the mean elevation of the two endpoints, so high-altitude
//! tracks measure slightly longer than their sea-level projection.
//! Latitudes/longitudes are assumed in-bounds; callers validate.

use crate::models::Coordinate;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Central angle and inclination between two coordinates.
///
/// Returns `(angle_between_rad, inclination_rad)`:
/// - `angle_between_rad` — haversine central angle, identical in either
///   direction;
/// - `inclination_rad` — vertical angle of the segment; swapping the
///   endpoints negates it. When the horizontal distance is exactly zero
///   the inclination is ±90° with the sign of the elevation delta
///   (0 when both endpoints share an elevation).
pub fn angle_3d(p1: &Coordinate, p2: &Coordinate, radius: f64) -> (f64, f64) {
    let phi1 = p1.lat.to_radians();
    let phi2 = p2.lat.to_radians();
    let delta_phi = phi2 - phi1;
    let delta_lambda = (p2.lng - p1.lng).to_radians();

    let sin_dphi = (delta_phi * 0.5).sin();
    let sin_dlambda = (delta_lambda * 0.5).sin();
    // Clamp guards against floating-point overshoot past 1.0 for antipodes.
    let a = (sin_dphi * sin_dphi + phi1.cos() * phi2.cos() * sin_dlambda * sin_dlambda)
        .clamp(0.0, 1.0);

    let angle_between = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    let effective_radius = radius + 0.5 * (p1.elevation_m() + p2.elevation_m());
    let horizontal = effective_radius * angle_between;
    let delta_h = p2.elevation_m() - p1.elevation_m();

    let inclination = if horizontal == 0.0 {
        if delta_h == 0.0 {
            0.0
        } else {
            delta_h.signum() * std::f64::consts::FRAC_PI_2
        }
    } else {
        delta_h.atan2(horizontal)
    };

    (angle_between, inclination)
}

/// Horizontal distance in metres between two coordinates.
pub fn horizontal_distance(p1: &Coordinate, p2: &Coordinate) -> f64 {
    let (angle_between, _) = angle_3d(p1, p2, EARTH_RADIUS_M);
    (EARTH_RADIUS_M + 0.5 * (p1.elevation_m() + p2.elevation_m())) * angle_between
}

/// Length in metres of a 3D track: the sum of
/// `sqrt(horizontal² + Δelevation²)` over consecutive point pairs.
/// Zero for fewer than two points.
pub fn track_distance_3d(points: &[Coordinate]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|pair| {
            let horizontal = horizontal_distance(&pair[0], &pair[1]);
            let delta_h = pair[1].elevation_m() - pair[0].elevation_m();
            (horizontal * horizontal + delta_h * delta_h).sqrt()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64, ele: f64) -> Coordinate {
        Coordinate::with_elevation(lat, lng, ele)
    }

    #[test]
    fn test_angle_between_is_symmetric() {
        let a = point(53.7571, 87.135, 200.0);
        let b = point(53.7600, 87.140, 250.0);
        let (ab, _) = angle_3d(&a, &b, EARTH_RADIUS_M);
        let (ba, _) = angle_3d(&b, &a, EARTH_RADIUS_M);
        assert!((ab - ba).abs() < 1e-15);
    }

    #[test]
    fn test_inclination_negates_when_swapped() {
        let a = point(53.7571, 87.135, 200.0);
        let b = point(53.7600, 87.140, 250.0);
        let (_, incl_ab) = angle_3d(&a, &b, EARTH_RADIUS_M);
        let (_, incl_ba) = angle_3d(&b, &a, EARTH_RADIUS_M);
        assert!(incl_ab > 0.0, "uphill segment should incline upward");
        assert!((incl_ab + incl_ba).abs() < 1e-12);
    }

    #[test]
    fn test_zero_horizontal_distance_gives_vertical_angle() {
        let a = point(53.0, 87.0, 100.0);
        let up = point(53.0, 87.0, 150.0);
        let down = point(53.0, 87.0, 50.0);

        let (angle, incl) = angle_3d(&a, &up, EARTH_RADIUS_M);
        assert_eq!(angle, 0.0);
        assert_eq!(incl, std::f64::consts::FRAC_PI_2);

        let (_, incl) = angle_3d(&a, &down, EARTH_RADIUS_M);
        assert_eq!(incl, -std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn test_identical_points_have_zero_inclination() {
        let a = point(53.0, 87.0, 100.0);
        let (angle, incl) = angle_3d(&a, &a, EARTH_RADIUS_M);
        assert_eq!(angle, 0.0);
        assert_eq!(incl, 0.0);
    }

    #[test]
    fn test_track_distance_trivial_cases() {
        let a = point(53.0, 87.0, 100.0);
        assert_eq!(track_distance_3d(&[]), 0.0);
        assert_eq!(track_distance_3d(&[a]), 0.0);
        assert_eq!(track_distance_3d(&[a, a]), 0.0);
    }

    #[test]
    fn test_track_distance_known_segment() {
        // ~0.01° of latitude is roughly 1112 m on the ground.
        let a = point(53.75, 87.13, 0.0);
        let b = point(53.76, 87.13, 0.0);
        let d = track_distance_3d(&[a, b]);
        assert!((d - 1112.0).abs() < 5.0, "expected ~1112 m, got {}", d);
    }

    #[test]
    fn test_track_distance_includes_vertical_component() {
        let a = point(53.75, 87.13, 0.0);
        let b = point(53.76, 87.13, 500.0);
        let flat = track_distance_3d(&[a, point(53.76, 87.13, 0.0)]);
        let steep = track_distance_3d(&[a, b]);
        assert!(steep > flat);
        // Close to the Pythagorean bound.
        let expected = (flat * flat + 500.0 * 500.0).sqrt();
        assert!((steep - expected).abs() < 1.0);
    }

    #[test]
    fn test_altitude_inflates_horizontal_distance() {
        let low_a = point(53.75, 87.13, 0.0);
        let low_b = point(53.76, 87.13, 0.0);
        let high_a = point(53.75, 87.13, 3000.0);
        let high_b = point(53.76, 87.13, 3000.0);
        assert!(
            horizontal_distance(&high_a, &high_b) > horizontal_distance(&low_a, &low_b),
            "same arc at altitude should be longer"
        );
    }
}
