//! Great-circle geometry on a spherical Earth
//!
//! All functions take coordinates in decimal degrees and accept any finite
//! input; range checking belongs to the caller (see `validation::data`).

use crate::core::{Coordinate, EARTH_RADIUS_KM};

/// Great-circle distance between two coordinates using the haversine formula (km)
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points
    let c = 2.0 * h.min(1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Initial bearing from `from` towards `to`, in degrees [0, 360)
pub fn initial_bearing_deg(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let x = delta_lon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    let bearing = x.atan2(y).to_degrees();
    (bearing + 360.0) % 360.0
}

/// Total length of a path as the sum of its haversine legs (km).
///
/// Paths with fewer than two points have length `+0.0`.
pub fn path_length_km(waypoints: &[Coordinate]) -> f64 {
    // `Sum for f64` starts from -0.0, which would print as "-0.00"
    waypoints
        .windows(2)
        .fold(0.0, |total, leg| total + distance_km(leg[0], leg[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AMBULANCE_START;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn test_distance_to_self_is_zero() {
        assert_eq!(distance_km(AMBULANCE_START, AMBULANCE_START), 0.0);

        let pole = Coordinate::new(90.0, 0.0);
        assert_eq!(distance_km(pole, pole), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let hospital = Coordinate::new(28.570000, 77.150000);
        let forward = distance_km(AMBULANCE_START, hospital);
        let backward = distance_km(hospital, AMBULANCE_START);
        assert!((forward - backward).abs() < TOLERANCE);

        let a = Coordinate::new(-33.8688, 151.2093);
        let b = Coordinate::new(51.5074, -0.1278);
        assert!((distance_km(a, b) - distance_km(b, a)).abs() < TOLERANCE);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let a = Coordinate::new(10.0, 20.0);
        let b = Coordinate::new(11.0, 20.0);
        let distance = distance_km(a, b);

        // 2 * pi * 6371 / 360 = 111.19 km
        assert!((distance - 111.0).abs() / 111.0 < 0.01, "got {}", distance);
    }

    #[test]
    fn test_antipodal_points() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 180.0);
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((distance_km(a, b) - half_circumference).abs() < 1e-6);
    }

    #[test]
    fn test_city_hospital_distance() {
        // Ambulance to City Hospital is a little over 1.2 km
        let hospital = Coordinate::new(28.560000, 77.140000);
        let distance = distance_km(AMBULANCE_START, hospital);
        assert!(distance > 1.1 && distance < 1.4, "got {}", distance);
    }

    #[test]
    fn test_cardinal_bearings() {
        let origin = Coordinate::new(0.0, 0.0);
        assert!((initial_bearing_deg(origin, Coordinate::new(1.0, 0.0)) - 0.0).abs() < 1e-6);
        assert!((initial_bearing_deg(origin, Coordinate::new(0.0, 1.0)) - 90.0).abs() < 1e-6);
        assert!((initial_bearing_deg(origin, Coordinate::new(-1.0, 0.0)) - 180.0).abs() < 1e-6);
        assert!((initial_bearing_deg(origin, Coordinate::new(0.0, -1.0)) - 270.0).abs() < 1e-6);
    }

    #[test]
    fn test_path_length() {
        assert_eq!(path_length_km(&[]), 0.0);
        assert_eq!(path_length_km(&[AMBULANCE_START]), 0.0);

        let a = Coordinate::new(10.0, 20.0);
        let b = Coordinate::new(11.0, 20.0);
        let c = Coordinate::new(12.0, 20.0);
        let total = path_length_km(&[a, b, c]);
        assert!((total - distance_km(a, b) - distance_km(b, c)).abs() < TOLERANCE);
    }

    #[test]
    fn test_short_path_length_is_positive_zero() {
        let empty = path_length_km(&[]);
        let single = path_length_km(&[AMBULANCE_START]);

        assert!(!empty.is_sign_negative());
        assert!(!single.is_sign_negative());
        assert_eq!(format!("{:.2}", empty), "0.00");
        assert_eq!(format!("{:.2}", single), "0.00");
    }
}
