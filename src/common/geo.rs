// src/common/geo.rs

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres between two points given in degrees.
///
/// Haversine: `2R·asin(sqrt(sin²(Δφ/2) + cosφ1·cosφ2·sin²(Δλ/2)))`.
/// Inputs are not range-checked; callers validate coordinates.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero() {
        assert_eq!(distance_km(-0.9833, 36.8167, -0.9833, 36.8167), 0.0);
    }

    #[test]
    fn symmetric() {
        let forward = distance_km(-0.9833, 36.8167, -4.05, 39.6667);
        let backward = distance_km(-4.05, 39.6667, -0.9833, 36.8167);
        assert_eq!(forward, backward);
    }

    #[test]
    fn one_degree_of_longitude_on_the_equator() {
        // 2πR / 360
        let d = distance_km(0.0, 36.0, 0.0, 37.0);
        assert!((d - 111.194_926_6).abs() < 1e-3, "got {d}");
    }

    #[test]
    fn ndakaini_to_thika_is_short_hop() {
        let d = distance_km(-0.9833, 36.8167, -1.0333, 37.0833);
        assert!(d > 25.0 && d < 35.0, "got {d}");
    }
}
