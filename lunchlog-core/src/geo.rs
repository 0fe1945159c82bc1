//! Great-circle distances.

use crate::types::Location;

/// Mean Earth radius in metres
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two positions, in metres.
pub fn distance_m(a: Location, b: Location) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(distance_m(Location::DEFAULT, Location::DEFAULT), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let a = Location::new(37.5665, 126.9780);
        let b = Location::new(37.5670, 126.9790);
        assert!((distance_m(a, b) - distance_m(b, a)).abs() < 1e-9);
    }

    #[test]
    fn test_known_distances() {
        // 0.001° of latitude is ~111 m
        let a = Location::new(37.0, 127.0);
        let b = Location::new(37.001, 127.0);
        let d = distance_m(a, b);
        assert!((d - 111.2).abs() < 0.5, "got {}", d);

        // Seoul City Hall to Gangnam station, roughly 8.8 km
        let gangnam = Location::new(37.4979, 127.0276);
        let d = distance_m(Location::DEFAULT, gangnam);
        assert!((8_000.0..9_500.0).contains(&d), "got {}", d);
    }
}
