//! Great-circle geometry for proximity search.
//!
//! Distances use the Haversine formula on a spherical Earth with the
//! mean radius. Good to ~0.5% against the ellipsoid, which is far below
//! what a "restaurants near me" radius filter can notice.

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are finite and inside the valid ranges
    /// (lat -90..90, lng -180..180).
    pub fn in_range(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Haversine distance between two points, in kilometers.
pub fn haversine_km(a: Point, b: Point) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ATLANTA: Point = Point { lat: 33.7490, lng: -84.3880 };
    const MECCA: Point = Point { lat: 21.4225, lng: 39.8262 };
    const MEDINA: Point = Point { lat: 24.4686, lng: 39.6142 };

    #[test]
    fn test_zero_distance_to_self() {
        assert_eq!(haversine_km(ATLANTA, ATLANTA), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let ab = haversine_km(MECCA, MEDINA);
        let ba = haversine_km(MEDINA, MECCA);
        assert_relative_eq!(ab, ba, max_relative = 1e-12);
    }

    #[test]
    fn test_mecca_medina() {
        // Straight-line distance between the two cities is ~339 km.
        let d = haversine_km(MECCA, MEDINA);
        assert!((d - 339.0).abs() < 3.0, "got {d}");
    }

    #[test]
    fn test_colinear_additivity() {
        // Three points on the equator lie on a single great circle.
        let a = Point::new(0.0, 10.0);
        let b = Point::new(0.0, 11.0);
        let c = Point::new(0.0, 12.5);
        let sum = haversine_km(a, b) + haversine_km(b, c);
        assert_relative_eq!(haversine_km(a, c), sum, max_relative = 1e-9);
    }

    #[test]
    fn test_north_atlanta_suburb() {
        // (34.2, -84.5) sits roughly 51 km north of downtown Atlanta,
        // safely outside a 10 km radius.
        let d = haversine_km(ATLANTA, Point::new(34.2, -84.5));
        assert!(d > 45.0 && d < 60.0, "got {d}");
        assert!(d > 10.0);
    }

    #[test]
    fn test_in_range() {
        assert!(ATLANTA.in_range());
        assert!(Point::new(-90.0, 180.0).in_range());
        assert!(!Point::new(90.5, 0.0).in_range());
        assert!(!Point::new(0.0, -180.1).in_range());
        assert!(!Point::new(f64::NAN, 0.0).in_range());
        assert!(!Point::new(0.0, f64::INFINITY).in_range());
    }
}
