//! Geofence validation
//!
//! Great-circle (haversine) distance between a store and a delivery point,
//! compared against the store's own service radius.

use shared::order::GeoPoint;
use thiserror::Error;

/// Mean Earth radius (IUGG), metres
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeofenceError {
    #[error("Delivery point is {distance_m:.0} m from the store, service radius is {radius_m:.0} m")]
    TooFar { distance_m: f64, radius_m: f64 },

    #[error("Invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("Invalid service radius: {0}")]
    InvalidRadius(f64),
}

/// Latitude/longitude are finite and within range
pub fn check_point(point: &GeoPoint) -> Result<(), GeofenceError> {
    let valid = point.lat.is_finite()
        && point.lng.is_finite()
        && (-90.0..=90.0).contains(&point.lat)
        && (-180.0..=180.0).contains(&point.lng);
    if valid {
        Ok(())
    } else {
        Err(GeofenceError::InvalidCoordinate {
            lat: point.lat,
            lng: point.lng,
        })
    }
}

/// Haversine distance in metres
pub fn distance_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Check that `delivery` lies within `radius_m` of `store`
pub fn validate(store: &GeoPoint, radius_m: f64, delivery: &GeoPoint) -> Result<(), GeofenceError> {
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return Err(GeofenceError::InvalidRadius(radius_m));
    }
    check_point(store)?;
    check_point(delivery)?;

    let distance = distance_m(store, delivery);
    if distance > radius_m {
        return Err(GeofenceError::TooFar {
            distance_m: distance,
            radius_m,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // One degree of latitude on the mean sphere
    const DEGREE_M: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

    #[test]
    fn test_same_point_is_zero() {
        let p = GeoPoint::new(6.5244, 3.3792);
        assert_eq!(distance_m(&p, &p), 0.0);
        assert!(validate(&p, 1.0, &p).is_ok());
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        assert!((distance_m(&a, &b) - DEGREE_M).abs() < 0.01);
    }

    #[test]
    fn test_55_km_rejected_with_30_km_radius() {
        let store = GeoPoint::new(6.5244, 3.3792);
        // ~55 km due north
        let delivery = GeoPoint::new(6.5244 + 55_000.0 / DEGREE_M, 3.3792);

        match validate(&store, 30_000.0, &delivery) {
            Err(GeofenceError::TooFar {
                distance_m,
                radius_m,
            }) => {
                assert!((distance_m - 55_000.0).abs() < 1.0);
                assert_eq!(radius_m, 30_000.0);
            }
            other => panic!("expected TooFar, got {other:?}"),
        }
    }

    #[test]
    fn test_radius_is_store_specific() {
        let store = GeoPoint::new(6.5244, 3.3792);
        let delivery = GeoPoint::new(6.5244 + 55_000.0 / DEGREE_M, 3.3792);
        assert!(validate(&store, 60_000.0, &delivery).is_ok());
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 0.5);
        let d = distance_m(&a, &b);
        assert!(validate(&a, d, &b).is_ok());
    }

    #[test]
    fn test_invalid_inputs() {
        let ok = GeoPoint::new(0.0, 0.0);
        assert!(matches!(
            validate(&ok, 0.0, &ok),
            Err(GeofenceError::InvalidRadius(_))
        ));
        assert!(matches!(
            validate(&ok, f64::NAN, &ok),
            Err(GeofenceError::InvalidRadius(_))
        ));
        assert!(matches!(
            validate(&ok, 1000.0, &GeoPoint::new(91.0, 0.0)),
            Err(GeofenceError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            validate(&GeoPoint::new(0.0, f64::INFINITY), 1000.0, &ok),
            Err(GeofenceError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_antimeridian() {
        let a = GeoPoint::new(0.0, 179.9);
        let b = GeoPoint::new(0.0, -179.9);
        assert!((distance_m(&a, &b) - 0.2 * DEGREE_M).abs() < 1.0);
    }
}
