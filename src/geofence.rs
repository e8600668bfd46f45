//! Geofence evaluation: great-circle distance, status derivation, and
//! the local gate applied before any check-in/out call.

use crate::error::{AppError, Result};
use crate::models::{CheckAction, Coordinate, DevicePosition, GeofenceStatus, OfficeLocation};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates in meters.
///
/// Haversine with the mean Earth radius:
/// `a = sin²(Δφ/2) + cosφ1·cosφ2·sin²(Δλ/2)`,
/// `d = 2R·atan2(√a, √(1−a))`.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Convenience: distance from a device position to the office center.
pub fn distance_to_office(position: &DevicePosition, office: &OfficeLocation) -> f64 {
    distance_meters(position.coordinate(), office.center())
}

/// Derive the live geofence status.
///
/// Precedence: active WFH wins over everything; without an office
/// location the evaluation is still `Checking`; a position fault
/// forces `Error`; otherwise `Inside` iff the distance to the office
/// center is within the radius.
pub fn evaluate_status(
    wfh_active: bool,
    office: Option<&OfficeLocation>,
    position: Option<&DevicePosition>,
    position_error: Option<&str>,
) -> GeofenceStatus {
    if wfh_active {
        return GeofenceStatus::Wfh;
    }
    let Some(office) = office else {
        return GeofenceStatus::Checking;
    };
    if position_error.is_some() {
        return GeofenceStatus::Error;
    }
    let Some(position) = position else {
        return GeofenceStatus::Checking;
    };
    if distance_to_office(position, office) <= office.radius {
        GeofenceStatus::Inside
    } else {
        GeofenceStatus::Outside
    }
}

/// Local gate for a check-in/out request. Runs before any network
/// call; a rejection here never reaches the backend.
///
/// WFH bypasses the geofence entirely. `Outside` is rejected with a
/// message carrying both the actual distance and the required radius,
/// rounded to whole meters. `Checking`/`Error` are rejected with a
/// retry hint.
pub fn ensure_permitted(
    action: CheckAction,
    wfh_active: bool,
    status: GeofenceStatus,
    distance: Option<f64>,
    office: Option<&OfficeLocation>,
) -> Result<()> {
    if wfh_active {
        return Ok(());
    }
    match status {
        GeofenceStatus::Inside | GeofenceStatus::Wfh => Ok(()),
        GeofenceStatus::Outside => match (distance, office) {
            (Some(distance), Some(office)) => Err(AppError::validation(format!(
                "You are {}m away from the office. You must be within {}m to {}.",
                distance.round() as i64,
                office.radius.round() as i64,
                match action {
                    CheckAction::CheckIn => "check in",
                    CheckAction::CheckOut => "check out",
                },
            ))),
            _ => Err(AppError::validation("You are outside the office geofence.")),
        },
        GeofenceStatus::Checking | GeofenceStatus::Error => Err(AppError::validation(
            "Unable to determine your location. Refresh your location and try again.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate {
            latitude,
            longitude,
        }
    }

    fn office() -> OfficeLocation {
        OfficeLocation {
            latitude: 12.9716,
            longitude: 77.5946,
            radius: 200.0,
        }
    }

    /// Device position a given distance due north of the office.
    fn position_north_of_office(meters: f64) -> DevicePosition {
        let delta_deg = (meters / EARTH_RADIUS_M).to_degrees();
        DevicePosition {
            latitude: office().latitude + delta_deg,
            longitude: office().longitude,
        }
    }

    #[test]
    fn test_distance_zero_for_same_point() {
        let a = coord(12.9716, 77.5946);
        assert_eq!(distance_meters(a, a), 0.0);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = coord(12.9716, 77.5946);
        let b = coord(13.0827, 80.2707);
        let ab = distance_meters(a, b);
        let ba = distance_meters(b, a);
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn test_distance_one_millidegree_latitude_at_equator() {
        // 0.001 deg of latitude is ~111.19 m of arc
        let d = distance_meters(coord(0.0, 0.0), coord(0.001, 0.0));
        let expected = 111.195;
        assert!((d - expected).abs() / expected < 0.01, "got {d}");
    }

    #[test]
    fn test_wfh_wins_regardless_of_other_inputs() {
        let pos = position_north_of_office(5000.0);
        assert_eq!(
            evaluate_status(true, Some(&office()), Some(&pos), Some("denied")),
            GeofenceStatus::Wfh
        );
        assert_eq!(evaluate_status(true, None, None, None), GeofenceStatus::Wfh);
    }

    #[test]
    fn test_missing_office_means_checking() {
        let pos = position_north_of_office(10.0);
        assert_eq!(
            evaluate_status(false, None, Some(&pos), None),
            GeofenceStatus::Checking
        );
    }

    #[test]
    fn test_position_error_forces_error() {
        assert_eq!(
            evaluate_status(false, Some(&office()), None, Some("timeout")),
            GeofenceStatus::Error
        );
    }

    #[test]
    fn test_pending_position_is_still_checking() {
        assert_eq!(
            evaluate_status(false, Some(&office()), None, None),
            GeofenceStatus::Checking
        );
    }

    #[test]
    fn test_inside_iff_within_radius() {
        let near = position_north_of_office(150.0);
        let far = position_north_of_office(250.0);
        assert_eq!(
            evaluate_status(false, Some(&office()), Some(&near), None),
            GeofenceStatus::Inside
        );
        assert_eq!(
            evaluate_status(false, Some(&office()), Some(&far), None),
            GeofenceStatus::Outside
        );
    }

    #[test]
    fn test_boundary_distance_counts_as_inside() {
        let pos = position_north_of_office(100.0);
        let exact = OfficeLocation {
            radius: distance_to_office(&pos, &office()),
            ..office()
        };
        assert_eq!(
            evaluate_status(false, Some(&exact), Some(&pos), None),
            GeofenceStatus::Inside
        );
    }

    #[test]
    fn test_gate_allows_inside_and_wfh() {
        assert!(
            ensure_permitted(
                CheckAction::CheckIn,
                false,
                GeofenceStatus::Inside,
                Some(150.0),
                Some(&office()),
            )
            .is_ok()
        );
        // WFH bypasses even a hard position failure
        assert!(
            ensure_permitted(
                CheckAction::CheckOut,
                true,
                GeofenceStatus::Wfh,
                None,
                None
            )
            .is_ok()
        );
    }

    #[test]
    fn test_gate_outside_cites_both_distances() {
        let far = position_north_of_office(250.0);
        let distance = distance_to_office(&far, &office());
        let err = ensure_permitted(
            CheckAction::CheckIn,
            false,
            GeofenceStatus::Outside,
            Some(distance),
            Some(&office()),
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("250"), "missing actual distance: {message}");
        assert!(message.contains("200"), "missing radius: {message}");
    }

    #[test]
    fn test_gate_blocks_unknown_location() {
        for status in [GeofenceStatus::Checking, GeofenceStatus::Error] {
            let err =
                ensure_permitted(CheckAction::CheckIn, false, status, None, None).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
            assert!(err.to_string().contains("determine your location"));
        }
    }
}
