//! Geofence and check-in/out wire types.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Coordinates sent with WFH attendance; the backend ignores them
/// for geofence purposes when `work_type` is WFH.
pub const WFH_COORDINATE: Coordinate = Coordinate {
    latitude: 0.0,
    longitude: 0.0,
};

/// Position reported by the device location provider. Ephemeral,
/// requested per action and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DevicePosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl DevicePosition {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Office geofence as served by `get_office_location`. Owned by the
/// backend, read-only here, refetched per session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OfficeLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Geofence radius in meters.
    pub radius: f64,
}

impl OfficeLocation {
    pub fn center(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Live geofence state shown to the employee.
///
/// WFH wins over everything; an unknown office location means the
/// evaluation has not completed; a position fault forces `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeofenceStatus {
    /// Office location not yet known.
    Checking,
    /// Within the office geofence radius.
    Inside,
    /// Outside the office geofence radius.
    Outside,
    /// Position could not be acquired; retry via manual refresh.
    Error,
    /// Work-From-Home mode active; geofence bypassed.
    Wfh,
}

impl GeofenceStatus {
    /// Human-readable label for display and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Checking => "Checking location...",
            Self::Inside => "Inside office area",
            Self::Outside => "Outside office area",
            Self::Error => "Location error",
            Self::Wfh => "Work From Home",
        }
    }
}

impl std::fmt::Display for GeofenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Attendance action verbs accepted by `geo_attendance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckAction {
    CheckIn,
    CheckOut,
}

impl CheckAction {
    /// Exact wire value the backend validates against.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::CheckIn => "Check-In",
            Self::CheckOut => "Check-Out",
        }
    }
}

impl std::fmt::Display for CheckAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Successful `geo_attendance` reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoAttendanceReceipt {
    pub status: String,
    #[serde(default)]
    pub message: String,
    /// Name of the Geo Log document created for this action.
    #[serde(default)]
    pub geo_log: Option<String>,
    /// Name of the linked attendance record, when one was created.
    #[serde(default)]
    pub attendance: Option<String>,
}
