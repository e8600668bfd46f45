//! Data models for geofencing, attendance rows, and WFH administration.

pub mod attendance;
pub mod employee;
pub mod geo;

pub use attendance::{
    AttendanceCounts, AttendanceRecord, AttendanceTimesUpdate, BulkEditResult, BulkRowOutcome,
    CompletionState, DayStatistics, MutationAck, wire_time,
};
pub use employee::{WfhEmployee, WfhInfo};
pub use geo::{
    CheckAction, Coordinate, DevicePosition, GeoAttendanceReceipt, GeofenceStatus, OfficeLocation,
    WFH_COORDINATE,
};
