//! Attendance record model and reconciliation result types.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Serde adapter for the backend's timestamp strings.
///
/// The wire format is `YYYY-MM-DD HH:mm:ss` local time with no zone
/// marker and must be emitted byte-exact; some deployments append
/// fractional seconds on read, which parsing tolerates and
/// serialization never produces.
pub mod wire_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";
    const PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

    /// Format a timestamp the way the backend expects it.
    pub fn to_wire(value: &NaiveDateTime) -> String {
        value.format(FORMAT).to_string()
    }

    /// Parse a backend timestamp string, with or without fractional
    /// seconds.
    pub fn from_wire(raw: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(raw, PARSE_FORMAT).ok()
    }

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&to_wire(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => from_wire(s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {s}"))),
        }
    }
}

/// One attendance row as returned by the listing endpoints.
///
/// `custom_out_time_copy` shadows the checkout time for the backend's
/// own workflow automation; a row counts as checked out when either
/// field is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Backend document name, used as the record id in every call.
    #[serde(rename = "name")]
    pub id: String,
    #[serde(rename = "employee")]
    pub employee_id: String,
    #[serde(default)]
    pub employee_name: String,
    #[serde(default, with = "wire_time")]
    pub in_time: Option<NaiveDateTime>,
    #[serde(default, with = "wire_time")]
    pub out_time: Option<NaiveDateTime>,
    #[serde(default, with = "wire_time")]
    pub custom_out_time_copy: Option<NaiveDateTime>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub attendance_date: Option<NaiveDate>,
    /// 0 = draft/editable, 1 = submitted/locked. Cancelled records
    /// (2) are filtered out server-side.
    #[serde(default)]
    pub docstatus: u8,
    #[serde(default)]
    pub working_hours: Option<f64>,
}

impl AttendanceRecord {
    /// Checkout time as the backend treats it: `out_time`, falling
    /// back to the workflow shadow copy.
    pub fn effective_out_time(&self) -> Option<NaiveDateTime> {
        self.out_time.or(self.custom_out_time_copy)
    }

    /// Submitted records are locked and can only be cancelled, not
    /// deleted.
    pub fn is_submitted(&self) -> bool {
        self.docstatus == 1
    }

    /// Derive the completion state. Leave status overrides the
    /// time-based checks.
    pub fn completion_state(&self) -> CompletionState {
        if self.status == "On Leave" {
            return CompletionState::OnLeave;
        }
        if self.in_time.is_none() {
            return CompletionState::NoCheckIn;
        }
        if self.effective_out_time().is_none() {
            return CompletionState::MissingCheckOut;
        }
        CompletionState::Complete
    }
}

/// Per-record completeness, derived from the record's times and
/// status. Progression is `NoCheckIn` to `MissingCheckOut` to
/// `Complete`; `OnLeave` is orthogonal and absorbing, and the only way
/// back from `Complete` is delete/cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    OnLeave,
    NoCheckIn,
    MissingCheckOut,
    Complete,
}

impl CompletionState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OnLeave => "On Leave",
            Self::NoCheckIn => "No Check-In",
            Self::MissingCheckOut => "Missing Check-Out",
            Self::Complete => "Complete",
        }
    }
}

impl std::fmt::Display for CompletionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-row outcome inside a bulk reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkRowOutcome {
    #[serde(default)]
    pub attendance_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Aggregated result of a bulk operation.
///
/// Partial failure is an expected outcome, not an error: both counts
/// are always carried and must both be shown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkEditResult {
    pub successful: u32,
    pub failed: u32,
    #[serde(default)]
    pub successful_updates: Vec<BulkRowOutcome>,
    #[serde(default)]
    pub failed_updates: Vec<BulkRowOutcome>,
}

impl BulkEditResult {
    /// True when the reply mixes successes and failures.
    pub fn is_partial(&self) -> bool {
        self.successful > 0 && self.failed > 0
    }

    /// One-line result for logs and the terminal. Both counts are
    /// always present so a partial result can never read as a clean
    /// success or failure.
    pub fn summary(&self) -> String {
        format!("{} succeeded, {} failed", self.successful, self.failed)
    }
}

/// One row of a `bulk_update_attendance_times` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceTimesUpdate {
    pub attendance_id: String,
    #[serde(default, with = "wire_time", skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<NaiveDateTime>,
    #[serde(default, with = "wire_time", skip_serializing_if = "Option::is_none")]
    pub check_out_time: Option<NaiveDateTime>,
}

/// Ack shape shared by the single-record mutation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationAck {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub attendance_id: Option<String>,
    #[serde(default)]
    pub checkout_time: Option<String>,
}

/// Aggregate counters from `get_attendance_statistics_for_date`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceCounts {
    pub total_records: u32,
    pub has_checkin: u32,
    pub has_checkout: u32,
    pub missing_checkout: u32,
    pub missing_checkin: u32,
    pub submitted_records: u32,
    pub draft_records: u32,
    pub complete_records: u32,
}

/// Day-level attendance summary for the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayStatistics {
    pub date: NaiveDate,
    pub total_employees: u32,
    pub working_employees: u32,
    pub employees_on_holiday: u32,
    #[serde(rename = "attendance_statistics")]
    pub counts: AttendanceCounts,
    #[serde(default)]
    pub attendance_rate: f64,
}
