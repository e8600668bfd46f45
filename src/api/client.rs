//! Typed HTTP client for the hrms backend.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use reqwest::cookie::Jar;
use reqwest::{Client, Response, Url};
use serde_json::{Value, json};
use tracing::debug;

use super::envelope;
use super::session::SessionContext;
use crate::config::ServerConfig;
use crate::error::{AppError, Result};
use crate::models::{
    AttendanceRecord, AttendanceTimesUpdate, BulkEditResult, CheckAction, Coordinate,
    DayStatistics, GeoAttendanceReceipt, MutationAck, OfficeLocation, WfhEmployee, WfhInfo,
    wire_time,
};

/// Frappe HRMS API client.
///
/// Calls whitelisted methods under `/api/method/hrms.api.*`,
/// authenticating with the session's `sid` cookie. Every response
/// goes through the envelope normalization in [`super::envelope`], so
/// callers only see the typed models.
#[derive(Debug)]
pub struct HrmsClient {
    client: Client,
    base_url: String,
    session: SessionContext,
}

impl HrmsClient {
    /// Create a client for the given backend.
    ///
    /// # Arguments
    /// * `base_url` - Server URL (e.g., "https://hr.example.com")
    /// * `session` - Session to authenticate with
    /// * `timeout` - Overall per-request timeout
    pub fn new(base_url: &str, session: SessionContext, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let url = Url::parse(&base_url)
            .map_err(|e| AppError::config(format!("invalid server URL '{base_url}': {e}")))?;

        let jar = Arc::new(Jar::default());
        jar.add_cookie_str(&session.cookie(), &url);
        let client = Client::builder()
            .cookie_provider(jar)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    /// Create a client from the server section of the app config.
    pub fn from_config(config: &ServerConfig, session: SessionContext) -> Result<Self> {
        Self::new(
            &config.base_url,
            session,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn method_url(&self, method: &str) -> String {
        format!("{base}/api/method/hrms.api.{method}", base = self.base_url)
    }

    async fn get_json(&self, method: &str, query: &[(&str, String)]) -> Result<Value> {
        debug!(method, "GET hrms.api");
        let response = self
            .client
            .get(self.method_url(method))
            .query(query)
            .send()
            .await?;
        Self::into_body(response).await
    }

    async fn post_json(&self, method: &str, payload: &Value) -> Result<Value> {
        debug!(method, "POST hrms.api");
        let response = self
            .client
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await?;
        Self::into_body(response).await
    }

    async fn into_body(response: Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(envelope::parse_error(status, &text));
        }
        serde_json::from_str(&text)
            .map_err(|e| AppError::parse(format!("invalid JSON from backend: {e}")))
    }

    /// Fetch the geofence assigned to an employee.
    pub async fn office_location(&self, employee: &str) -> Result<OfficeLocation> {
        let body = self
            .get_json("get_office_location", &[("employee", employee.to_string())])
            .await?;
        envelope::typed(body)
    }

    /// Fetch the session user's employee link, WFH eligibility and
    /// admin flag.
    pub async fn user_wfh_info(&self) -> Result<WfhInfo> {
        let body = self.get_json("get_user_wfh_info", &[]).await?;
        envelope::typed(body)
    }

    /// Record a check-in/out. WFH actions carry `(0,0)` coordinates
    /// and `work_type = "WFH"`; in-office actions carry the real
    /// device coordinates.
    pub async fn geo_attendance(
        &self,
        employee: &str,
        action: CheckAction,
        coordinate: Coordinate,
        work_type: Option<&str>,
    ) -> Result<GeoAttendanceReceipt> {
        let mut payload = json!({
            "employee": employee,
            "action": action.wire_name(),
            "latitude": coordinate.latitude,
            "longitude": coordinate.longitude,
        });
        if let Some(work_type) = work_type {
            payload["work_type"] = json!(work_type);
        }
        let body = self.post_json("geo_attendance", &payload).await?;
        envelope::typed(body)
    }

    /// All attendance rows for a date (cancelled records excluded
    /// server-side).
    pub async fn attendance_records_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>> {
        let body = self
            .get_json(
                "get_attendance_records_for_date",
                &[("date", date.to_string())],
            )
            .await?;
        envelope::typed_at(body, "attendance_records")
    }

    /// Rows with a check-in but no checkout for a date.
    pub async fn pending_checkouts(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        let body = self
            .get_json("get_pending_checkouts", &[("date", date.to_string())])
            .await?;
        envelope::typed_at(body, "pending_checkouts")
    }

    /// Attendance rows for one employee over an inclusive date range.
    pub async fn attendance_records(
        &self,
        employee: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>> {
        let body = self
            .get_json(
                "get_attendance_records",
                &[
                    ("employee", employee.to_string()),
                    ("start_date", start_date.to_string()),
                    ("end_date", end_date.to_string()),
                ],
            )
            .await?;
        envelope::typed_at(body, "data")
    }

    /// Set the checkout time of one record. Without an explicit time
    /// the backend applies its own end-of-day default.
    pub async fn manual_checkout(
        &self,
        attendance_id: &str,
        checkout_time: Option<NaiveDateTime>,
    ) -> Result<MutationAck> {
        let mut payload = json!({ "attendance_id": attendance_id });
        if let Some(ts) = checkout_time {
            payload["checkout_time"] = json!(wire_time::to_wire(&ts));
        }
        let body = self.post_json("manual_checkout", &payload).await?;
        envelope::typed(body)
    }

    /// Update check-in and/or check-out times of one record. Only the
    /// provided fields are sent.
    pub async fn update_attendance_times(
        &self,
        attendance_id: &str,
        check_in_time: Option<NaiveDateTime>,
        check_out_time: Option<NaiveDateTime>,
    ) -> Result<MutationAck> {
        let mut payload = json!({ "attendance_id": attendance_id });
        if let Some(ts) = check_in_time {
            payload["check_in_time"] = json!(wire_time::to_wire(&ts));
        }
        if let Some(ts) = check_out_time {
            payload["check_out_time"] = json!(wire_time::to_wire(&ts));
        }
        let body = self.post_json("update_attendance_times", &payload).await?;
        envelope::typed(body)
    }

    /// Checkout many records in one call. The backend applies the
    /// time per-row and reports per-row outcomes.
    pub async fn bulk_manual_checkout(
        &self,
        attendance_ids: &[String],
        default_checkout_time: Option<NaiveDateTime>,
    ) -> Result<BulkEditResult> {
        let mut payload = json!({ "attendance_ids": attendance_ids });
        if let Some(ts) = default_checkout_time {
            payload["default_checkout_time"] = json!(wire_time::to_wire(&ts));
        }
        let body = self.post_json("bulk_manual_checkout", &payload).await?;
        envelope::typed(body)
    }

    /// Apply per-row time updates in one call.
    pub async fn bulk_update_attendance_times(
        &self,
        updates: &[AttendanceTimesUpdate],
    ) -> Result<BulkEditResult> {
        let payload = json!({ "attendance_updates": updates });
        let body = self
            .post_json("bulk_update_attendance_times", &payload)
            .await?;
        envelope::typed(body)
    }

    /// Remove a record: submitted records are cancelled, drafts are
    /// deleted.
    pub async fn delete_attendance_record(
        &self,
        attendance_id: &str,
        reason: &str,
    ) -> Result<MutationAck> {
        let payload = json!({ "attendance_id": attendance_id, "reason": reason });
        let body = self.post_json("delete_attendance_record", &payload).await?;
        envelope::typed(body)
    }

    /// Day-level aggregate counters.
    pub async fn attendance_statistics_for_date(&self, date: NaiveDate) -> Result<DayStatistics> {
        let body = self
            .get_json(
                "get_attendance_statistics_for_date",
                &[("date", date.to_string())],
            )
            .await?;
        envelope::typed(body)
    }

    /// Active employees with their WFH eligibility flags.
    pub async fn employee_wfh_list(&self) -> Result<Vec<WfhEmployee>> {
        let body = self.get_json("get_employee_wfh_list", &[]).await?;
        envelope::typed(body)
    }

    /// Grant or revoke WFH eligibility for one employee.
    pub async fn toggle_wfh_eligibility(
        &self,
        employee_id: &str,
        wfh_eligible: bool,
    ) -> Result<MutationAck> {
        let payload = json!({ "employee_id": employee_id, "wfh_eligible": wfh_eligible });
        let body = self.post_json("toggle_wfh_eligibility", &payload).await?;
        envelope::typed(body)
    }
}
