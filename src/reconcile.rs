//! Administrative attendance reconciliation.
//!
//! Lists a day's attendance rows, applies single and bulk time
//! corrections, and removes records. Mutations return backend acks;
//! callers re-list the day afterwards instead of merging locally.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::api::HrmsClient;
use crate::error::{AppError, Result};
use crate::models::{
    AttendanceRecord, AttendanceTimesUpdate, BulkEditResult, DayStatistics, MutationAck,
    WfhEmployee,
};

/// Prefill hour for a single-row check-in edit.
const SINGLE_CHECK_IN_HOUR: u32 = 10;
/// Prefill hour for a single-row check-out edit.
const SINGLE_CHECK_OUT_HOUR: u32 = 19;
/// Prefill hour for bulk check-in edits.
const BULK_CHECK_IN_HOUR: u32 = 9;
/// Prefill hour for bulk check-out edits.
const BULK_CHECK_OUT_HOUR: u32 = 18;

/// Which rows to list for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Every attendance row for the date.
    All,
    /// Only rows still lacking a checkout, filtered server-side.
    PendingOnly,
}

/// Which timestamps a single-row edit touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    In,
    Out,
    Both,
}

/// Which timestamps a bulk edit applies to every target row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOperation {
    CheckIn,
    CheckOut,
    Both,
}

/// How a record leaves the system. Submitted rows are cancelled and
/// keep their audit trail; draft rows are deleted outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalKind {
    Cancel,
    Delete,
}

impl RemovalKind {
    pub fn for_docstatus(docstatus: u8) -> Self {
        if docstatus == 1 {
            Self::Cancel
        } else {
            Self::Delete
        }
    }

    pub fn for_record(record: &AttendanceRecord) -> Self {
        Self::for_docstatus(record.docstatus)
    }

    /// Verb for confirmation prompts.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::Delete => "delete",
        }
    }
}

/// Resolve the rows a bulk operation targets: the explicit selection
/// when there is one, otherwise every listed row.
pub fn resolve_targets(selection: &[String], listed: &[AttendanceRecord]) -> Vec<String> {
    if selection.is_empty() {
        listed.iter().map(|record| record.id.clone()).collect()
    } else {
        selection.to_vec()
    }
}

fn time_on(date: NaiveDate, hour: u32, minute: u32) -> Result<NaiveDateTime> {
    date.and_hms_opt(hour, minute, 0)
        .ok_or_else(|| AppError::validation(format!("invalid time {hour:02}:{minute:02}")))
}

/// Reconciliation service over one backend session.
pub struct ReconcileService<'a> {
    api: &'a HrmsClient,
}

impl<'a> ReconcileService<'a> {
    pub fn new(api: &'a HrmsClient) -> Self {
        Self { api }
    }

    /// Fetch the day's rows. This is the read path to re-invoke after
    /// every successful mutation.
    pub async fn list_for_date(
        &self,
        date: NaiveDate,
        mode: ListMode,
    ) -> Result<Vec<AttendanceRecord>> {
        let records = match mode {
            ListMode::All => self.api.attendance_records_for_date(date).await?,
            ListMode::PendingOnly => self.api.pending_checkouts(date).await?,
        };
        debug!(%date, count = records.len(), "listed attendance rows");
        Ok(records)
    }

    /// Correct one row's timestamps.
    ///
    /// Only the fields implied by `mode` are sent. Missing times are
    /// prefilled with 10:00 (check-in) and 19:00 (check-out) on the
    /// selected day. `Both` with neither time supplied is rejected
    /// before any call is made.
    pub async fn single_edit(
        &self,
        attendance_id: &str,
        date: NaiveDate,
        mode: EditMode,
        check_in_time: Option<NaiveDateTime>,
        check_out_time: Option<NaiveDateTime>,
    ) -> Result<MutationAck> {
        let ack = match mode {
            EditMode::In => {
                let in_time = match check_in_time {
                    Some(t) => t,
                    None => time_on(date, SINGLE_CHECK_IN_HOUR, 0)?,
                };
                self.api
                    .update_attendance_times(attendance_id, Some(in_time), None)
                    .await?
            }
            EditMode::Out => {
                let out_time = match check_out_time {
                    Some(t) => t,
                    None => time_on(date, SINGLE_CHECK_OUT_HOUR, 0)?,
                };
                self.api.manual_checkout(attendance_id, Some(out_time)).await?
            }
            EditMode::Both => {
                if check_in_time.is_none() && check_out_time.is_none() {
                    return Err(AppError::validation(
                        "supply a check-in time, a check-out time, or both",
                    ));
                }
                let in_time = match check_in_time {
                    Some(t) => t,
                    None => time_on(date, SINGLE_CHECK_IN_HOUR, 0)?,
                };
                let out_time = match check_out_time {
                    Some(t) => t,
                    None => time_on(date, SINGLE_CHECK_OUT_HOUR, 0)?,
                };
                self.api
                    .update_attendance_times(attendance_id, Some(in_time), Some(out_time))
                    .await?
            }
        };
        info!(attendance = %attendance_id, ?mode, "attendance times corrected");
        Ok(ack)
    }

    /// Apply one operation across every target row.
    ///
    /// Missing times are prefilled with 09:00 (check-in) and 18:00
    /// (check-out); these differ from the single-edit prefills.
    /// Checkout-only operations go through the bulk checkout endpoint;
    /// anything touching check-in goes through the bulk times update.
    /// The result carries both counts; partial failure is an expected
    /// outcome, not an error.
    pub async fn bulk_edit(
        &self,
        date: NaiveDate,
        target_ids: &[String],
        operation: BulkOperation,
        check_in_time: Option<NaiveDateTime>,
        check_out_time: Option<NaiveDateTime>,
    ) -> Result<BulkEditResult> {
        if target_ids.is_empty() {
            return Err(AppError::validation("No records selected"));
        }

        let result = match operation {
            BulkOperation::CheckOut => {
                let out_time = match check_out_time {
                    Some(t) => t,
                    None => time_on(date, BULK_CHECK_OUT_HOUR, 0)?,
                };
                self.api.bulk_manual_checkout(target_ids, Some(out_time)).await?
            }
            BulkOperation::CheckIn => {
                let in_time = match check_in_time {
                    Some(t) => t,
                    None => time_on(date, BULK_CHECK_IN_HOUR, 0)?,
                };
                let updates: Vec<AttendanceTimesUpdate> = target_ids
                    .iter()
                    .map(|id| AttendanceTimesUpdate {
                        attendance_id: id.clone(),
                        check_in_time: Some(in_time),
                        check_out_time: None,
                    })
                    .collect();
                self.api.bulk_update_attendance_times(&updates).await?
            }
            BulkOperation::Both => {
                let in_time = match check_in_time {
                    Some(t) => t,
                    None => time_on(date, BULK_CHECK_IN_HOUR, 0)?,
                };
                let out_time = match check_out_time {
                    Some(t) => t,
                    None => time_on(date, BULK_CHECK_OUT_HOUR, 0)?,
                };
                let updates: Vec<AttendanceTimesUpdate> = target_ids
                    .iter()
                    .map(|id| AttendanceTimesUpdate {
                        attendance_id: id.clone(),
                        check_in_time: Some(in_time),
                        check_out_time: Some(out_time),
                    })
                    .collect();
                self.api.bulk_update_attendance_times(&updates).await?
            }
        };

        info!(
            targets = target_ids.len(),
            successful = result.successful,
            failed = result.failed,
            "bulk edit finished"
        );
        Ok(result)
    }

    /// Apply a fixed checkout hour to one row. Same remote path as a
    /// checkout-only single edit.
    pub async fn quick_checkout(
        &self,
        attendance_id: &str,
        date: NaiveDate,
        hour: u32,
    ) -> Result<MutationAck> {
        let out_time = time_on(date, hour, 0)?;
        let ack = self.api.manual_checkout(attendance_id, Some(out_time)).await?;
        info!(attendance = %attendance_id, hour, "quick checkout applied");
        Ok(ack)
    }

    /// Remove one record. Whether this cancels or deletes depends on
    /// the record's docstatus; callers show [`RemovalKind`] to the
    /// admin and confirm before invoking this.
    pub async fn delete_or_cancel(&self, attendance_id: &str, reason: &str) -> Result<MutationAck> {
        if reason.trim().is_empty() {
            return Err(AppError::validation(
                "A reason is required to remove an attendance record",
            ));
        }
        let ack = self.api.delete_attendance_record(attendance_id, reason).await?;
        info!(attendance = %attendance_id, "attendance record removed");
        Ok(ack)
    }

    /// Day-level aggregate counters.
    pub async fn statistics(&self, date: NaiveDate) -> Result<DayStatistics> {
        self.api.attendance_statistics_for_date(date).await
    }

    /// Roster of employees with their WFH eligibility flags.
    pub async fn wfh_roster(&self) -> Result<Vec<WfhEmployee>> {
        self.api.employee_wfh_list().await
    }

    /// Grant or revoke one employee's WFH eligibility.
    pub async fn set_wfh_eligibility(
        &self,
        employee_id: &str,
        eligible: bool,
    ) -> Result<MutationAck> {
        let ack = self.api.toggle_wfh_eligibility(employee_id, eligible).await?;
        info!(employee = %employee_id, eligible, "WFH eligibility updated");
        Ok(ack)
    }
}
