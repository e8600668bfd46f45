//! Geofenced check-in/out flow.
//!
//! Holds the office location, WFH eligibility, and the last acquired
//! device position, and gates every check-in/out locally before the
//! backend is contacted. Position refresh is always user-triggered;
//! nothing here retries on its own.

use chrono::Local;
use tracing::{debug, info, warn};

use crate::api::HrmsClient;
use crate::error::{AppError, Result};
use crate::geofence;
use crate::location::{self, LocationProvider, PositionRequest};
use crate::models::{
    AttendanceRecord, CheckAction, DevicePosition, GeoAttendanceReceipt, GeofenceStatus,
    OfficeLocation, WFH_COORDINATE, WfhInfo,
};

/// Live view of the geofence evaluation.
#[derive(Debug, Clone)]
pub struct GeofenceView {
    pub status: GeofenceStatus,
    pub wfh_active: bool,
    pub distance_m: Option<f64>,
    pub office: Option<OfficeLocation>,
    pub position: Option<DevicePosition>,
    pub position_error: Option<String>,
}

impl GeofenceView {
    /// One-line status suitable for display.
    pub fn summary(&self) -> String {
        match (self.status, self.distance_m, &self.office) {
            (GeofenceStatus::Inside | GeofenceStatus::Outside, Some(distance), Some(office)) => {
                format!(
                    "{} ({}m from office, radius {}m)",
                    self.status,
                    distance.round() as i64,
                    office.radius.round() as i64
                )
            }
            (GeofenceStatus::Error, _, _) => match &self.position_error {
                Some(reason) => format!("{}: {reason}", self.status),
                None => self.status.to_string(),
            },
            _ => self.status.to_string(),
        }
    }
}

/// Result of a performed check-in/out.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub receipt: GeoAttendanceReceipt,
    /// Today's attendance row after the action, when the re-fetch
    /// succeeded and a row exists.
    pub today: Option<AttendanceRecord>,
}

/// Check-in/out flow for one employee session.
pub struct CheckInFlow<'a> {
    api: &'a HrmsClient,
    provider: &'a dyn LocationProvider,
    request: PositionRequest,
    employee_id: String,
    wfh_info: WfhInfo,
    wfh_active: bool,
    office: Option<OfficeLocation>,
    position: Option<DevicePosition>,
    position_error: Option<String>,
    status: GeofenceStatus,
}

impl<'a> CheckInFlow<'a> {
    /// Open the flow: resolve the employee, load WFH eligibility and
    /// the office geofence.
    ///
    /// A missing or unreadable office location is not fatal. The
    /// status stays `Checking`, which blocks in-office actions but
    /// leaves WFH check-in available.
    pub async fn open(
        api: &'a HrmsClient,
        provider: &'a dyn LocationProvider,
        request: PositionRequest,
    ) -> Result<CheckInFlow<'a>> {
        let wfh_info = api.user_wfh_info().await?;
        let employee_id = api
            .session()
            .employee_id
            .clone()
            .or_else(|| wfh_info.employee_id.clone())
            .ok_or_else(|| AppError::validation("no employee linked to this session"))?;

        let office = match api.office_location(&employee_id).await {
            Ok(office) => Some(office),
            Err(e) => {
                warn!("office location unavailable: {e}");
                None
            }
        };

        debug!(
            employee = %employee_id,
            wfh_eligible = wfh_info.wfh_eligible,
            has_office = office.is_some(),
            "check-in flow ready"
        );

        let mut flow = Self {
            api,
            provider,
            request,
            employee_id,
            wfh_info,
            wfh_active: false,
            office,
            position: None,
            position_error: None,
            status: GeofenceStatus::Checking,
        };
        flow.recompute();
        Ok(flow)
    }

    pub fn employee_id(&self) -> &str {
        &self.employee_id
    }

    pub fn wfh_info(&self) -> &WfhInfo {
        &self.wfh_info
    }

    /// Current evaluation without touching the network or the
    /// location provider.
    pub fn view(&self) -> GeofenceView {
        GeofenceView {
            status: self.status,
            wfh_active: self.wfh_active,
            distance_m: self.distance(),
            office: self.office,
            position: self.position,
            position_error: self.position_error.clone(),
        }
    }

    /// Acquire a fresh position fix and re-evaluate the geofence.
    ///
    /// Location faults are recoverable: the status becomes `Error`
    /// and the caller can refresh again. Anything else propagates.
    pub async fn refresh(&mut self) -> Result<GeofenceView> {
        match location::acquire_position(self.provider, &self.request).await {
            Ok(position) => {
                self.position = Some(position);
                self.position_error = None;
            }
            Err(e) if e.is_location_fault() => {
                self.position = None;
                self.position_error = Some(e.to_string());
            }
            Err(e) => return Err(e),
        }
        self.recompute();
        Ok(self.view())
    }

    /// Toggle WFH mode. Activation requires backend-granted
    /// eligibility; deactivation is always allowed.
    pub fn set_wfh(&mut self, active: bool) -> Result<GeofenceView> {
        if active && !self.wfh_info.wfh_eligible {
            return Err(AppError::validation("You are not eligible for WFH."));
        }
        self.wfh_active = active;
        self.recompute();
        Ok(self.view())
    }

    /// Today's attendance row for this employee, if one exists.
    pub async fn today(&self) -> Result<Option<AttendanceRecord>> {
        let today = Local::now().date_naive();
        let records = self
            .api
            .attendance_records(&self.employee_id, today, today)
            .await?;
        Ok(records.into_iter().next())
    }

    /// Perform a check-in/out.
    ///
    /// The geofence gate runs first and rejects without any network
    /// call. WFH actions are sent with `(0,0)` coordinates and
    /// `work_type = "WFH"`; in-office actions carry the last acquired
    /// device position. On success today's row is re-fetched so the
    /// caller renders backend truth, not an optimistic merge.
    pub async fn perform(&mut self, action: CheckAction) -> Result<CheckOutcome> {
        geofence::ensure_permitted(
            action,
            self.wfh_active,
            self.status,
            self.distance(),
            self.office.as_ref(),
        )?;

        let (coordinate, work_type) = if self.wfh_active {
            (WFH_COORDINATE, Some("WFH"))
        } else {
            let position = self.position.ok_or_else(|| {
                AppError::validation(
                    "Unable to determine your location. Refresh your location and try again.",
                )
            })?;
            (position.coordinate(), None)
        };

        let receipt = self
            .api
            .geo_attendance(&self.employee_id, action, coordinate, work_type)
            .await?;
        info!(
            employee = %self.employee_id,
            action = %action,
            wfh = self.wfh_active,
            "attendance recorded"
        );

        // The action already succeeded; a failed re-fetch must not
        // turn it into an error.
        let today = match self.today().await {
            Ok(row) => row,
            Err(e) => {
                warn!("today's attendance re-fetch failed: {e}");
                None
            }
        };

        Ok(CheckOutcome { receipt, today })
    }

    fn distance(&self) -> Option<f64> {
        match (&self.position, &self.office) {
            (Some(position), Some(office)) => {
                Some(geofence::distance_to_office(position, office))
            }
            _ => None,
        }
    }

    fn recompute(&mut self) {
        self.status = geofence::evaluate_status(
            self.wfh_active,
            self.office.as_ref(),
            self.position.as_ref(),
            self.position_error.as_deref(),
        );
    }
}
