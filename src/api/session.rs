//! Explicit session identity for backend calls.

/// Session identity injected into the client.
///
/// Frappe authenticates every call with a `sid` cookie. Obtaining and
/// storing that cookie is outside this crate; callers pass the value
/// in explicitly (flag, environment, keychain integration) so nothing
/// here reads ambient state.
#[derive(Debug, Clone)]
pub struct SessionContext {
    sid: String,
    /// Employee bound to the session, when already known. Left unset,
    /// it is resolved remotely via `get_user_wfh_info`.
    pub employee_id: Option<String>,
}

impl SessionContext {
    pub fn new(sid: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            employee_id: None,
        }
    }

    pub fn with_employee(mut self, employee_id: impl Into<String>) -> Self {
        self.employee_id = Some(employee_id.into());
        self
    }

    /// Cookie string attached to every request.
    pub(crate) fn cookie(&self) -> String {
        format!("sid={}", self.sid)
    }
}
