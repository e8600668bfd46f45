//! Employee-facing WFH eligibility types.

use serde::{Deserialize, Serialize};

/// Session-scoped profile from `get_user_wfh_info`.
///
/// `employee_id` is `None` when the logged-in user has no Employee
/// record linked; such users can browse but not mark attendance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WfhInfo {
    #[serde(default)]
    pub is_admin: bool,
    /// Backend emits the Check field as 1 when set, false otherwise.
    #[serde(default, deserialize_with = "int_bool")]
    pub wfh_eligible: bool,
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
}

/// One row of the admin WFH roster from `get_employee_wfh_list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WfhEmployee {
    /// Employee document name.
    #[serde(rename = "name")]
    pub id: String,
    #[serde(default)]
    pub employee_name: String,
    /// Backend stores the flag as 0/1.
    #[serde(rename = "custom_wfh_eligible", default, deserialize_with = "int_bool")]
    pub wfh_eligible: bool,
    #[serde(default)]
    pub status: String,
}

/// Accepts 0/1, true/false, or null for legacy rows.
fn int_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => b,
        Some(serde_json::Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
        _ => false,
    })
}
