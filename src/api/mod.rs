//! Frappe HRMS HTTP/JSON API client.
//!
//! Speaks to whitelisted methods under `/api/method/hrms.api.*`,
//! authenticating with an injected session cookie and normalizing the
//! backend's response envelopes into the typed models.
//!
//! # Example
//!
//! ```ignore
//! use geo_attendance::api::{HrmsClient, SessionContext};
//! use std::time::Duration;
//!
//! let session = SessionContext::new(sid).with_employee("HR-EMP-00001");
//! let client = HrmsClient::new("https://hr.example.com", session, Duration::from_secs(30))?;
//! let office = client.office_location("HR-EMP-00001").await?;
//! ```

mod client;
mod envelope;
mod session;

#[cfg(test)]
mod tests;

pub use client::HrmsClient;
pub use session::SessionContext;
