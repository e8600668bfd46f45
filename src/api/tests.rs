//! Wire-level tests for the HRMS client.
//!
//! Each test stands up a mock backend and asserts the exact request
//! shape or the mapping of a reply into typed models and errors.

use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{HrmsClient, SessionContext};
use crate::error::AppError;
use crate::models::{CheckAction, Coordinate, WFH_COORDINATE};

fn api_path(name: &str) -> String {
    format!("/api/method/hrms.api.{name}")
}

fn client_for(server: &MockServer) -> HrmsClient {
    HrmsClient::new(
        &server.uri(),
        SessionContext::new("test-sid"),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
}

#[tokio::test]
async fn test_session_cookie_attached_to_every_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("get_user_wfh_info")))
        .and(header("cookie", "sid=test-sid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "is_admin": false, "wfh_eligible": true }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let info = client_for(&server).user_wfh_info().await.unwrap();
    assert!(info.wfh_eligible);
}

#[tokio::test]
async fn test_office_location_sends_employee_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("get_office_location")))
        .and(query_param("employee", "HR-EMP-00001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "latitude": 12.9716, "longitude": 77.5946, "radius": 200.0 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let office = client_for(&server)
        .office_location("HR-EMP-00001")
        .await
        .unwrap();
    assert_eq!(office.radius, 200.0);
}

#[tokio::test]
async fn test_geo_attendance_office_body_has_no_work_type() {
    let server = MockServer::start().await;
    // Exact body match: a work_type field would fail it.
    Mock::given(method("POST"))
        .and(path(api_path("geo_attendance")))
        .and(body_json(json!({
            "employee": "HR-EMP-00001",
            "action": "Check-Out",
            "latitude": 12.9716,
            "longitude": 77.5946
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "status": "Approved", "message": "Check-Out Successfully" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let coordinate = Coordinate {
        latitude: 12.9716,
        longitude: 77.5946,
    };
    let receipt = client_for(&server)
        .geo_attendance("HR-EMP-00001", CheckAction::CheckOut, coordinate, None)
        .await
        .unwrap();
    assert_eq!(receipt.status, "Approved");
}

#[tokio::test]
async fn test_geo_attendance_wfh_body_is_exact() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("geo_attendance")))
        .and(body_json(json!({
            "employee": "HR-EMP-00001",
            "action": "Check-In",
            "latitude": 0.0,
            "longitude": 0.0,
            "work_type": "WFH"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "status": "Approved", "message": "Check-In Successfully" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .geo_attendance(
            "HR-EMP-00001",
            CheckAction::CheckIn,
            WFH_COORDINATE,
            Some("WFH"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_manual_checkout_omits_missing_time() {
    let server = MockServer::start().await;
    // Without an explicit time the field must be absent, not null,
    // so the backend applies its own default.
    Mock::given(method("POST"))
        .and(path(api_path("manual_checkout")))
        .and(body_json(json!({ "attendance_id": "HR-ATT-0042" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "status": "success", "message": "Checkout time added" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client_for(&server)
        .manual_checkout("HR-ATT-0042", None)
        .await
        .unwrap();
    assert_eq!(ack.status, "success");
}

#[tokio::test]
async fn test_delete_posts_id_and_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("delete_attendance_record")))
        .and(body_json(json!({
            "attendance_id": "HR-ATT-0042",
            "reason": "Duplicate entry"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "status": "success", "message": "Attendance cancelled" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .delete_attendance_record("HR-ATT-0042", "Duplicate entry")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_toggle_wfh_posts_flag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("toggle_wfh_eligibility")))
        .and(body_json(json!({
            "employee_id": "HR-EMP-00012",
            "wfh_eligible": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "status": "success", "message": "WFH eligibility enabled" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .toggle_wfh_eligibility("HR-EMP-00012", true)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_remote_error_surfaces_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api_path("geo_attendance")))
        .respond_with(ResponseTemplate::new(417).set_body_json(json!({
            "_server_messages": "[\"{\\\"message\\\": \\\"Employee has already checked in today\\\"}\"]",
            "exception": "frappe.exceptions.ValidationError: Employee has already checked in today",
            "exc_type": "ValidationError"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .geo_attendance(
            "HR-EMP-00001",
            CheckAction::CheckIn,
            WFH_COORDINATE,
            Some("WFH"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Remote(_)));
    assert_eq!(err.to_string(), "Employee has already checked in today");
}

#[tokio::test]
async fn test_authentication_error_becomes_session_expired() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("get_user_wfh_info")))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "exc_type": "AuthenticationError",
            "exception": "frappe.exceptions.AuthenticationError"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).user_wfh_info().await.unwrap_err();
    assert!(matches!(err, AppError::SessionExpired));
}

#[tokio::test]
async fn test_date_listing_sends_date_and_unwraps_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("get_attendance_records_for_date")))
        .and(query_param("date", "2024-03-11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "attendance_records": [{
                    "name": "HR-ATT-0001",
                    "employee": "HR-EMP-00001",
                    "employee_name": "Asha Rao",
                    "in_time": "2024-03-11 09:05:00",
                    "out_time": null,
                    "status": "Present",
                    "docstatus": 1
                }],
                "total_records": 1,
                "date": "2024-03-11"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rows = client_for(&server)
        .attendance_records_for_date(date())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "HR-ATT-0001");
    assert!(rows[0].is_submitted());
}

#[tokio::test]
async fn test_employee_range_listing_parses_data_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("get_attendance_records")))
        .and(query_param("employee", "HR-EMP-00001"))
        .and(query_param("start_date", "2024-03-11"))
        .and(query_param("end_date", "2024-03-11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "status": "success",
                "data": [{
                    "name": "HR-ATT-0001",
                    "employee": "HR-EMP-00001",
                    "employee_name": "Asha Rao",
                    "in_time": "2024-03-11 09:05:00",
                    "out_time": "2024-03-11 18:02:11",
                    "status": "Present",
                    "docstatus": 0
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rows = client_for(&server)
        .attendance_records("HR-EMP-00001", date(), date())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].effective_out_time().is_some());
}

#[tokio::test]
async fn test_statistics_parse_full_shape() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("get_attendance_statistics_for_date")))
        .and(query_param("date", "2024-03-11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "date": "2024-03-11",
                "total_employees": 42,
                "working_employees": 40,
                "employees_on_holiday": 2,
                "attendance_statistics": {
                    "total_records": 38,
                    "has_checkin": 36,
                    "has_checkout": 30,
                    "missing_checkout": 6,
                    "missing_checkin": 2,
                    "submitted_records": 25,
                    "draft_records": 13,
                    "complete_records": 30
                },
                "attendance_rate": 95.0
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let stats = client_for(&server)
        .attendance_statistics_for_date(date())
        .await
        .unwrap();
    assert_eq!(stats.total_employees, 42);
    assert_eq!(stats.counts.missing_checkout, 6);
    assert_eq!(stats.attendance_rate, 95.0);
}

#[tokio::test]
async fn test_wfh_list_accepts_integer_flags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("get_employee_wfh_list")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": [
                { "name": "HR-EMP-00001", "employee_name": "Asha Rao", "custom_wfh_eligible": 1, "status": "Active" },
                { "name": "HR-EMP-00002", "employee_name": "Ravi Kumar", "custom_wfh_eligible": 0, "status": "Active" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let roster = client_for(&server).employee_wfh_list().await.unwrap();
    assert_eq!(roster.len(), 2);
    assert!(roster[0].wfh_eligible);
    assert!(!roster[1].wfh_eligible);
}

#[tokio::test]
async fn test_non_json_success_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("get_user_wfh_info")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login page</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).user_wfh_info().await.unwrap_err();
    assert!(matches!(err, AppError::Parse(_)));
}

#[tokio::test]
async fn test_trailing_slash_base_url_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api_path("get_user_wfh_info")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "is_admin": true, "wfh_eligible": false }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = HrmsClient::new(
        &format!("{}/", server.uri()),
        SessionContext::new("test-sid"),
        Duration::from_secs(5),
    )
    .unwrap();
    api.user_wfh_info().await.unwrap();
}

#[tokio::test]
async fn test_invalid_base_url_rejected() {
    let err = HrmsClient::new(
        "not a url",
        SessionContext::new("test-sid"),
        Duration::from_secs(5),
    )
    .unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}
