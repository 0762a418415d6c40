use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

use bookdrive_core::allocations::AllocationMode;
use bookdrive_core::drives::{ContactInfo, NewDonationDrive};
use bookdrive_core::schools::NewSchool;
use bookdrive_core::users::{NewUser, UserRole};
use bookdrive_server::{api::app_router, build_state, config::Config, AppState};

async fn build_test_app() -> (Router, Arc<AppState>, TempDir) {
    let tmp = tempdir().unwrap();
    let config = Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        db_path: tmp.path().join("test.db").to_string_lossy().to_string(),
        cors_allow: vec!["*".to_string()],
        request_timeout: Duration::from_secs(30),
        allocation_mode: AllocationMode::Transactional,
        log_format: "text".to_string(),
    };
    let state = build_state(&config).await.unwrap();

    for (id, role) in [
        ("admin", UserRole::Admin),
        ("donor", UserRole::Donor),
        ("coordinator", UserRole::Coordinator),
    ] {
        state
            .user_service
            .create_user(NewUser {
                id: Some(id.to_string()),
                name: id.to_string(),
                email: format!("{}@example.com", id),
                phone: "555-0100".to_string(),
                role,
            })
            .await
            .unwrap();
    }
    let start = NaiveDate::from_ymd_opt(2024, 12, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    state
        .drive_service
        .create_drive(NewDonationDrive {
            id: Some("drive".to_string()),
            name: "December drive".to_string(),
            description: None,
            location: "Block C lobby".to_string(),
            gated_community: "Lake View".to_string(),
            coordinator: ContactInfo::default(),
            administrator_id: "admin".to_string(),
            start_date: start,
            end_date: None,
            instructions: None,
        })
        .await
        .unwrap();
    state
        .school_service
        .create_school(NewSchool {
            id: Some("school".to_string()),
            name: "Zilla Parishad School".to_string(),
            address: Default::default(),
            contact_person: ContactInfo::default(),
            school_type: Default::default(),
            students_count: 300,
        })
        .await
        .unwrap();

    (app_router(state.clone(), &config), state, tmp)
}

async fn send(app: &Router, method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn submit_donation(app: &Router, date: &str, books: Value) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/donations/submit",
        Some("donor"),
        Some(json!({ "driveId": "drive", "donationDate": date, "booksCount": books })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

#[tokio::test]
async fn health_is_public() {
    let (app, _state, _tmp) = build_test_app().await;
    let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn donate_then_allocate_oldest_first() {
    let (app, _state, _tmp) = build_test_app().await;
    submit_donation(&app, "2024-12-02T10:00:00", json!({"2-4": 5, "4-6": 0, "6-8": 0, "8-10": 0})).await;
    submit_donation(&app, "2024-12-05T10:00:00", json!({"2-4": 8, "4-6": 0, "6-8": 0, "8-10": 0})).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/allocations/allocate",
        Some("admin"),
        Some(json!({
            "driveId": "drive",
            "donorId": "donor",
            "schoolId": "school",
            "booksAllocated": {"2-4": "10"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["message"], "Books allocated successfully");
    assert_eq!(body["allocation"]["totalBooksAllocated"], 10);
    assert_eq!(body["allocation"]["donationsUsed"].as_array().unwrap().len(), 2);

    let (status, history) = send(
        &app,
        Method::GET,
        "/api/donor-allocations/my-allocations",
        Some("donor"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["summary"]["totalAllocated"], 10);

    let (_, donors) = send(
        &app,
        Method::GET,
        "/api/allocations/donors/by-drive/drive",
        Some("admin"),
        None,
    )
    .await;
    assert_eq!(donors[0]["available"]["2-4"], 3);
    assert_eq!(donors[0]["donor"]["badge"], "bronze");
    assert_eq!(donors[0]["donor"]["totalBooksDonatted"], 10);
}

#[tokio::test]
async fn allocation_errors_map_to_statuses() {
    let (app, _state, _tmp) = build_test_app().await;
    submit_donation(&app, "2024-12-02T10:00:00", json!({"2-4": 10, "4-6": 0, "6-8": 0, "8-10": 0})).await;

    let request = |books: Value, school: &str| {
        json!({ "driveId": "drive", "donorId": "donor", "schoolId": school, "booksAllocated": books })
    };

    let (status, _) = send(&app, Method::POST, "/api/allocations/allocate", None, Some(request(json!({"2-4": 1}), "school"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::POST, "/api/allocations/allocate", Some("donor"), Some(request(json!({"2-4": 1}), "school"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::POST, "/api/allocations/allocate", Some("admin"), Some(request(json!({"2-4": 11}), "school"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("2-4"), "{}", message);

    let (status, body) = send(&app, Method::POST, "/api/allocations/allocate", Some("admin"), Some(request(json!({}), "school"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "At least one book must be allocated");

    let (status, body) = send(&app, Method::POST, "/api/allocations/allocate", Some("admin"), Some(request(json!({"2-4": 1}), "nowhere"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "School not found");

    let (status, all) = send(&app, Method::GET, "/api/allocations/all", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn strict_donation_input_and_maintenance() {
    let (app, _state, _tmp) = build_test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/donations/submit",
        Some("donor"),
        Some(json!({ "driveId": "drive", "donationDate": "2024-12-02T10:00:00", "booksCount": {"2-4": 10, "4-6": 15} })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Missing category 6-8"));

    let donation = submit_donation(&app, "2024-12-02T10:00:00", json!({"2-4": 10, "4-6": 15, "6-8": 5, "8-10": 10})).await;
    let donation_id = donation["donation"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/donations/{}/status", donation_id),
        Some("donor"),
        Some(json!({ "status": "collected" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/donations/{}/status", donation_id),
        Some("coordinator"),
        Some(json!({ "status": "collected" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["donation"]["status"], "collected");
    assert!(!body["donation"]["collectedAt"].is_null());

    let (status, body) = send(&app, Method::POST, "/api/donations/recalculate-totals", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updatedDrives"], 1);

    let (status, report) = send(&app, Method::GET, "/api/maintenance/audit", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(report["drives"].as_array().unwrap().is_empty());

    let (status, body) = send(&app, Method::POST, "/api/maintenance/reconcile-donors", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updatedUsers"], 0);

    let (_, mine) = send(&app, Method::GET, "/api/donations/my-donations", Some("donor"), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
}
