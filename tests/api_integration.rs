//! Integration tests for Binsight API endpoints.
//!
//! These tests verify the full request/response cycle through the HTTP API.

use axum_test::TestServer;
use serde_json::json;

use binsight::api::{AppState, router};
use binsight::storage::Storage;

async fn create_test_server() -> TestServer {
    let storage = Storage::new("sqlite::memory:").await.unwrap();
    let app = router(AppState { storage });

    TestServer::new(app).unwrap()
}

async fn register_bin(server: &TestServer, id: &str, fill_level: i32) {
    server
        .post("/admin/bins")
        .json(&json!({
            "id": id,
            "name": format!("Bin {id}"),
            "fill_level": fill_level
        }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server().await;

    let response = server.get("/health").await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_register_and_list_bins() {
    let server = create_test_server().await;

    register_bin(&server, "BIN-001", 20).await;
    register_bin(&server, "BIN-002", 85).await;

    let response = server.get("/admin/bins").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["bins"][0]["id"], "BIN-001");
    assert_eq!(body["bins"][0]["status"], "active");
}

#[tokio::test]
async fn test_register_duplicate_bin_conflicts() {
    let server = create_test_server().await;

    register_bin(&server, "BIN-001", 20).await;

    let response = server
        .post("/admin/bins")
        .json(&json!({ "id": "BIN-001", "name": "Duplicate" }))
        .await;

    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_bins_status_filter() {
    let server = create_test_server().await;

    register_bin(&server, "BIN-001", 20).await;
    server
        .post("/admin/bins")
        .json(&json!({
            "id": "BIN-002",
            "name": "Bin BIN-002",
            "status": "maintenance"
        }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server.get("/admin/bins?status=maintenance").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["bins"][0]["id"], "BIN-002");
}

#[tokio::test]
async fn test_bins_invalid_status_filter() {
    let server = create_test_server().await;

    let response = server.get("/admin/bins?status=bogus").await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_patch_bin_clamps_fill_level() {
    let server = create_test_server().await;

    register_bin(&server, "BIN-001", 20).await;

    let response = server
        .patch("/admin/bins/BIN-001")
        .json(&json!({ "fill_level": 250 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["fill_level"], 100);
}

#[tokio::test]
async fn test_patch_unknown_bin() {
    let server = create_test_server().await;

    let response = server
        .patch("/admin/bins/BIN-404")
        .json(&json!({ "fill_level": 10 }))
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_bin_resets_fill() {
    let server = create_test_server().await;

    register_bin(&server, "BIN-001", 95).await;

    let response = server.post("/admin/bins/BIN-001/empty").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["fill_level"], 0);
    assert_eq!(body["status"], "active");
    assert!(!body["last_emptied_at"].is_null());
}

#[tokio::test]
async fn test_post_deposit() {
    let server = create_test_server().await;

    register_bin(&server, "BIN-001", 20).await;

    let response = server
        .post("/deposits")
        .json(&json!({
            "bin_id": "BIN-001",
            "user_id": "user-a",
            "points_earned": 25,
            "co2_saved": 1.2
        }))
        .await;

    response.assert_status(axum::http::StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_post_deposit_unknown_bin() {
    let server = create_test_server().await;

    let response = server
        .post("/deposits")
        .json(&json!({ "bin_id": "BIN-404", "points_earned": 25 }))
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_predictions_empty_fleet() {
    let server = create_test_server().await;

    let response = server.get("/admin/predictions").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["predictions"].as_array().unwrap().is_empty());
    assert_eq!(body["skipped_records"], 0);
}

#[tokio::test]
async fn test_predictions_rank_and_limit() {
    let server = create_test_server().await;

    // Freshly registered bins fall back to created_at as the reference
    // start, so the elapsed floor makes the rate equal the fill level:
    // 90% -> due in hours, 4% -> ~1 day, 1% -> ~4 days
    for (id, fill_level) in [("BIN-001", 1), ("BIN-002", 90), ("BIN-003", 4)] {
        register_bin(&server, id, fill_level).await;
    }

    let response = server.get("/admin/predictions?limit=2").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 2);
    assert_eq!(predictions[0]["bin_id"], "BIN-002");

    let first_days = predictions[0]["days_remaining"].as_i64().unwrap();
    let second_days = predictions[1]["days_remaining"].as_i64().unwrap();
    assert!(first_days <= second_days);
}

#[tokio::test]
async fn test_predictions_exclude_full_and_maintenance() {
    let server = create_test_server().await;

    register_bin(&server, "BIN-001", 100).await;
    server
        .post("/admin/bins")
        .json(&json!({
            "id": "BIN-002",
            "name": "Bin BIN-002",
            "status": "maintenance",
            "fill_level": 40
        }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server.get("/admin/predictions").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["predictions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_route_plan_etas() {
    let server = create_test_server().await;

    register_bin(&server, "BIN-001", 90).await;
    register_bin(&server, "BIN-002", 60).await;

    let response = server.get("/admin/route").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let stops = body["stops"].as_array().unwrap();
    assert_eq!(stops.len(), 2);
    assert_eq!(stops[0]["stop_number"], 1);
    assert_eq!(stops[0]["eta_minutes"], 15);
    assert_eq!(stops[1]["eta_minutes"], 30);
    assert_eq!(stops[0]["bin_id"], "BIN-001");
}

#[tokio::test]
async fn test_stats_empty_state() {
    let server = create_test_server().await;

    let response = server.get("/admin/stats").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["bins"]["total"], 0);
    assert_eq!(body["transactions"]["total"], 0);
    assert!(body["predictions"].as_array().unwrap().is_empty());
    assert_eq!(body["daily_activity"].as_array().unwrap().len(), 14);
}

#[tokio::test]
async fn test_full_workflow() {
    let server = create_test_server().await;

    // 1. Health check
    server.get("/health").await.assert_status_ok();

    // 2. Register a small fleet
    for (id, fill_level) in [("BIN-001", 85), ("BIN-002", 30), ("BIN-003", 92)] {
        register_bin(&server, id, fill_level).await;
    }

    // 3. Record deposits from two users
    for user in ["user-a", "user-b", "user-a"] {
        server
            .post("/deposits")
            .json(&json!({
                "bin_id": "BIN-002",
                "user_id": user,
                "points_earned": 25,
                "co2_saved": 1.5
            }))
            .await
            .assert_status(axum::http::StatusCode::ACCEPTED);
    }

    // 4. Stats reflect the fleet and the deposits
    let response = server.get("/admin/stats").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();

    assert_eq!(body["users"]["total"], 2);
    assert_eq!(body["bins"]["total"], 3);
    assert_eq!(body["transactions"]["total"], 3);
    assert_eq!(body["points"]["total"], 75);
    assert_eq!(body["alerts"]["critical"], 1); // BIN-003 at 92%
    assert_eq!(body["alerts"]["warning"], 1); // BIN-001 at 85%

    // Today's bucket carries all three deposits
    let daily = body["daily_activity"].as_array().unwrap();
    assert_eq!(daily.last().unwrap()["count"], 3);
    assert_eq!(daily.last().unwrap()["points_sum"], 75);

    // 5. Emptying the critical bin clears its alert
    server
        .post("/admin/bins/BIN-003/empty")
        .await
        .assert_status_ok();

    let body: serde_json::Value = server.get("/admin/stats").await.json();
    assert_eq!(body["alerts"]["critical"], 0);
}
