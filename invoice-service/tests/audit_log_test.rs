//! Audit trail integration tests for invoice-service.

mod common;

use chrono::DateTime;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn creation_entry_shows_the_created_marker() {
    let app = TestApp::spawn().await;

    let invoice = app.create_invoice(15.0, "pending").await;
    let id = invoice["id"].as_str().unwrap();

    let entries = app.audit_entries(id).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["old_status"], "---");
    assert_eq!(entries[0]["new_status"], "pending");
    assert!(entries[0]["username"].is_null());
}

#[tokio::test]
async fn authenticated_actor_is_recorded_on_each_entry() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/invoices"))
        .header("x-user-email", "auditor@example.com")
        .json(&json!({
            "customer_id": common::TEST_CUSTOMER_ID,
            "amount": 15.0,
            "status": "pending",
        }))
        .send()
        .await
        .expect("Failed to create invoice");
    assert_eq!(response.status(), 201);
    let invoice: serde_json::Value = response.json().await.expect("Invalid invoice response");
    let id = invoice["id"].as_str().unwrap();

    let entries = app.audit_entries(id).await;
    assert_eq!(entries[0]["username"], "auditor@example.com");
}

#[tokio::test]
async fn every_operation_appends_exactly_one_ordered_entry() {
    let app = TestApp::spawn().await;

    let invoice = app.create_invoice(15.0, "pending").await;
    let id = invoice["id"].as_str().unwrap();

    app.set_status(id, "pending", "paid").await;
    app.set_status(id, "paid", "overdue").await;
    app.set_status(id, "overdue", "paid").await;

    let entries = app.audit_entries(id).await;
    assert_eq!(entries.len(), 4);

    assert_eq!(entries[0]["old_status"], "---");
    assert_eq!(entries[1]["old_status"], "pending");
    assert_eq!(entries[1]["new_status"], "paid");
    assert_eq!(entries[2]["new_status"], "overdue");
    assert_eq!(entries[3]["new_status"], "paid");

    // created_at is non-decreasing in insertion order.
    let timestamps: Vec<_> = entries
        .iter()
        .map(|e| {
            DateTime::parse_from_rfc3339(e["created_at"].as_str().unwrap())
                .expect("Invalid created_at")
        })
        .collect();
    assert!(timestamps.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn histories_are_tracked_per_invoice() {
    let app = TestApp::spawn().await;

    let first = app.create_invoice(15.0, "pending").await;
    let second = app.create_invoice(25.0, "paid").await;
    let first_id = first["id"].as_str().unwrap();
    let second_id = second["id"].as_str().unwrap();

    app.set_status(first_id, "pending", "paid").await;

    assert_eq!(app.audit_entries(first_id).await.len(), 2);
    assert_eq!(app.audit_entries(second_id).await.len(), 1);
}

#[tokio::test]
async fn audit_log_of_unknown_invoice_is_empty() {
    let app = TestApp::spawn().await;

    let entries = app
        .audit_entries("99999999-9999-9999-9999-999999999999")
        .await;
    assert!(entries.is_empty());
}
