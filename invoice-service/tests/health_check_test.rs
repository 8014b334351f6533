//! Health and metrics endpoint tests for invoice-service.

mod common;

use common::TestApp;
use serial_test::serial;

#[tokio::test]
async fn health_check_reports_ok() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .expect("Failed to reach health endpoint");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Invalid health response");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "invoice-service");
}

#[tokio::test]
async fn readiness_check_reports_ok() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/ready"))
        .send()
        .await
        .expect("Failed to reach readiness endpoint");

    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[serial]
async fn metrics_endpoint_exposes_workflow_counters() {
    let app = TestApp::spawn().await;

    app.create_invoice(10.0, "pending").await;

    let response = app
        .client
        .get(app.url("/metrics"))
        .send()
        .await
        .expect("Failed to reach metrics endpoint");

    assert_eq!(response.status(), 200);
    let body = response.text().await.expect("Invalid metrics response");
    assert!(body.contains("invoice_invoices_total"));
    assert!(body.contains("http_requests_total"));
}
