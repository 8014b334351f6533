//! Test helper module for invoice-service integration tests.
//!
//! Spawns the application on a random port against the in-memory store
//! backend, so every test gets an isolated, database-free instance.

#![allow(dead_code)]

use invoice_service::config::{DatabaseConfig, InvoiceConfig, StoreBackend};
use invoice_service::services::init_metrics;
use invoice_service::startup::Application;
use serde_json::json;
use service_core::config::Config as CoreConfig;

// Test constant for the customer reference
pub const TEST_CUSTOMER_ID: &str = "22222222-2222-2222-2222-222222222222";

/// Build a config for an isolated test instance: random port, in-memory
/// store, restore in its default history-only mode.
pub fn test_config() -> InvoiceConfig {
    InvoiceConfig {
        common: CoreConfig {
            port: 0,
            log_level: "warn".to_string(),
        },
        service_name: "invoice-service-test".to_string(),
        otlp_endpoint: None,
        store: StoreBackend::Memory,
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 2,
            min_connections: 1,
        },
        restore_updates_status: false,
    }
}

/// Test application wrapper for integration tests.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn a new test application on a random port.
    pub async fn spawn() -> Self {
        Self::spawn_with(test_config()).await
    }

    /// Spawn with a customized config (still port 0 for isolation).
    pub async fn spawn_with(config: InvoiceConfig) -> Self {
        // Initialize metrics (required for the metrics endpoint test)
        init_metrics();

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        let address = format!("http://127.0.0.1:{}", port);

        // Wait for the server to be ready by polling the health endpoint
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Create an invoice through the API and return the response body.
    pub async fn create_invoice(&self, amount: f64, status: &str) -> serde_json::Value {
        let response = self
            .client
            .post(self.url("/invoices"))
            .json(&json!({
                "customer_id": TEST_CUSTOMER_ID,
                "amount": amount,
                "status": status,
            }))
            .send()
            .await
            .expect("Failed to create invoice");
        assert_eq!(response.status(), 201);
        response.json().await.expect("Invalid invoice response")
    }

    /// Change an invoice's status through the dropdown entry point.
    pub async fn set_status(&self, invoice_id: &str, old_status: &str, status: &str) {
        let response = self
            .client
            .post(self.url(&format!("/invoices/{}/status", invoice_id)))
            .json(&json!({ "status": status, "old_status": old_status }))
            .send()
            .await
            .expect("Failed to set status");
        assert_eq!(response.status(), 200);
    }

    /// Fetch the audit log entries for an invoice.
    pub async fn audit_entries(&self, invoice_id: &str) -> Vec<serde_json::Value> {
        let response = self
            .client
            .get(self.url(&format!("/invoices/{}/audit-log", invoice_id)))
            .send()
            .await
            .expect("Failed to fetch audit log");
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.expect("Invalid audit log response");
        body["entries"]
            .as_array()
            .expect("Missing entries array")
            .clone()
    }
}
