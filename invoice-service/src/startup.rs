use crate::config::{InvoiceConfig, StoreBackend};
use crate::handlers;
use crate::store::{InvoiceStore, MemoryStore, PgStore};
use axum::{
    Router,
    routing::{get, post},
};
use service_core::error::AppError;
use service_core::middleware::metrics_middleware;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: InvoiceConfig,
    pub store: Arc<dyn InvoiceStore>,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: InvoiceConfig) -> Result<Self, AppError> {
        let store: Arc<dyn InvoiceStore> = match config.store {
            StoreBackend::Postgres => {
                let pg = PgStore::new(
                    &config.database.url,
                    config.database.max_connections,
                    config.database.min_connections,
                )
                .await
                .map_err(|e| {
                    tracing::error!("Failed to connect to PostgreSQL: {}", e);
                    e
                })?;
                pg.run_migrations().await.map_err(|e| {
                    tracing::error!("Failed to run database migrations: {}", e);
                    e
                })?;
                Arc::new(pg)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; data will not survive a restart");
                Arc::new(MemoryStore::new())
            }
        };

        let state = AppState {
            config: config.clone(),
            store,
        };

        let app = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/metrics", get(handlers::metrics_endpoint))
            .route(
                "/invoices",
                get(handlers::list_invoices).post(handlers::create_invoice),
            )
            .route(
                "/invoices/:id",
                get(handlers::get_invoice).put(handlers::update_invoice),
            )
            .route("/invoices/:id/status", post(handlers::set_invoice_status))
            .route("/invoices/:id/cancel", post(handlers::cancel_invoice))
            .route("/invoices/:id/restore", post(handlers::restore_invoice))
            .route("/invoices/:id/audit-log", get(handlers::get_audit_log))
            .layer(axum::middleware::from_fn(metrics_middleware))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
