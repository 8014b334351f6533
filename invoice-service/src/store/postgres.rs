//! PostgreSQL store backend.

use async_trait::async_trait;
use chrono::NaiveDate;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{
    AuditLogEntry, Invoice, InvoiceChanges, InvoiceStatus, ListInvoicesFilter, NewAuditEntry,
    NewInvoice,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::store::InvoiceStore;

const INVOICE_COLUMNS: &str =
    "id, customer_id, amount_cents, status, issue_date, due_date, created_utc";

const AUDIT_COLUMNS: &str = "id, invoice_id, old_status, new_status, username, created_at";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "invoice-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

/// Append an audit entry inside an open transaction. `created_at` is
/// assigned by the database so the per-invoice history stays in server
/// clock order.
async fn insert_audit_entry(
    tx: &mut Transaction<'_, Postgres>,
    entry: &NewAuditEntry,
) -> Result<AuditLogEntry, sqlx::Error> {
    sqlx::query_as::<_, AuditLogEntry>(&format!(
        r#"
        INSERT INTO invoice_audit_logs (invoice_id, old_status, new_status, username)
        VALUES ($1, $2, $3, $4)
        RETURNING {AUDIT_COLUMNS}
        "#,
    ))
    .bind(entry.invoice_id)
    .bind(entry.old_status_column())
    .bind(entry.new_status_column())
    .bind(entry.username.as_deref())
    .fetch_one(&mut **tx)
    .await
}

#[async_trait]
impl InvoiceStore for PgStore {
    #[instrument(skip(self, invoice, entry), fields(invoice_id = %invoice.id))]
    async fn create_invoice(
        &self,
        invoice: &NewInvoice,
        entry: &NewAuditEntry,
    ) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let created = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            INSERT INTO invoices (id, customer_id, amount_cents, status, issue_date, due_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {INVOICE_COLUMNS}
            "#,
        ))
        .bind(invoice.id)
        .bind(invoice.customer_id)
        .bind(invoice.amount_cents)
        .bind(invoice.status.as_str())
        .bind(invoice.issue_date)
        .bind(invoice.due_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice: {}", e)))?;

        insert_audit_entry(&mut tx, entry).await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create audit log: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(invoice_id = %created.id, status = %created.status, "Invoice created");

        Ok(created)
    }

    #[instrument(skip(self, changes, entry), fields(invoice_id = %invoice_id))]
    async fn update_invoice(
        &self,
        invoice_id: Uuid,
        changes: &InvoiceChanges,
        entry: &NewAuditEntry,
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query(
            r#"
            UPDATE invoices
            SET customer_id = $2, amount_cents = $3, status = $4
            WHERE id = $1
            "#,
        )
        .bind(invoice_id)
        .bind(changes.customer_id)
        .bind(changes.amount_cents)
        .bind(changes.status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e)))?;

        insert_audit_entry(&mut tx, entry).await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create audit log: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(invoice_id = %invoice_id, "Invoice updated");

        Ok(())
    }

    #[instrument(skip(self, entry), fields(invoice_id = %invoice_id, status = %status.as_str()))]
    async fn set_status(
        &self,
        invoice_id: Uuid,
        status: InvoiceStatus,
        due_date: Option<NaiveDate>,
        entry: &NewAuditEntry,
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["set_status"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        if let Some(due) = due_date {
            sqlx::query("UPDATE invoices SET status = $2, due_date = $3 WHERE id = $1")
                .bind(invoice_id)
                .bind(status.as_str())
                .bind(due)
                .execute(&mut *tx)
                .await
        } else {
            sqlx::query("UPDATE invoices SET status = $2 WHERE id = $1")
                .bind(invoice_id)
                .bind(status.as_str())
                .execute(&mut *tx)
                .await
        }
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to set status: {}", e)))?;

        insert_audit_entry(&mut tx, entry).await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create audit log: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(invoice_id = %invoice_id, status = %status.as_str(), "Invoice status set");

        Ok(())
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn cancel_invoice(&self, invoice_id: Uuid) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["cancel_invoice"])
            .start_timer();

        sqlx::query("UPDATE invoices SET status = 'cancelled' WHERE id = $1")
            .bind(invoice_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to cancel invoice: {}", e))
            })?;

        timer.observe_duration();

        info!(invoice_id = %invoice_id, "Invoice cancelled");

        Ok(())
    }

    #[instrument(skip(self, entry), fields(invoice_id = %entry.invoice_id))]
    async fn append_entry(&self, entry: &NewAuditEntry) -> Result<AuditLogEntry, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["append_entry"])
            .start_timer();

        let appended = sqlx::query_as::<_, AuditLogEntry>(&format!(
            r#"
            INSERT INTO invoice_audit_logs (invoice_id, old_status, new_status, username)
            VALUES ($1, $2, $3, $4)
            RETURNING {AUDIT_COLUMNS}
            "#,
        ))
        .bind(entry.invoice_id)
        .bind(entry.old_status_column())
        .bind(entry.new_status_column())
        .bind(entry.username.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create audit log: {}", e))
        })?;

        timer.observe_duration();

        Ok(appended)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1",
        ))
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self, filter))]
    async fn list_invoices(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;
        let status_str = filter.status.map(|s| s.as_str().to_string());

        let invoices = if let Some(cursor) = filter.page_token {
            sqlx::query_as::<_, Invoice>(&format!(
                r#"
                SELECT {INVOICE_COLUMNS}
                FROM invoices
                WHERE ($1::varchar IS NULL OR status = $1)
                  AND ($2::uuid IS NULL OR customer_id = $2)
                  AND id > $3
                ORDER BY id
                LIMIT $4
                "#,
            ))
            .bind(&status_str)
            .bind(filter.customer_id)
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Invoice>(&format!(
                r#"
                SELECT {INVOICE_COLUMNS}
                FROM invoices
                WHERE ($1::varchar IS NULL OR status = $1)
                  AND ($2::uuid IS NULL OR customer_id = $2)
                ORDER BY id
                LIMIT $3
                "#,
            ))
            .bind(&status_str)
            .bind(filter.customer_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(invoices)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn audit_history(&self, invoice_id: Uuid) -> Result<Vec<AuditLogEntry>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["audit_history"])
            .start_timer();

        let entries = sqlx::query_as::<_, AuditLogEntry>(&format!(
            r#"
            SELECT {AUDIT_COLUMNS}
            FROM invoice_audit_logs
            WHERE invoice_id = $1
            ORDER BY created_at, id
            "#,
        ))
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to load audit history: {}", e))
        })?;

        timer.observe_duration();

        Ok(entries)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn last_entry(&self, invoice_id: Uuid) -> Result<Option<AuditLogEntry>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["last_entry"])
            .start_timer();

        let entry = sqlx::query_as::<_, AuditLogEntry>(&format!(
            r#"
            SELECT {AUDIT_COLUMNS}
            FROM invoice_audit_logs
            WHERE invoice_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        ))
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to load last audit entry: {}", e))
        })?;

        timer.observe_duration();

        Ok(entry)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}
