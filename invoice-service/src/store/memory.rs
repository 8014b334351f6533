//! In-process store backend.
//!
//! Used by the integration tests and for local runs without a database.
//! A single lock guards both tables so the row mutation and its audit
//! entry stay atomic, mirroring the transactional Postgres backend.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use service_core::error::AppError;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    AuditLogEntry, Invoice, InvoiceChanges, InvoiceStatus, ListInvoicesFilter, NewAuditEntry,
    NewInvoice,
};
use crate::store::InvoiceStore;

#[derive(Default)]
struct Tables {
    invoices: HashMap<Uuid, Invoice>,
    audit_logs: Vec<AuditLogEntry>,
    next_entry_id: i64,
    last_entry_at: Option<DateTime<Utc>>,
}

impl Tables {
    /// Append an entry with a timestamp clamped to be non-decreasing,
    /// matching the server-clock ordering of the Postgres backend.
    fn push_entry(&mut self, entry: &NewAuditEntry) -> AuditLogEntry {
        let mut now = Utc::now();
        if let Some(last) = self.last_entry_at {
            if now < last {
                now = last;
            }
        }
        self.last_entry_at = Some(now);
        self.next_entry_id += 1;

        let row = AuditLogEntry {
            id: self.next_entry_id,
            invoice_id: entry.invoice_id,
            old_status: entry.old_status_column().map(|s| s.to_string()),
            new_status: entry.new_status_column().to_string(),
            username: entry.username.clone(),
            created_at: now,
        };
        self.audit_logs.push(row.clone());
        row
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn create_invoice(
        &self,
        invoice: &NewInvoice,
        entry: &NewAuditEntry,
    ) -> Result<Invoice, AppError> {
        let mut tables = self.tables.write().await;

        let row = Invoice {
            id: invoice.id,
            customer_id: invoice.customer_id,
            amount_cents: invoice.amount_cents,
            status: invoice.status.as_str().to_string(),
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
            created_utc: Utc::now(),
        };
        tables.invoices.insert(row.id, row.clone());
        tables.push_entry(entry);

        Ok(row)
    }

    async fn update_invoice(
        &self,
        invoice_id: Uuid,
        changes: &InvoiceChanges,
        entry: &NewAuditEntry,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;

        if let Some(invoice) = tables.invoices.get_mut(&invoice_id) {
            invoice.customer_id = changes.customer_id;
            invoice.amount_cents = changes.amount_cents;
            invoice.status = changes.status.as_str().to_string();
        }
        tables.push_entry(entry);

        Ok(())
    }

    async fn set_status(
        &self,
        invoice_id: Uuid,
        status: InvoiceStatus,
        due_date: Option<NaiveDate>,
        entry: &NewAuditEntry,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;

        if let Some(invoice) = tables.invoices.get_mut(&invoice_id) {
            invoice.status = status.as_str().to_string();
            if let Some(due) = due_date {
                invoice.due_date = Some(due);
            }
        }
        tables.push_entry(entry);

        Ok(())
    }

    async fn cancel_invoice(&self, invoice_id: Uuid) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;

        if let Some(invoice) = tables.invoices.get_mut(&invoice_id) {
            invoice.status = InvoiceStatus::Cancelled.as_str().to_string();
        }

        Ok(())
    }

    async fn append_entry(&self, entry: &NewAuditEntry) -> Result<AuditLogEntry, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.push_entry(entry))
    }

    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.invoices.get(&invoice_id).cloned())
    }

    async fn list_invoices(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError> {
        let tables = self.tables.read().await;
        let limit = filter.page_size.clamp(1, 100) as usize;
        let status_str = filter.status.map(|s| s.as_str());

        let mut invoices: Vec<Invoice> = tables
            .invoices
            .values()
            .filter(|inv| status_str.is_none_or(|s| inv.status == s))
            .filter(|inv| filter.customer_id.is_none_or(|c| inv.customer_id == c))
            .filter(|inv| filter.page_token.is_none_or(|cursor| inv.id > cursor))
            .cloned()
            .collect();
        invoices.sort_by_key(|inv| inv.id);
        invoices.truncate(limit);

        Ok(invoices)
    }

    async fn audit_history(&self, invoice_id: Uuid) -> Result<Vec<AuditLogEntry>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .audit_logs
            .iter()
            .filter(|e| e.invoice_id == invoice_id)
            .cloned()
            .collect())
    }

    async fn last_entry(&self, invoice_id: Uuid) -> Result<Option<AuditLogEntry>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .audit_logs
            .iter()
            .rev()
            .find(|e| e.invoice_id == invoice_id)
            .cloned())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
