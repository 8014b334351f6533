//! Storage backends for invoices and their audit trail.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{
    AuditLogEntry, Invoice, InvoiceChanges, InvoiceStatus, ListInvoicesFilter, NewAuditEntry,
    NewInvoice,
};

/// Storage interface consumed by the workflow layer.
///
/// Every mutating operation that affects an invoice's status takes the
/// audit entry describing the transition and applies both writes in a
/// single atomic unit: after the call either the row mutation and its
/// log entry are both visible, or neither is.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Insert a new invoice together with its creation audit entry.
    async fn create_invoice(
        &self,
        invoice: &NewInvoice,
        entry: &NewAuditEntry,
    ) -> Result<Invoice, AppError>;

    /// Overwrite customer, amount and status, and append the audit
    /// entry. A missing id updates zero rows; the entry is appended
    /// regardless.
    async fn update_invoice(
        &self,
        invoice_id: Uuid,
        changes: &InvoiceChanges,
        entry: &NewAuditEntry,
    ) -> Result<(), AppError>;

    /// Overwrite the status and append the audit entry. When `due_date`
    /// is `Some`, the stored due date is replaced; `None` leaves it
    /// untouched.
    async fn set_status(
        &self,
        invoice_id: Uuid,
        status: InvoiceStatus,
        due_date: Option<NaiveDate>,
        entry: &NewAuditEntry,
    ) -> Result<(), AppError>;

    /// Soft-cancel: overwrite the status to cancelled. No audit entry,
    /// no due-date change.
    async fn cancel_invoice(&self, invoice_id: Uuid) -> Result<(), AppError>;

    /// Append a lone audit entry without touching the invoice row.
    async fn append_entry(&self, entry: &NewAuditEntry) -> Result<AuditLogEntry, AppError>;

    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError>;

    async fn list_invoices(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError>;

    /// Full transition history for an invoice, oldest first.
    async fn audit_history(&self, invoice_id: Uuid) -> Result<Vec<AuditLogEntry>, AppError>;

    /// Most recent transition for an invoice, if any.
    async fn last_entry(&self, invoice_id: Uuid) -> Result<Option<AuditLogEntry>, AppError>;

    /// Backend liveness probe.
    async fn health_check(&self) -> Result<(), AppError>;
}
