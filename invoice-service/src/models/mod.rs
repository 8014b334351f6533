//! Domain models for invoice-service.

mod audit_log;
mod invoice;

pub use audit_log::{AuditLogEntry, CREATED_MARKER, NewAuditEntry, Transition};
pub use invoice::{
    Invoice, InvoiceChanges, InvoiceStatus, ListInvoicesFilter, NewInvoice, PAYMENT_TERMS_DAYS,
    due_date_from,
};
