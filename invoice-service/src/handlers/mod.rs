mod audit;
mod health;
mod invoices;

pub use audit::{get_audit_log, restore_invoice};
pub use health::{health_check, metrics_endpoint, readiness_check};
pub use invoices::{
    cancel_invoice, create_invoice, get_invoice, list_invoices, set_invoice_status, update_invoice,
};

/// Response header signalling which rendered view the caller should
/// invalidate after a successful mutation.
pub const INVALIDATE_VIEW_HEADER: &str = "x-invalidate-view";

/// The dashboard listing view.
pub const INVOICES_VIEW: &str = "/dashboard/invoices";
