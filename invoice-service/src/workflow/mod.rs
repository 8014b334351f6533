//! The invoice status-transition and audit-logging workflow.
//!
//! Entry points take the acting identity and a store handle explicitly;
//! nothing here reads ambient request state.

pub mod audit;
pub mod invoices;

pub use audit::{RestoreOutcome, history, restore_last_transition};
pub use invoices::{
    CreateInvoiceInput, UpdateInvoiceInput, cancel_invoice, create_invoice, set_status,
    update_invoice,
};

/// The identity performing a workflow operation, resolved by the caller
/// and passed in explicitly. `None` means unauthenticated; that is not
/// an error, the audit trail records the entry without a username.
#[derive(Debug, Clone, Default)]
pub struct Actor(pub Option<String>);

impl Actor {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn named(email: impl Into<String>) -> Self {
        Self(Some(email.into()))
    }

    pub fn username(&self) -> Option<&str> {
        self.0.as_deref()
    }
}
