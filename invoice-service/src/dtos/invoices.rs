use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{AuditLogEntry, Invoice, InvoiceStatus};
use crate::workflow::{CreateInvoiceInput, UpdateInvoiceInput};

/// Form payload for creating an invoice. All fields are optional at the
/// serde level so a missing field surfaces as a field-keyed validation
/// message rather than a deserialization failure.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    #[validate(required(message = "Please select a customer."))]
    pub customer_id: Option<Uuid>,
    #[validate(required(message = "Please enter an amount greater than $0."))]
    pub amount: Option<Decimal>,
    #[validate(required(message = "Please select an invoice status."))]
    pub status: Option<String>,
}

impl CreateInvoiceRequest {
    /// Field validation: presence via the derive, then the domain rules
    /// the derive cannot express (positive amount, creation statuses).
    pub fn validate_form(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(e) => e,
        };

        if let Some(amount) = self.amount {
            if amount <= Decimal::ZERO {
                errors.add("amount", amount_error());
            }
        }
        if let Some(status) = &self.status {
            if !creation_status(status) {
                errors.add("status", status_error());
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Convert to workflow input. Call after `validate_form`.
    pub fn into_input(self) -> Option<CreateInvoiceInput> {
        Some(CreateInvoiceInput {
            customer_id: self.customer_id?,
            amount: self.amount?,
            status: InvoiceStatus::parse(&self.status?)?,
        })
    }
}

/// Form payload for the full edit form. `old_status` is the status the
/// form last displayed; it becomes the recorded prior status.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateInvoiceRequest {
    #[validate(required(message = "Please select a customer."))]
    pub customer_id: Option<Uuid>,
    #[validate(required(message = "Please enter an amount greater than $0."))]
    pub amount: Option<Decimal>,
    #[validate(required(message = "Please select an invoice status."))]
    pub status: Option<String>,
    pub old_status: Option<String>,
}

impl UpdateInvoiceRequest {
    pub fn validate_form(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(e) => e,
        };

        if let Some(amount) = self.amount {
            if amount <= Decimal::ZERO {
                errors.add("amount", amount_error());
            }
        }
        if let Some(status) = &self.status {
            if !creation_status(status) {
                errors.add("status", status_error());
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn into_input(self) -> Option<UpdateInvoiceInput> {
        let old_status = self
            .old_status
            .as_deref()
            .map(InvoiceStatus::from_string)
            .unwrap_or(InvoiceStatus::Pending);
        Some(UpdateInvoiceInput {
            customer_id: self.customer_id?,
            amount: self.amount?,
            status: InvoiceStatus::parse(&self.status?)?,
            old_status,
        })
    }
}

/// The listing view's status dropdown posts the target status together
/// with the status the row displayed.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
    pub old_status: String,
}

#[derive(Debug, Deserialize)]
pub struct ListInvoicesParams {
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
    pub page_size: Option<i32>,
    pub page_token: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub amount_cents: i64,
    pub status: String,
    pub issue_date: String,
    pub due_date: Option<String>,
    pub created_utc: String,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            customer_id: invoice.customer_id,
            amount_cents: invoice.amount_cents,
            status: invoice.status,
            issue_date: invoice.issue_date.to_string(),
            due_date: invoice.due_date.map(|d| d.to_string()),
            created_utc: invoice.created_utc.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceListResponse {
    pub invoices: Vec<InvoiceResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<Uuid>,
}

/// One row of the dashboard's audit log table. A creation entry shows
/// the `---` marker in the prior-status column.
#[derive(Debug, Serialize)]
pub struct AuditLogEntryResponse {
    pub invoice_id: Uuid,
    pub old_status: String,
    pub new_status: String,
    pub username: Option<String>,
    pub created_at: String,
}

impl From<AuditLogEntry> for AuditLogEntryResponse {
    fn from(entry: AuditLogEntry) -> Self {
        let transition = entry.transition();
        Self {
            invoice_id: entry.invoice_id,
            old_status: transition.display_old().to_string(),
            new_status: entry.new_status,
            username: entry.username,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub entries: Vec<AuditLogEntryResponse>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn amount_error() -> ValidationError {
    let mut err = ValidationError::new("range");
    err.message = Some("Please enter an amount greater than $0.".into());
    err
}

fn status_error() -> ValidationError {
    let mut err = ValidationError::new("invalid_status");
    err.message = Some("Please select an invoice status.".into());
    err
}

/// Only pending and paid are selectable on the create/edit forms.
fn creation_status(s: &str) -> bool {
    InvoiceStatus::parse(s).is_some_and(|status| status.valid_at_creation())
}
