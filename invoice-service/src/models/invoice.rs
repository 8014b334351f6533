//! Invoice model for invoice-service.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Payment terms applied to pending invoices, in days.
pub const PAYMENT_TERMS_DAYS: u64 = 14;

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Cancelled,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
            InvoiceStatus::Overdue => "overdue",
        }
    }

    /// Lenient conversion for values read back from storage. Unknown
    /// values fall back to `Pending`.
    pub fn from_string(s: &str) -> Self {
        match s {
            "paid" => InvoiceStatus::Paid,
            "cancelled" => InvoiceStatus::Cancelled,
            "overdue" => InvoiceStatus::Overdue,
            _ => InvoiceStatus::Pending,
        }
    }

    /// Strict conversion for caller-supplied values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InvoiceStatus::Pending),
            "paid" => Some(InvoiceStatus::Paid),
            "cancelled" => Some(InvoiceStatus::Cancelled),
            "overdue" => Some(InvoiceStatus::Overdue),
            _ => None,
        }
    }

    /// Only pending and paid invoices can be created; cancelled and
    /// overdue arrive through later transitions.
    pub fn valid_at_creation(&self) -> bool {
        matches!(self, InvoiceStatus::Pending | InvoiceStatus::Paid)
    }
}

/// Invoice row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub amount_cents: i64,
    pub status: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub created_utc: DateTime<Utc>,
}

impl Invoice {
    pub fn status(&self) -> InvoiceStatus {
        InvoiceStatus::from_string(&self.status)
    }
}

/// Input for creating an invoice. The id is assigned by the caller so
/// the creation audit entry can reference it in the same transaction.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub amount_cents: i64,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
}

/// Input for the full-form update path. The due date is deliberately
/// absent: the update form never touches it.
#[derive(Debug, Clone)]
pub struct InvoiceChanges {
    pub customer_id: Uuid,
    pub amount_cents: i64,
    pub status: InvoiceStatus,
}

/// Filter parameters for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct ListInvoicesFilter {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<Uuid>,
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}

/// Due date for an invoice entering the pending status on `from`.
pub fn due_date_from(from: NaiveDate) -> NaiveDate {
    from + Days::new(PAYMENT_TERMS_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_date_is_fourteen_days_out() {
        let issued = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            due_date_from(issued),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }

    #[test]
    fn due_date_crosses_month_boundary() {
        let issued = NaiveDate::from_ymd_opt(2024, 2, 20).unwrap();
        assert_eq!(
            due_date_from(issued),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
    }

    #[test]
    fn parse_rejects_unknown_status() {
        assert_eq!(InvoiceStatus::parse("paid"), Some(InvoiceStatus::Paid));
        assert_eq!(InvoiceStatus::parse("draft"), None);
    }

    #[test]
    fn only_pending_and_paid_are_valid_at_creation() {
        assert!(InvoiceStatus::Pending.valid_at_creation());
        assert!(InvoiceStatus::Paid.valid_at_creation());
        assert!(!InvoiceStatus::Cancelled.valid_at_creation());
        assert!(!InvoiceStatus::Overdue.valid_at_creation());
    }
}
