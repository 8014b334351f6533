//! Invoice mutation entry points: create, full-form update, dropdown
//! status change, and soft-cancel.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use service_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{
    Invoice, InvoiceChanges, InvoiceStatus, NewAuditEntry, NewInvoice, Transition, due_date_from,
};
use crate::services::metrics::{INVOICES_TOTAL, STATUS_TRANSITIONS_TOTAL};
use crate::store::InvoiceStore;
use crate::workflow::Actor;

/// Validated input for the create entry point. The amount is the form's
/// decimal dollar value; conversion to cents happens here.
#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    pub customer_id: Uuid,
    pub amount: Decimal,
    pub status: InvoiceStatus,
}

/// Validated input for the full-form update entry point. `old_status`
/// is what the caller's form last displayed; it is recorded as the
/// prior status without re-reading the row.
#[derive(Debug, Clone)]
pub struct UpdateInvoiceInput {
    pub customer_id: Uuid,
    pub amount: Decimal,
    pub status: InvoiceStatus,
    pub old_status: InvoiceStatus,
}

/// Convert a decimal dollar amount to integer cents. The stored amount
/// must stay strictly positive.
fn amount_to_cents(amount: Decimal) -> Result<i64, AppError> {
    let cents = (amount * Decimal::from(100))
        .round_dp(0)
        .to_i64()
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Amount out of range")))?;
    if cents <= 0 {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Amount must be greater than $0"
        )));
    }
    Ok(cents)
}

/// Create an invoice and its creation audit entry in one atomic unit.
/// Pending invoices get a due date fourteen days after the issue date.
#[instrument(skip(store, actor, input), fields(customer_id = %input.customer_id))]
pub async fn create_invoice(
    store: &dyn InvoiceStore,
    actor: &Actor,
    input: CreateInvoiceInput,
    issue_date: NaiveDate,
) -> Result<Invoice, AppError> {
    let amount_cents = amount_to_cents(input.amount)?;
    let due_date = (input.status == InvoiceStatus::Pending).then(|| due_date_from(issue_date));

    let new = NewInvoice {
        id: Uuid::new_v4(),
        customer_id: input.customer_id,
        amount_cents,
        status: input.status,
        issue_date,
        due_date,
    };
    let entry = NewAuditEntry {
        invoice_id: new.id,
        transition: Transition::Created { new: input.status },
        username: actor.username().map(|u| u.to_string()),
    };

    let invoice = store.create_invoice(&new, &entry).await?;

    INVOICES_TOTAL
        .with_label_values(&[input.status.as_str()])
        .inc();

    info!(invoice_id = %invoice.id, status = %invoice.status, "Invoice created");

    Ok(invoice)
}

/// Overwrite an invoice from the edit form and record the transition.
/// The prior status comes from the caller; a stale form records a stale
/// transition, which is accepted.
#[instrument(skip(store, actor, input), fields(invoice_id = %invoice_id))]
pub async fn update_invoice(
    store: &dyn InvoiceStore,
    actor: &Actor,
    invoice_id: Uuid,
    input: UpdateInvoiceInput,
) -> Result<(), AppError> {
    let amount_cents = amount_to_cents(input.amount)?;

    let changes = InvoiceChanges {
        customer_id: input.customer_id,
        amount_cents,
        status: input.status,
    };
    let entry = NewAuditEntry {
        invoice_id,
        transition: Transition::Changed {
            old: input.old_status,
            new: input.status,
        },
        username: actor.username().map(|u| u.to_string()),
    };

    store.update_invoice(invoice_id, &changes, &entry).await?;

    STATUS_TRANSITIONS_TOTAL
        .with_label_values(&[input.old_status.as_str(), input.status.as_str()])
        .inc();

    info!(invoice_id = %invoice_id, status = %input.status.as_str(), "Invoice updated");

    Ok(())
}

/// Change only the status (the listing view's dropdown control). A
/// transition into pending restarts the payment terms from `today`; any
/// other target leaves the stored due date alone.
#[instrument(skip(store, actor), fields(invoice_id = %invoice_id))]
pub async fn set_status(
    store: &dyn InvoiceStore,
    actor: &Actor,
    invoice_id: Uuid,
    old_status: InvoiceStatus,
    status: InvoiceStatus,
    today: NaiveDate,
) -> Result<(), AppError> {
    let due_date = (status == InvoiceStatus::Pending).then(|| due_date_from(today));

    let entry = NewAuditEntry {
        invoice_id,
        transition: Transition::Changed {
            old: old_status,
            new: status,
        },
        username: actor.username().map(|u| u.to_string()),
    };

    store.set_status(invoice_id, status, due_date, &entry).await?;

    STATUS_TRANSITIONS_TOTAL
        .with_label_values(&[old_status.as_str(), status.as_str()])
        .inc();

    Ok(())
}

/// Soft-cancel from the listing view. The row survives with status
/// cancelled; no audit entry is written for this path.
#[instrument(skip(store), fields(invoice_id = %invoice_id))]
pub async fn cancel_invoice(store: &dyn InvoiceStore, invoice_id: Uuid) -> Result<(), AppError> {
    store.cancel_invoice(invoice_id).await?;

    INVOICES_TOTAL
        .with_label_values(&[InvoiceStatus::Cancelled.as_str()])
        .inc();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn dollars_convert_to_cents() {
        assert_eq!(
            amount_to_cents(Decimal::from_str("42.50").unwrap()).unwrap(),
            4250
        );
        assert_eq!(amount_to_cents(Decimal::from(7)).unwrap(), 700);
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        assert!(amount_to_cents(Decimal::ZERO).is_err());
        assert!(amount_to_cents(Decimal::from(-3)).is_err());
    }

    #[tokio::test]
    async fn pending_invoice_gets_due_date_and_creation_entry() {
        let store = MemoryStore::new();
        let input = CreateInvoiceInput {
            customer_id: Uuid::new_v4(),
            amount: Decimal::from_str("42.50").unwrap(),
            status: InvoiceStatus::Pending,
        };

        let invoice = create_invoice(&store, &Actor::anonymous(), input, date(2024, 1, 1))
            .await
            .unwrap();

        assert_eq!(invoice.amount_cents, 4250);
        assert_eq!(invoice.due_date, Some(date(2024, 1, 15)));

        let entries = store.audit_history(invoice.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].transition(),
            Transition::Created {
                new: InvoiceStatus::Pending
            }
        );
    }

    #[tokio::test]
    async fn paid_invoice_has_no_due_date() {
        let store = MemoryStore::new();
        let input = CreateInvoiceInput {
            customer_id: Uuid::new_v4(),
            amount: Decimal::from(10),
            status: InvoiceStatus::Paid,
        };

        let invoice = create_invoice(&store, &Actor::anonymous(), input, date(2024, 3, 4))
            .await
            .unwrap();

        assert_eq!(invoice.due_date, None);
    }

    #[tokio::test]
    async fn every_status_change_appends_exactly_one_entry() {
        let store = MemoryStore::new();
        let input = CreateInvoiceInput {
            customer_id: Uuid::new_v4(),
            amount: Decimal::from(25),
            status: InvoiceStatus::Pending,
        };
        let actor = Actor::named("ops@example.com");

        let invoice = create_invoice(&store, &actor, input, date(2024, 5, 1))
            .await
            .unwrap();

        set_status(
            &store,
            &actor,
            invoice.id,
            InvoiceStatus::Pending,
            InvoiceStatus::Paid,
            date(2024, 5, 2),
        )
        .await
        .unwrap();
        set_status(
            &store,
            &actor,
            invoice.id,
            InvoiceStatus::Paid,
            InvoiceStatus::Overdue,
            date(2024, 5, 3),
        )
        .await
        .unwrap();

        let entries = store.audit_history(invoice.id).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert!(
            entries
                .windows(2)
                .all(|pair| pair[0].created_at <= pair[1].created_at)
        );
        assert_eq!(entries[2].username.as_deref(), Some("ops@example.com"));
    }

    #[tokio::test]
    async fn transition_back_to_pending_restarts_payment_terms() {
        let store = MemoryStore::new();
        let input = CreateInvoiceInput {
            customer_id: Uuid::new_v4(),
            amount: Decimal::from(25),
            status: InvoiceStatus::Paid,
        };
        let actor = Actor::anonymous();

        let invoice = create_invoice(&store, &actor, input, date(2024, 5, 1))
            .await
            .unwrap();
        assert_eq!(invoice.due_date, None);

        set_status(
            &store,
            &actor,
            invoice.id,
            InvoiceStatus::Paid,
            InvoiceStatus::Pending,
            date(2024, 6, 1),
        )
        .await
        .unwrap();

        let stored = store.get_invoice(invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.status(), InvoiceStatus::Pending);
        assert_eq!(stored.due_date, Some(date(2024, 6, 15)));
    }

    #[tokio::test]
    async fn cancel_overwrites_status_without_logging() {
        let store = MemoryStore::new();
        let input = CreateInvoiceInput {
            customer_id: Uuid::new_v4(),
            amount: Decimal::from(25),
            status: InvoiceStatus::Pending,
        };
        let actor = Actor::anonymous();

        let invoice = create_invoice(&store, &actor, input, date(2024, 5, 1))
            .await
            .unwrap();
        cancel_invoice(&store, invoice.id).await.unwrap();

        let stored = store.get_invoice(invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.status(), InvoiceStatus::Cancelled);

        // Only the creation entry; cancellation is not logged.
        let entries = store.audit_history(invoice.id).await.unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn update_of_missing_invoice_still_logs_the_transition() {
        let store = MemoryStore::new();
        let missing = Uuid::new_v4();
        let input = UpdateInvoiceInput {
            customer_id: Uuid::new_v4(),
            amount: Decimal::from(12),
            status: InvoiceStatus::Paid,
            old_status: InvoiceStatus::Pending,
        };

        update_invoice(&store, &Actor::anonymous(), missing, input)
            .await
            .unwrap();

        assert!(store.get_invoice(missing).await.unwrap().is_none());
        assert_eq!(store.audit_history(missing).await.unwrap().len(), 1);
    }
}
