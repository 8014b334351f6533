//! Audit trail entry points: history lookup and restore.
//!
//! Restore re-appends the inverse of the most recent transition. By
//! default it only writes history; the invoice's current status is left
//! as-is unless the service is configured to roll it back too.

use chrono::NaiveDate;
use service_core::error::AppError;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{AuditLogEntry, InvoiceStatus, NewAuditEntry, due_date_from};
use crate::services::metrics::RESTORES_TOTAL;
use crate::store::InvoiceStore;
use crate::workflow::Actor;

/// Full transition history for an invoice, oldest first. A snapshot as
/// of query time.
pub async fn history(
    store: &dyn InvoiceStore,
    invoice_id: Uuid,
) -> Result<Vec<AuditLogEntry>, AppError> {
    store.audit_history(invoice_id).await
}

/// Outcome of a restore request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The inverse transition was appended.
    Restored,
    /// No history, or the most recent entry is the creation event;
    /// there is no prior state to return to.
    NothingToRestore,
}

/// Undo the most recent transition by appending its inverse.
///
/// With `update_status` set, the inverse target is also written to the
/// invoice row (re-entering pending restarts the payment terms from
/// `today`), atomically with the appended entry.
#[instrument(skip(store, actor), fields(invoice_id = %invoice_id))]
pub async fn restore_last_transition(
    store: &dyn InvoiceStore,
    actor: &Actor,
    invoice_id: Uuid,
    update_status: bool,
    today: NaiveDate,
) -> Result<RestoreOutcome, AppError> {
    let Some(last) = store.last_entry(invoice_id).await? else {
        return Ok(RestoreOutcome::NothingToRestore);
    };
    let Some(inverse) = last.transition().inverse() else {
        return Ok(RestoreOutcome::NothingToRestore);
    };

    let entry = NewAuditEntry {
        invoice_id,
        transition: inverse,
        username: actor.username().map(|u| u.to_string()),
    };

    if update_status {
        let target = inverse.new_status();
        let due_date = (target == InvoiceStatus::Pending).then(|| due_date_from(today));
        store.set_status(invoice_id, target, due_date, &entry).await?;
    } else {
        store.append_entry(&entry).await?;
    }

    RESTORES_TOTAL.inc();

    info!(
        invoice_id = %invoice_id,
        restored_to = %inverse.new_status().as_str(),
        "Transition restored"
    );

    Ok(RestoreOutcome::Restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Transition;
    use crate::store::MemoryStore;
    use crate::workflow::invoices::{CreateInvoiceInput, create_invoice, set_status};
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn seed_invoice(store: &MemoryStore, status: InvoiceStatus) -> Uuid {
        let input = CreateInvoiceInput {
            customer_id: Uuid::new_v4(),
            amount: Decimal::from(30),
            status,
        };
        create_invoice(store, &Actor::anonymous(), input, date(2024, 1, 1))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn restore_past_creation_is_a_no_op() {
        let store = MemoryStore::new();
        let id = seed_invoice(&store, InvoiceStatus::Pending).await;

        let outcome =
            restore_last_transition(&store, &Actor::anonymous(), id, false, date(2024, 1, 2))
                .await
                .unwrap();

        assert_eq!(outcome, RestoreOutcome::NothingToRestore);
        assert_eq!(store.audit_history(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn restore_on_unknown_invoice_is_a_no_op() {
        let store = MemoryStore::new();

        let outcome = restore_last_transition(
            &store,
            &Actor::anonymous(),
            Uuid::new_v4(),
            false,
            date(2024, 1, 2),
        )
        .await
        .unwrap();

        assert_eq!(outcome, RestoreOutcome::NothingToRestore);
    }

    #[tokio::test]
    async fn restore_appends_the_inverse_without_touching_the_row() {
        let store = MemoryStore::new();
        let actor = Actor::anonymous();
        let id = seed_invoice(&store, InvoiceStatus::Pending).await;

        set_status(
            &store,
            &actor,
            id,
            InvoiceStatus::Pending,
            InvoiceStatus::Paid,
            date(2024, 1, 2),
        )
        .await
        .unwrap();

        let outcome = restore_last_transition(&store, &actor, id, false, date(2024, 1, 3))
            .await
            .unwrap();
        assert_eq!(outcome, RestoreOutcome::Restored);

        let entries = store.audit_history(id).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[2].transition(),
            Transition::Changed {
                old: InvoiceStatus::Paid,
                new: InvoiceStatus::Pending,
            }
        );

        // History-only: the stored status stays where the last real
        // transition put it.
        let stored = store.get_invoice(id).await.unwrap().unwrap();
        assert_eq!(stored.status(), InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn restore_can_roll_back_the_row_when_configured() {
        let store = MemoryStore::new();
        let actor = Actor::anonymous();
        let id = seed_invoice(&store, InvoiceStatus::Pending).await;

        set_status(
            &store,
            &actor,
            id,
            InvoiceStatus::Pending,
            InvoiceStatus::Paid,
            date(2024, 1, 2),
        )
        .await
        .unwrap();

        let outcome = restore_last_transition(&store, &actor, id, true, date(2024, 1, 3))
            .await
            .unwrap();
        assert_eq!(outcome, RestoreOutcome::Restored);

        let stored = store.get_invoice(id).await.unwrap().unwrap();
        assert_eq!(stored.status(), InvoiceStatus::Pending);
        assert_eq!(stored.due_date, Some(date(2024, 1, 17)));

        assert_eq!(store.audit_history(id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn repeated_restores_walk_the_history_backwards() {
        let store = MemoryStore::new();
        let actor = Actor::anonymous();
        let id = seed_invoice(&store, InvoiceStatus::Pending).await;

        set_status(
            &store,
            &actor,
            id,
            InvoiceStatus::Pending,
            InvoiceStatus::Paid,
            date(2024, 1, 2),
        )
        .await
        .unwrap();

        restore_last_transition(&store, &actor, id, false, date(2024, 1, 3))
            .await
            .unwrap();
        restore_last_transition(&store, &actor, id, false, date(2024, 1, 4))
            .await
            .unwrap();

        let entries = store.audit_history(id).await.unwrap();
        assert_eq!(entries.len(), 4);
        // The second restore undoes the first restore.
        assert_eq!(
            entries[3].transition(),
            Transition::Changed {
                old: InvoiceStatus::Pending,
                new: InvoiceStatus::Paid,
            }
        );
    }
}
