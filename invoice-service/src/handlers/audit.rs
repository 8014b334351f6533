use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::{AuditLogEntryResponse, AuditLogResponse, MessageResponse};
use crate::handlers::INVALIDATE_VIEW_HEADER;
use crate::startup::AppState;
use crate::workflow::{self, Actor, RestoreOutcome};

pub async fn get_audit_log(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let entries = workflow::history(state.store.as_ref(), invoice_id).await?;

    Ok(Json(AuditLogResponse {
        entries: entries
            .into_iter()
            .map(AuditLogEntryResponse::from)
            .collect(),
    }))
}

pub async fn restore_invoice(
    State(state): State<AppState>,
    actor: Actor,
    Path(invoice_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let outcome = workflow::restore_last_transition(
        state.store.as_ref(),
        &actor,
        invoice_id,
        state.config.restore_updates_status,
        Utc::now().date_naive(),
    )
    .await?;

    Ok(match outcome {
        RestoreOutcome::Restored => {
            // The edit view shows the log table; tell the caller to
            // refresh it.
            let view = format!("/dashboard/invoices/{}/edit", invoice_id);
            (
                StatusCode::OK,
                [(INVALIDATE_VIEW_HEADER, view)],
                Json(MessageResponse {
                    message: "Transition restored".to_string(),
                }),
            )
                .into_response()
        }
        RestoreOutcome::NothingToRestore => StatusCode::NO_CONTENT.into_response(),
    })
}
