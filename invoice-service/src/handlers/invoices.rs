use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::{
    CreateInvoiceRequest, InvoiceListResponse, InvoiceResponse, ListInvoicesParams,
    MessageResponse, SetStatusRequest, UpdateInvoiceRequest,
};
use crate::handlers::{INVALIDATE_VIEW_HEADER, INVOICES_VIEW};
use crate::models::{InvoiceStatus, ListInvoicesFilter};
use crate::startup::AppState;
use crate::workflow::{self, Actor};

pub async fn create_invoice(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate_form()?;
    let input = payload
        .into_input()
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Malformed invoice form")))?;

    let invoice = workflow::create_invoice(
        state.store.as_ref(),
        &actor,
        input,
        Utc::now().date_naive(),
    )
    .await?;

    // The dashboard redirects back to the listing after a create.
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, INVOICES_VIEW)],
        Json(InvoiceResponse::from(invoice)),
    ))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    actor: Actor,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate_form()?;
    let input = payload
        .into_input()
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Malformed invoice form")))?;

    workflow::update_invoice(state.store.as_ref(), &actor, invoice_id, input).await?;

    Ok((
        StatusCode::OK,
        [(header::LOCATION, INVOICES_VIEW)],
        Json(MessageResponse {
            message: "Invoice updated".to_string(),
        }),
    ))
}

pub async fn set_invoice_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<SetStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let status = InvoiceStatus::from_string(&payload.status);
    let old_status = InvoiceStatus::from_string(&payload.old_status);

    workflow::set_status(
        state.store.as_ref(),
        &actor,
        invoice_id,
        old_status,
        status,
        Utc::now().date_naive(),
    )
    .await?;

    Ok((
        StatusCode::OK,
        [(INVALIDATE_VIEW_HEADER, INVOICES_VIEW)],
        Json(MessageResponse {
            message: "Status updated".to_string(),
        }),
    ))
}

pub async fn cancel_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    workflow::cancel_invoice(state.store.as_ref(), invoice_id).await?;

    Ok((
        StatusCode::OK,
        [(INVALIDATE_VIEW_HEADER, INVOICES_VIEW)],
        Json(MessageResponse {
            message: "Invoice cancelled".to_string(),
        }),
    ))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = state
        .store
        .get_invoice(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    Ok(Json(InvoiceResponse::from(invoice)))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Query(params): Query<ListInvoicesParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = ListInvoicesFilter {
        status: params.status.as_deref().and_then(InvoiceStatus::parse),
        customer_id: params.customer_id,
        page_size: params.page_size.unwrap_or(20),
        page_token: params.page_token,
    };

    let invoices = state.store.list_invoices(&filter).await?;

    let next_page_token = if invoices.len() as i32 == filter.page_size.clamp(1, 100) {
        invoices.last().map(|inv| inv.id)
    } else {
        None
    };

    Ok(Json(InvoiceListResponse {
        invoices: invoices.into_iter().map(InvoiceResponse::from).collect(),
        next_page_token,
    }))
}
