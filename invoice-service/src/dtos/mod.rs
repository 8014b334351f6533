mod invoices;

pub use invoices::{
    AuditLogEntryResponse, AuditLogResponse, CreateInvoiceRequest, InvoiceListResponse,
    InvoiceResponse, ListInvoicesParams, MessageResponse, SetStatusRequest, UpdateInvoiceRequest,
};
