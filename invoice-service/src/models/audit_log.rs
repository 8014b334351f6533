//! Audit log model: append-only status transition history per invoice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::invoice::InvoiceStatus;

/// Display form of the missing prior status on a creation entry.
pub const CREATED_MARKER: &str = "---";

/// A recorded status transition. Creation entries have no prior status;
/// the distinction is carried by the variant, never by a marker value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    Created { new: InvoiceStatus },
    Changed { old: InvoiceStatus, new: InvoiceStatus },
}

impl Transition {
    pub fn new_status(&self) -> InvoiceStatus {
        match self {
            Transition::Created { new } | Transition::Changed { new, .. } => *new,
        }
    }

    pub fn old_status(&self) -> Option<InvoiceStatus> {
        match self {
            Transition::Created { .. } => None,
            Transition::Changed { old, .. } => Some(*old),
        }
    }

    /// The transition that undoes this one. Creation has no prior state
    /// to return to.
    pub fn inverse(&self) -> Option<Transition> {
        match self {
            Transition::Created { .. } => None,
            Transition::Changed { old, new } => Some(Transition::Changed {
                old: *new,
                new: *old,
            }),
        }
    }

    /// Prior status as shown in the dashboard log table.
    pub fn display_old(&self) -> &'static str {
        match self {
            Transition::Created { .. } => CREATED_MARKER,
            Transition::Changed { old, .. } => old.as_str(),
        }
    }
}

/// Audit log row. Entries are immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLogEntry {
    pub id: i64,
    pub invoice_id: Uuid,
    pub old_status: Option<String>,
    pub new_status: String,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    /// Typed view of the stored transition columns.
    pub fn transition(&self) -> Transition {
        match &self.old_status {
            None => Transition::Created {
                new: InvoiceStatus::from_string(&self.new_status),
            },
            Some(old) => Transition::Changed {
                old: InvoiceStatus::from_string(old),
                new: InvoiceStatus::from_string(&self.new_status),
            },
        }
    }
}

/// Input for appending an audit entry. `created_at` is assigned by the
/// store when the entry is written.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub invoice_id: Uuid,
    pub transition: Transition,
    pub username: Option<String>,
}

impl NewAuditEntry {
    pub fn old_status_column(&self) -> Option<&'static str> {
        self.transition.old_status().map(|s| s.as_str())
    }

    pub fn new_status_column(&self) -> &'static str {
        self.transition.new_status().as_str()
    }
}
