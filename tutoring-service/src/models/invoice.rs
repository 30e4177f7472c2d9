//! Invoice model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Invoice document.
///
/// `total` is always `hours * price` and is recomputed on every save.
/// The split fields are derived by `services::split` and never set directly
/// by a caller. When paid, `tutor_share + business_share == total`; when
/// unpaid both shares are zero.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: Uuid,
    /// Business-facing 5-digit number, globally unique.
    pub invoice_number: String,
    pub customer_id: Uuid,
    /// Required on create under current policy; legacy rows may be null, and
    /// deleting a tutor orphans their invoices.
    pub tutor_id: Option<Uuid>,
    pub session_date: NaiveDate,
    pub due_date: NaiveDate,
    pub hours: Decimal,
    pub price: Decimal,
    pub total: Decimal,
    pub is_paid: bool,
    pub applies_split_rule: bool,
    pub tutor_share: Decimal,
    pub business_share: Decimal,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating an invoice.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInvoice {
    /// Generated with collision avoidance when absent.
    #[validate(length(min = 5, max = 5, message = "Invoice number must be 5 digits"))]
    pub invoice_number: Option<String>,
    pub customer_id: Uuid,
    pub tutor_id: Uuid,
    pub session_date: NaiveDate,
    pub due_date: NaiveDate,
    pub hours: Decimal,
    pub price: Decimal,
    pub is_paid: bool,
}

/// Input for updating an invoice. All core fields are resubmitted; the tutor
/// is reassigned only when `tutor_id` is supplied.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateInvoice {
    #[validate(length(min = 5, max = 5, message = "Invoice number must be 5 digits"))]
    pub invoice_number: String,
    pub session_date: NaiveDate,
    pub due_date: NaiveDate,
    pub hours: Decimal,
    pub price: Decimal,
    pub is_paid: bool,
    pub tutor_id: Option<Uuid>,
}

/// Filter parameters for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct ListInvoicesFilter {
    pub is_paid: Option<bool>,
    pub customer_id: Option<Uuid>,
    pub tutor_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
