//! Notification seam for invoice emails.
//!
//! Rendering and delivery live outside this service; collaborators receive
//! the computed total and the identifying fields and do the rest. The split
//! breakdown is internal accounting and is deliberately not part of the
//! payload.

use async_trait::async_trait;
use backoffice_core::error::AppError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

/// Payload handed to the email/reporting collaborator when an invoice is
/// created.
#[derive(Debug, Clone)]
pub struct InvoiceNotification {
    pub customer_name: String,
    pub customer_email: String,
    pub tutor_name: Option<String>,
    pub invoice_number: String,
    pub session_date: NaiveDate,
    pub due_date: NaiveDate,
    pub total: Decimal,
}

#[async_trait]
pub trait InvoiceNotifier: Send + Sync {
    async fn invoice_created(&self, notification: &InvoiceNotification) -> Result<(), AppError>;
}

/// Logs the notification; stands in where no mail collaborator is wired up.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl InvoiceNotifier for LogNotifier {
    async fn invoice_created(&self, notification: &InvoiceNotification) -> Result<(), AppError> {
        info!(
            invoice_number = %notification.invoice_number,
            customer_email = %notification.customer_email,
            total = %notification.total,
            "Invoice notification"
        );
        Ok(())
    }
}
