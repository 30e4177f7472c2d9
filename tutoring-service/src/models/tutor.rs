//! Tutor model and denormalized earnings ledger.

use backoffice_core::error::AppError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// Denormalized aggregate of a tutor's paid invoices.
///
/// These fields are a cache, not ground truth: `services::ledger` applies
/// incremental deltas and `services::recalc` rebuilds them from the invoice
/// set. Nothing else writes them.
#[derive(Debug, Clone, Default, PartialEq, FromRow, Serialize, Deserialize)]
pub struct TutorLedger {
    pub total_earnings_before_split: Decimal,
    pub total_earnings_after_split: Decimal,
    pub total_business_share: Decimal,
    pub session_count_before_split: i32,
    pub session_count_after_split: i32,
    /// Mirrors `total_earnings_after_split`; the pre-split bucket is tracked
    /// for reporting and never paid out to the tutor.
    pub total_earnings: Decimal,
}

/// Tutor record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Tutor {
    pub tutor_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub is_active: bool,
    /// Negotiated cut of post-milestone paid invoice revenue, in `[0, 100]`.
    pub share_percentage: Decimal,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub ledger: TutorLedger,
    pub created_utc: DateTime<Utc>,
}

/// Default negotiated share when none is supplied: an even 50/50 split.
pub fn default_share_percentage() -> Decimal {
    Decimal::from(50)
}

/// Reject share percentages outside `[0, 100]` before they reach storage.
pub fn validate_share_percentage(value: Decimal) -> Result<(), AppError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        let mut errors = ValidationErrors::new();
        errors.add("share_percentage", ValidationError::new("range"));
        return Err(AppError::ValidationError(errors));
    }
    Ok(())
}

/// Input for creating a tutor.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTutor {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub phone_number: Option<String>,
    pub share_percentage: Option<Decimal>,
}

/// Input for updating a tutor.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTutor {
    #[validate(length(min = 1, message = "Full name cannot be empty"))]
    pub full_name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: Option<bool>,
    pub share_percentage: Option<Decimal>,
}
