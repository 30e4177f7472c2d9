//! Tutor administration.

use backoffice_core::error::AppError;
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    default_share_percentage, validate_share_percentage, CreateTutor, Tutor, TutorLedger,
    UpdateTutor,
};
use crate::services::store::BackofficeStore;

pub struct TutorService<S> {
    store: S,
}

impl<S: BackofficeStore> TutorService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip(self, input))]
    pub async fn create_tutor(&self, input: CreateTutor) -> Result<Tutor, AppError> {
        input.validate()?;

        let share_percentage = input
            .share_percentage
            .unwrap_or_else(default_share_percentage);
        validate_share_percentage(share_percentage)?;

        let email = input.email.trim().to_lowercase();
        if self.store.get_tutor_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Tutor with email {} already exists",
                email
            )));
        }

        let tutor = Tutor {
            tutor_id: Uuid::new_v4(),
            full_name: input.full_name,
            email,
            phone_number: input.phone_number,
            is_active: true,
            share_percentage,
            ledger: TutorLedger::default(),
            created_utc: Utc::now(),
        };
        self.store.insert_tutor(&tutor).await?;

        Ok(tutor)
    }

    /// Update profile fields. A changed share percentage affects future
    /// calculations only; history is restated by the recalculation job.
    #[instrument(skip(self, input), fields(tutor_id = %tutor_id))]
    pub async fn update_tutor(&self, tutor_id: Uuid, input: UpdateTutor) -> Result<Tutor, AppError> {
        input.validate()?;

        let mut tutor = self.store.get_tutor(tutor_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Tutor {} not found", tutor_id))
        })?;

        if let Some(full_name) = input.full_name {
            tutor.full_name = full_name;
        }
        if let Some(email) = input.email {
            let email = email.trim().to_lowercase();
            if email != tutor.email {
                if self.store.get_tutor_by_email(&email).await?.is_some() {
                    return Err(AppError::Conflict(anyhow::anyhow!(
                        "Email {} already in use",
                        email
                    )));
                }
                tutor.email = email;
            }
        }
        if let Some(phone_number) = input.phone_number {
            tutor.phone_number = Some(phone_number);
        }
        if let Some(is_active) = input.is_active {
            tutor.is_active = is_active;
        }
        if let Some(share_percentage) = input.share_percentage {
            validate_share_percentage(share_percentage)?;
            tutor.share_percentage = share_percentage;
        }

        self.store.update_tutor(&tutor).await?;

        Ok(tutor)
    }

    pub async fn get_tutor(&self, tutor_id: Uuid) -> Result<Tutor, AppError> {
        self.store.get_tutor(tutor_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Tutor {} not found", tutor_id))
        })
    }

    pub async fn list_tutors(&self, active_only: bool) -> Result<Vec<Tutor>, AppError> {
        self.store.list_tutors(active_only).await
    }

    /// Delete a tutor. Their invoices and appointments keep existing with a
    /// cleared tutor reference; paid history on other ledgers is untouched.
    #[instrument(skip(self), fields(tutor_id = %tutor_id))]
    pub async fn delete_tutor(&self, tutor_id: Uuid) -> Result<(), AppError> {
        let deleted = self.store.delete_tutor(tutor_id).await?;
        if !deleted {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Tutor {} not found",
                tutor_id
            )));
        }

        info!(tutor_id = %tutor_id, "Tutor deleted; their invoices are now orphaned");

        Ok(())
    }
}
