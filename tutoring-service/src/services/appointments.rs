//! Appointment administration.

use backoffice_core::error::AppError;
use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Appointment, AppointmentStatus, CreateAppointment, UpdateAppointment};
use crate::services::store::BackofficeStore;

pub struct AppointmentService<S> {
    store: S,
}

impl<S: BackofficeStore> AppointmentService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    pub async fn create_appointment(
        &self,
        input: CreateAppointment,
    ) -> Result<Appointment, AppError> {
        input.validate()?;

        if self.store.get_customer(input.customer_id).await?.is_none() {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Customer {} not found",
                input.customer_id
            )));
        }
        if self.store.get_tutor(input.tutor_id).await?.is_none() {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Tutor {} not found",
                input.tutor_id
            )));
        }

        let appointment = Appointment {
            appointment_id: Uuid::new_v4(),
            customer_id: input.customer_id,
            tutor_id: Some(input.tutor_id),
            course_name: input.course_name,
            appointment_date: input.appointment_date,
            appointment_time: input.appointment_time,
            status: input
                .status
                .unwrap_or(AppointmentStatus::Scheduled)
                .as_str()
                .to_string(),
            created_utc: Utc::now(),
        };
        self.store.insert_appointment(&appointment).await?;

        Ok(appointment)
    }

    #[instrument(skip(self, input), fields(appointment_id = %appointment_id))]
    pub async fn update_appointment(
        &self,
        appointment_id: Uuid,
        input: UpdateAppointment,
    ) -> Result<Appointment, AppError> {
        input.validate()?;

        let mut appointment = self
            .store
            .get_appointment(appointment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Appointment {} not found", appointment_id))
            })?;

        if let Some(tutor_id) = input.tutor_id {
            if self.store.get_tutor(tutor_id).await?.is_none() {
                return Err(AppError::NotFound(anyhow::anyhow!(
                    "Tutor {} not found",
                    tutor_id
                )));
            }
            appointment.tutor_id = Some(tutor_id);
        }

        appointment.course_name = input.course_name;
        appointment.appointment_date = input.appointment_date;
        appointment.appointment_time = input.appointment_time;
        appointment.status = input.status.as_str().to_string();

        self.store.update_appointment(&appointment).await?;

        Ok(appointment)
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppError> {
        self.store.get_appointment(appointment_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Appointment {} not found", appointment_id))
        })
    }

    #[instrument(skip(self), fields(appointment_id = %appointment_id))]
    pub async fn delete_appointment(&self, appointment_id: Uuid) -> Result<(), AppError> {
        let deleted = self.store.delete_appointment(appointment_id).await?;
        if !deleted {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Appointment {} not found",
                appointment_id
            )));
        }
        Ok(())
    }
}
