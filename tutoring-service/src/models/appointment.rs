//! Appointment model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Appointment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Canceled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Canceled => "canceled",
        }
    }
}

/// Scheduled tutoring session.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_id: Uuid,
    pub customer_id: Uuid,
    /// Legacy rows may lack a tutor; deleting a tutor also clears this.
    pub tutor_id: Option<Uuid>,
    pub course_name: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    pub status: String,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating an appointment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAppointment {
    pub customer_id: Uuid,
    pub tutor_id: Uuid,
    #[validate(length(min = 1, message = "Course name is required"))]
    pub course_name: String,
    pub appointment_date: NaiveDate,
    #[validate(length(min = 1, message = "Appointment time is required"))]
    pub appointment_time: String,
    pub status: Option<AppointmentStatus>,
}

/// Input for updating an appointment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateAppointment {
    #[validate(length(min = 1, message = "Course name is required"))]
    pub course_name: String,
    pub appointment_date: NaiveDate,
    #[validate(length(min = 1, message = "Appointment time is required"))]
    pub appointment_time: String,
    pub status: AppointmentStatus,
    pub tutor_id: Option<Uuid>,
}
