//! Storage seam for the back-office.
//!
//! The orchestrator and batch jobs run against this trait; production uses
//! the Postgres-backed [`Database`](crate::services::database::Database)
//! and tests use an in-memory implementation.

use async_trait::async_trait;
use backoffice_core::error::AppError;
use uuid::Uuid;

use crate::models::{
    Appointment, Customer, Invoice, ListInvoicesFilter, Tutor, TutorLedger,
};

#[async_trait]
pub trait BackofficeStore: Send + Sync {
    // Tutors
    async fn insert_tutor(&self, tutor: &Tutor) -> Result<(), AppError>;
    async fn get_tutor(&self, tutor_id: Uuid) -> Result<Option<Tutor>, AppError>;
    async fn get_tutor_by_email(&self, email: &str) -> Result<Option<Tutor>, AppError>;
    async fn list_tutors(&self, active_only: bool) -> Result<Vec<Tutor>, AppError>;
    /// Persist profile fields; ledger columns are written only by
    /// [`update_tutor_ledger`](Self::update_tutor_ledger).
    async fn update_tutor(&self, tutor: &Tutor) -> Result<(), AppError>;
    async fn update_tutor_ledger(
        &self,
        tutor_id: Uuid,
        ledger: &TutorLedger,
    ) -> Result<(), AppError>;
    async fn delete_tutor(&self, tutor_id: Uuid) -> Result<bool, AppError>;

    // Customers
    async fn insert_customer(&self, customer: &Customer) -> Result<(), AppError>;
    async fn get_customer(&self, customer_id: Uuid) -> Result<Option<Customer>, AppError>;
    async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>, AppError>;
    async fn list_customers(&self) -> Result<Vec<Customer>, AppError>;

    // Appointments
    async fn insert_appointment(&self, appointment: &Appointment) -> Result<(), AppError>;
    async fn get_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Appointment>, AppError>;
    async fn update_appointment(&self, appointment: &Appointment) -> Result<(), AppError>;
    async fn delete_appointment(&self, appointment_id: Uuid) -> Result<bool, AppError>;
    /// Assign `tutor_id` to the customer's tutorless appointments, returning
    /// how many rows changed.
    async fn assign_tutor_to_customer_appointments(
        &self,
        customer_id: Uuid,
        tutor_id: Uuid,
    ) -> Result<u64, AppError>;

    // Invoices
    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), AppError>;
    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError>;
    async fn invoice_number_exists(&self, invoice_number: &str) -> Result<bool, AppError>;
    async fn list_invoices(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError>;
    async fn list_paid_invoices_for_tutor(&self, tutor_id: Uuid)
        -> Result<Vec<Invoice>, AppError>;
    async fn list_invoices_without_tutor(&self) -> Result<Vec<Invoice>, AppError>;
    /// Assign `tutor_id` to the customer's tutorless invoices, returning how
    /// many rows changed.
    async fn assign_tutor_to_customer_invoices(
        &self,
        customer_id: Uuid,
        tutor_id: Uuid,
    ) -> Result<u64, AppError>;
    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), AppError>;
    async fn delete_invoice(&self, invoice_id: Uuid) -> Result<bool, AppError>;
}
