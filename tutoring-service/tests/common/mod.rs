//! Test helper module for tutoring-service integration tests.
//!
//! Provides an in-memory [`BackofficeStore`] with the same semantics as the
//! Postgres store (unique emails and invoice numbers, tutor deletion
//! clearing references) plus seeding helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use backoffice_core::error::AppError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use tutoring_service::models::{
    Appointment, CreateCustomer, CreateInvoice, CreateTutor, Customer, Invoice,
    ListInvoicesFilter, Tutor, TutorLedger,
};
use tutoring_service::services::customers::CustomerService;
use tutoring_service::services::invoices::{DeletePolicy, InvoiceService};
use tutoring_service::services::split::SplitPolicy;
use tutoring_service::services::store::BackofficeStore;
use tutoring_service::services::tutors::TutorService;

#[derive(Default)]
struct Inner {
    tutors: HashMap<Uuid, Tutor>,
    customers: HashMap<Uuid, Customer>,
    appointments: HashMap<Uuid, Appointment>,
    invoices: HashMap<Uuid, Invoice>,
    all_invoice_numbers_taken: bool,
}

/// In-memory store shared between the service under test and the assertions.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every 5-digit invoice number read as taken, to exercise the
    /// generator's exhaustion path.
    pub fn saturate_invoice_numbers(&self) {
        self.inner.lock().unwrap().all_invoice_numbers_taken = true;
    }

    /// Insert an invoice row directly, bypassing the orchestrator. Used to
    /// seed legacy shapes (no tutor, dangling tutor reference).
    pub fn seed_invoice(&self, invoice: Invoice) {
        self.inner
            .lock()
            .unwrap()
            .invoices
            .insert(invoice.invoice_id, invoice);
    }

    pub fn stored_invoice(&self, invoice_id: Uuid) -> Option<Invoice> {
        self.inner.lock().unwrap().invoices.get(&invoice_id).cloned()
    }

    pub fn stored_ledger(&self, tutor_id: Uuid) -> TutorLedger {
        self.inner.lock().unwrap().tutors[&tutor_id].ledger.clone()
    }
}

#[async_trait]
impl BackofficeStore for MemoryStore {
    async fn insert_tutor(&self, tutor: &Tutor) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.tutors.values().any(|t| t.email == tutor.email) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Tutor with email {} already exists",
                tutor.email
            )));
        }
        inner.tutors.insert(tutor.tutor_id, tutor.clone());
        Ok(())
    }

    async fn get_tutor(&self, tutor_id: Uuid) -> Result<Option<Tutor>, AppError> {
        Ok(self.inner.lock().unwrap().tutors.get(&tutor_id).cloned())
    }

    async fn get_tutor_by_email(&self, email: &str) -> Result<Option<Tutor>, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .tutors
            .values()
            .find(|t| t.email == email)
            .cloned())
    }

    async fn list_tutors(&self, active_only: bool) -> Result<Vec<Tutor>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut tutors: Vec<Tutor> = inner
            .tutors
            .values()
            .filter(|t| !active_only || t.is_active)
            .cloned()
            .collect();
        tutors.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(tutors)
    }

    async fn update_tutor(&self, tutor: &Tutor) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .tutors
            .values()
            .any(|t| t.tutor_id != tutor.tutor_id && t.email == tutor.email)
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Email {} already in use",
                tutor.email
            )));
        }
        if let Some(stored) = inner.tutors.get_mut(&tutor.tutor_id) {
            // Profile fields only; the ledger has its own write path.
            stored.full_name = tutor.full_name.clone();
            stored.email = tutor.email.clone();
            stored.phone_number = tutor.phone_number.clone();
            stored.is_active = tutor.is_active;
            stored.share_percentage = tutor.share_percentage;
        }
        Ok(())
    }

    async fn update_tutor_ledger(
        &self,
        tutor_id: Uuid,
        ledger: &TutorLedger,
    ) -> Result<(), AppError> {
        if let Some(stored) = self.inner.lock().unwrap().tutors.get_mut(&tutor_id) {
            stored.ledger = ledger.clone();
        }
        Ok(())
    }

    async fn delete_tutor(&self, tutor_id: Uuid) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let deleted = inner.tutors.remove(&tutor_id).is_some();
        if deleted {
            // Mirrors ON DELETE SET NULL on the foreign keys.
            for invoice in inner.invoices.values_mut() {
                if invoice.tutor_id == Some(tutor_id) {
                    invoice.tutor_id = None;
                }
            }
            for appointment in inner.appointments.values_mut() {
                if appointment.tutor_id == Some(tutor_id) {
                    appointment.tutor_id = None;
                }
            }
        }
        Ok(deleted)
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.customers.values().any(|c| c.email == customer.email) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Customer with email {} already exists",
                customer.email
            )));
        }
        inner.customers.insert(customer.customer_id, customer.clone());
        Ok(())
    }

    async fn get_customer(&self, customer_id: Uuid) -> Result<Option<Customer>, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .customers
            .get(&customer_id)
            .cloned())
    }

    async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .customers
            .values()
            .find(|c| c.email == email)
            .cloned())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut customers: Vec<Customer> = inner.customers.values().cloned().collect();
        customers.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(customers)
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> Result<(), AppError> {
        self.inner
            .lock()
            .unwrap()
            .appointments
            .insert(appointment.appointment_id, appointment.clone());
        Ok(())
    }

    async fn get_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Appointment>, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .appointments
            .get(&appointment_id)
            .cloned())
    }

    async fn update_appointment(&self, appointment: &Appointment) -> Result<(), AppError> {
        self.inner
            .lock()
            .unwrap()
            .appointments
            .insert(appointment.appointment_id, appointment.clone());
        Ok(())
    }

    async fn delete_appointment(&self, appointment_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .appointments
            .remove(&appointment_id)
            .is_some())
    }

    async fn assign_tutor_to_customer_appointments(
        &self,
        customer_id: Uuid,
        tutor_id: Uuid,
    ) -> Result<u64, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let mut updated = 0;
        for appointment in inner.appointments.values_mut() {
            if appointment.customer_id == customer_id && appointment.tutor_id.is_none() {
                appointment.tutor_id = Some(tutor_id);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .invoices
            .values()
            .any(|i| i.invoice_number == invoice.invoice_number)
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Invoice number {} already exists",
                invoice.invoice_number
            )));
        }
        inner.invoices.insert(invoice.invoice_id, invoice.clone());
        Ok(())
    }

    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        Ok(self.inner.lock().unwrap().invoices.get(&invoice_id).cloned())
    }

    async fn invoice_number_exists(&self, invoice_number: &str) -> Result<bool, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.all_invoice_numbers_taken
            || inner
                .invoices
                .values()
                .any(|i| i.invoice_number == invoice_number))
    }

    async fn list_invoices(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut invoices: Vec<Invoice> = inner
            .invoices
            .values()
            .filter(|i| filter.is_paid.map_or(true, |paid| i.is_paid == paid))
            .filter(|i| filter.customer_id.map_or(true, |id| i.customer_id == id))
            .filter(|i| filter.tutor_id.map_or(true, |id| i.tutor_id == Some(id)))
            .filter(|i| filter.start_date.map_or(true, |d| i.session_date >= d))
            .filter(|i| filter.end_date.map_or(true, |d| i.session_date <= d))
            .cloned()
            .collect();
        invoices.sort_by(|a, b| {
            (a.session_date, &a.invoice_number).cmp(&(b.session_date, &b.invoice_number))
        });
        Ok(invoices)
    }

    async fn list_paid_invoices_for_tutor(
        &self,
        tutor_id: Uuid,
    ) -> Result<Vec<Invoice>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut invoices: Vec<Invoice> = inner
            .invoices
            .values()
            .filter(|i| i.tutor_id == Some(tutor_id) && i.is_paid)
            .cloned()
            .collect();
        invoices.sort_by_key(|i| i.session_date);
        Ok(invoices)
    }

    async fn list_invoices_without_tutor(&self) -> Result<Vec<Invoice>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut invoices: Vec<Invoice> = inner
            .invoices
            .values()
            .filter(|i| i.tutor_id.is_none())
            .cloned()
            .collect();
        invoices.sort_by_key(|i| i.session_date);
        Ok(invoices)
    }

    async fn assign_tutor_to_customer_invoices(
        &self,
        customer_id: Uuid,
        tutor_id: Uuid,
    ) -> Result<u64, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let mut updated = 0;
        for invoice in inner.invoices.values_mut() {
            if invoice.customer_id == customer_id && invoice.tutor_id.is_none() {
                invoice.tutor_id = Some(tutor_id);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .invoices
            .values()
            .any(|i| i.invoice_id != invoice.invoice_id && i.invoice_number == invoice.invoice_number)
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Invoice number {} already exists",
                invoice.invoice_number
            )));
        }
        inner.invoices.insert(invoice.invoice_id, invoice.clone());
        Ok(())
    }

    async fn delete_invoice(&self, invoice_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .invoices
            .remove(&invoice_id)
            .is_some())
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// A session date before the 2024-12-05 milestone.
pub fn pre_milestone() -> NaiveDate {
    date(2024, 11, 1)
}

/// A session date after the milestone.
pub fn post_milestone() -> NaiveDate {
    date(2025, 1, 10)
}

/// Invoice service wired with the default policy and delete behavior.
pub fn invoice_service(store: &MemoryStore) -> InvoiceService<MemoryStore> {
    InvoiceService::new(
        store.clone(),
        SplitPolicy::default(),
        DeletePolicy::default(),
    )
}

pub async fn seed_tutor(store: &MemoryStore, name: &str, email: &str, share: u32) -> Tutor {
    TutorService::new(store.clone())
        .create_tutor(CreateTutor {
            full_name: name.to_string(),
            email: email.to_string(),
            phone_number: None,
            share_percentage: Some(Decimal::from(share)),
        })
        .await
        .expect("Failed to seed tutor")
}

pub async fn seed_customer(store: &MemoryStore, name: &str, email: &str) -> Customer {
    CustomerService::new(store.clone())
        .create_customer(CreateCustomer {
            full_name: name.to_string(),
            email: email.to_string(),
            phone_number: None,
        })
        .await
        .expect("Failed to seed customer")
}

/// CreateInvoice input with a generated invoice number.
pub fn invoice_input(
    customer: &Customer,
    tutor: &Tutor,
    session_date: NaiveDate,
    hours: u32,
    price: u32,
    is_paid: bool,
) -> CreateInvoice {
    CreateInvoice {
        invoice_number: None,
        customer_id: customer.customer_id,
        tutor_id: tutor.tutor_id,
        session_date,
        due_date: session_date + chrono::Duration::days(14),
        hours: Decimal::from(hours),
        price: Decimal::from(price),
        is_paid,
    }
}
