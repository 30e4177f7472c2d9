//! Customer administration.

use backoffice_core::error::AppError;
use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::models::{CreateCustomer, Customer};
use crate::services::store::BackofficeStore;

pub struct CustomerService<S> {
    store: S,
}

impl<S: BackofficeStore> CustomerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip(self, input))]
    pub async fn create_customer(&self, input: CreateCustomer) -> Result<Customer, AppError> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        if self.store.get_customer_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Customer with email {} already exists",
                email
            )));
        }

        let customer = Customer {
            customer_id: Uuid::new_v4(),
            full_name: input.full_name,
            email,
            phone_number: input.phone_number,
            created_utc: Utc::now(),
        };
        self.store.insert_customer(&customer).await?;

        Ok(customer)
    }

    pub async fn get_customer(&self, customer_id: Uuid) -> Result<Customer, AppError> {
        self.store.get_customer(customer_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Customer {} not found", customer_id))
        })
    }

    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        self.store.list_customers().await
    }
}
