//! Postgres-backed store for the tutoring back-office.

use async_trait::async_trait;
use backoffice_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{
    Appointment, Customer, Invoice, ListInvoicesFilter, Tutor, TutorLedger,
};
use crate::services::store::BackofficeStore;

const TUTOR_COLUMNS: &str = "tutor_id, full_name, email, phone_number, is_active, share_percentage, \
     total_earnings_before_split, total_earnings_after_split, total_business_share, \
     session_count_before_split, session_count_after_split, total_earnings, created_utc";

const INVOICE_COLUMNS: &str = "invoice_id, invoice_number, customer_id, tutor_id, session_date, due_date, \
     hours, price, total, is_paid, applies_split_rule, tutor_share, business_share, created_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "tutoring-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl BackofficeStore for Database {
    // -------------------------------------------------------------------------
    // Tutor Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, tutor), fields(tutor_id = %tutor.tutor_id))]
    async fn insert_tutor(&self, tutor: &Tutor) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO tutors (
                tutor_id, full_name, email, phone_number, is_active, share_percentage,
                total_earnings_before_split, total_earnings_after_split, total_business_share,
                session_count_before_split, session_count_after_split, total_earnings, created_utc
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(tutor.tutor_id)
        .bind(&tutor.full_name)
        .bind(&tutor.email)
        .bind(&tutor.phone_number)
        .bind(tutor.is_active)
        .bind(tutor.share_percentage)
        .bind(tutor.ledger.total_earnings_before_split)
        .bind(tutor.ledger.total_earnings_after_split)
        .bind(tutor.ledger.total_business_share)
        .bind(tutor.ledger.session_count_before_split)
        .bind(tutor.ledger.session_count_after_split)
        .bind(tutor.ledger.total_earnings)
        .bind(tutor.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Tutor with email {} already exists",
                    tutor.email
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert tutor: {}", e)),
        })?;

        info!(tutor_id = %tutor.tutor_id, "Tutor created");

        Ok(())
    }

    #[instrument(skip(self), fields(tutor_id = %tutor_id))]
    async fn get_tutor(&self, tutor_id: Uuid) -> Result<Option<Tutor>, AppError> {
        let tutor = sqlx::query_as::<_, Tutor>(&format!(
            "SELECT {TUTOR_COLUMNS} FROM tutors WHERE tutor_id = $1"
        ))
        .bind(tutor_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get tutor: {}", e)))?;

        Ok(tutor)
    }

    #[instrument(skip(self, email))]
    async fn get_tutor_by_email(&self, email: &str) -> Result<Option<Tutor>, AppError> {
        let tutor = sqlx::query_as::<_, Tutor>(&format!(
            "SELECT {TUTOR_COLUMNS} FROM tutors WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get tutor by email: {}", e))
        })?;

        Ok(tutor)
    }

    #[instrument(skip(self))]
    async fn list_tutors(&self, active_only: bool) -> Result<Vec<Tutor>, AppError> {
        let tutors = sqlx::query_as::<_, Tutor>(&format!(
            r#"
            SELECT {TUTOR_COLUMNS}
            FROM tutors
            WHERE ($1::bool = FALSE OR is_active = TRUE)
            ORDER BY full_name
            "#
        ))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list tutors: {}", e)))?;

        Ok(tutors)
    }

    #[instrument(skip(self, tutor), fields(tutor_id = %tutor.tutor_id))]
    async fn update_tutor(&self, tutor: &Tutor) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE tutors
            SET full_name = $2, email = $3, phone_number = $4, is_active = $5, share_percentage = $6
            WHERE tutor_id = $1
            "#,
        )
        .bind(tutor.tutor_id)
        .bind(&tutor.full_name)
        .bind(&tutor.email)
        .bind(&tutor.phone_number)
        .bind(tutor.is_active)
        .bind(tutor.share_percentage)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Email {} already in use", tutor.email))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update tutor: {}", e)),
        })?;

        Ok(())
    }

    #[instrument(skip(self, ledger), fields(tutor_id = %tutor_id))]
    async fn update_tutor_ledger(
        &self,
        tutor_id: Uuid,
        ledger: &TutorLedger,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE tutors
            SET total_earnings_before_split = $2,
                total_earnings_after_split = $3,
                total_business_share = $4,
                session_count_before_split = $5,
                session_count_after_split = $6,
                total_earnings = $7
            WHERE tutor_id = $1
            "#,
        )
        .bind(tutor_id)
        .bind(ledger.total_earnings_before_split)
        .bind(ledger.total_earnings_after_split)
        .bind(ledger.total_business_share)
        .bind(ledger.session_count_before_split)
        .bind(ledger.session_count_after_split)
        .bind(ledger.total_earnings)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update tutor ledger: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(tutor_id = %tutor_id))]
    async fn delete_tutor(&self, tutor_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tutors WHERE tutor_id = $1")
            .bind(tutor_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete tutor: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Customer Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, customer), fields(customer_id = %customer.customer_id))]
    async fn insert_customer(&self, customer: &Customer) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO customers (customer_id, full_name, email, phone_number, created_utc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(customer.customer_id)
        .bind(&customer.full_name)
        .bind(&customer.email)
        .bind(&customer.phone_number)
        .bind(customer.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Customer with email {} already exists",
                    customer.email
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert customer: {}", e)),
        })?;

        info!(customer_id = %customer.customer_id, "Customer created");

        Ok(())
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn get_customer(&self, customer_id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, full_name, email, phone_number, created_utc
            FROM customers
            WHERE customer_id = $1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e)))?;

        Ok(customer)
    }

    #[instrument(skip(self, email))]
    async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, full_name, email, phone_number, created_utc
            FROM customers
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get customer by email: {}", e))
        })?;

        Ok(customer)
    }

    #[instrument(skip(self))]
    async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, full_name, email, phone_number, created_utc
            FROM customers
            ORDER BY full_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list customers: {}", e)))?;

        Ok(customers)
    }

    // -------------------------------------------------------------------------
    // Appointment Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, appointment), fields(appointment_id = %appointment.appointment_id))]
    async fn insert_appointment(&self, appointment: &Appointment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO appointments (
                appointment_id, customer_id, tutor_id, course_name,
                appointment_date, appointment_time, status, created_utc
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(appointment.appointment_id)
        .bind(appointment.customer_id)
        .bind(appointment.tutor_id)
        .bind(&appointment.course_name)
        .bind(appointment.appointment_date)
        .bind(&appointment.appointment_time)
        .bind(&appointment.status)
        .bind(appointment.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to insert appointment: {}", e))
        })?;

        info!(appointment_id = %appointment.appointment_id, "Appointment created");

        Ok(())
    }

    #[instrument(skip(self), fields(appointment_id = %appointment_id))]
    async fn get_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Appointment>, AppError> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT appointment_id, customer_id, tutor_id, course_name,
                   appointment_date, appointment_time, status, created_utc
            FROM appointments
            WHERE appointment_id = $1
            "#,
        )
        .bind(appointment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get appointment: {}", e)))?;

        Ok(appointment)
    }

    #[instrument(skip(self, appointment), fields(appointment_id = %appointment.appointment_id))]
    async fn update_appointment(&self, appointment: &Appointment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE appointments
            SET customer_id = $2, tutor_id = $3, course_name = $4,
                appointment_date = $5, appointment_time = $6, status = $7
            WHERE appointment_id = $1
            "#,
        )
        .bind(appointment.appointment_id)
        .bind(appointment.customer_id)
        .bind(appointment.tutor_id)
        .bind(&appointment.course_name)
        .bind(appointment.appointment_date)
        .bind(&appointment.appointment_time)
        .bind(&appointment.status)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update appointment: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(appointment_id = %appointment_id))]
    async fn delete_appointment(&self, appointment_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM appointments WHERE appointment_id = $1")
            .bind(appointment_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete appointment: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(customer_id = %customer_id, tutor_id = %tutor_id))]
    async fn assign_tutor_to_customer_appointments(
        &self,
        customer_id: Uuid,
        tutor_id: Uuid,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE appointments SET tutor_id = $2 WHERE customer_id = $1 AND tutor_id IS NULL",
        )
        .bind(customer_id)
        .bind(tutor_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to assign appointments: {}", e))
        })?;

        Ok(result.rows_affected())
    }

    // -------------------------------------------------------------------------
    // Invoice Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.invoice_id))]
    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                invoice_id, invoice_number, customer_id, tutor_id, session_date, due_date,
                hours, price, total, is_paid, applies_split_rule, tutor_share, business_share,
                created_utc
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(invoice.invoice_id)
        .bind(&invoice.invoice_number)
        .bind(invoice.customer_id)
        .bind(invoice.tutor_id)
        .bind(invoice.session_date)
        .bind(invoice.due_date)
        .bind(invoice.hours)
        .bind(invoice.price)
        .bind(invoice.total)
        .bind(invoice.is_paid)
        .bind(invoice.applies_split_rule)
        .bind(invoice.tutor_share)
        .bind(invoice.business_share)
        .bind(invoice.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Invoice number {} already exists",
                    invoice.invoice_number
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert invoice: {}", e)),
        })?;

        info!(
            invoice_id = %invoice.invoice_id,
            invoice_number = %invoice.invoice_number,
            "Invoice created"
        );

        Ok(())
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_id = $1"
        ))
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        Ok(invoice)
    }

    #[instrument(skip(self, invoice_number))]
    async fn invoice_number_exists(&self, invoice_number: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM invoices WHERE invoice_number = $1)",
        )
        .bind(invoice_number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to check invoice number: {}", e))
        })?;

        Ok(exists)
    }

    #[instrument(skip(self, filter))]
    async fn list_invoices(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}
            FROM invoices
            WHERE ($1::bool IS NULL OR is_paid = $1)
              AND ($2::uuid IS NULL OR customer_id = $2)
              AND ($3::uuid IS NULL OR tutor_id = $3)
              AND ($4::date IS NULL OR session_date >= $4)
              AND ($5::date IS NULL OR session_date <= $5)
            ORDER BY session_date, invoice_number
            "#
        ))
        .bind(filter.is_paid)
        .bind(filter.customer_id)
        .bind(filter.tutor_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        Ok(invoices)
    }

    #[instrument(skip(self), fields(tutor_id = %tutor_id))]
    async fn list_paid_invoices_for_tutor(
        &self,
        tutor_id: Uuid,
    ) -> Result<Vec<Invoice>, AppError> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}
            FROM invoices
            WHERE tutor_id = $1 AND is_paid = TRUE
            ORDER BY session_date
            "#
        ))
        .bind(tutor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list tutor invoices: {}", e))
        })?;

        Ok(invoices)
    }

    #[instrument(skip(self))]
    async fn list_invoices_without_tutor(&self) -> Result<Vec<Invoice>, AppError> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}
            FROM invoices
            WHERE tutor_id IS NULL
            ORDER BY session_date
            "#
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list orphaned invoices: {}", e))
        })?;

        Ok(invoices)
    }

    #[instrument(skip(self), fields(customer_id = %customer_id, tutor_id = %tutor_id))]
    async fn assign_tutor_to_customer_invoices(
        &self,
        customer_id: Uuid,
        tutor_id: Uuid,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE invoices SET tutor_id = $2 WHERE customer_id = $1 AND tutor_id IS NULL",
        )
        .bind(customer_id)
        .bind(tutor_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to assign invoices: {}", e)))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.invoice_id))]
    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE invoices
            SET invoice_number = $2, customer_id = $3, tutor_id = $4, session_date = $5,
                due_date = $6, hours = $7, price = $8, total = $9, is_paid = $10,
                applies_split_rule = $11, tutor_share = $12, business_share = $13
            WHERE invoice_id = $1
            "#,
        )
        .bind(invoice.invoice_id)
        .bind(&invoice.invoice_number)
        .bind(invoice.customer_id)
        .bind(invoice.tutor_id)
        .bind(invoice.session_date)
        .bind(invoice.due_date)
        .bind(invoice.hours)
        .bind(invoice.price)
        .bind(invoice.total)
        .bind(invoice.is_paid)
        .bind(invoice.applies_split_rule)
        .bind(invoice.tutor_share)
        .bind(invoice.business_share)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Invoice number {} already exists",
                    invoice.invoice_number
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e)),
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn delete_invoice(&self, invoice_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM invoices WHERE invoice_id = $1")
            .bind(invoice_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete invoice: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
