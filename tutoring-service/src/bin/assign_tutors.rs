//! Legacy tutor backfill.
//!
//! Reads a JSON file of `{ "customer_email": ..., "tutor_email": ... }`
//! pairs, assigns each tutor to that customer's tutorless appointments and
//! invoices, then runs a full recalculation so the moved invoices land on
//! the right ledgers.

use backoffice_core::error::AppError;
use backoffice_core::observability::init_tracing;
use tracing::{info, warn};

use tutoring_service::config::Settings;
use tutoring_service::services::backfill::{self, TutorAssignment};
use tutoring_service::services::database::Database;
use tutoring_service::services::recalc;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let settings = Settings::load()?;
    init_tracing(&settings.log_level);

    let path = std::env::args().nth(1).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("Usage: assign-tutors <assignments.json>"))
    })?;
    let contents = std::fs::read_to_string(&path)?;
    let assignments: Vec<TutorAssignment> = serde_json::from_str(&contents)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid assignments file: {}", e)))?;

    let db = Database::new(
        &settings.database.url,
        settings.database.max_connections,
        settings.database.min_connections,
    )
    .await?;
    db.run_migrations().await?;

    let summary = backfill::assign_tutors(&db, &assignments).await?;
    info!(
        appointments_updated = summary.appointments_updated,
        invoices_updated = summary.invoices_updated,
        "Backfill finished"
    );
    for email in &summary.unmatched_customers {
        warn!(customer_email = %email, "Unmatched customer email");
    }
    for email in &summary.unmatched_tutors {
        warn!(tutor_email = %email, "Unmatched tutor email");
    }

    let policy = settings.split.policy();
    let recalculation = recalc::recalculate_all(&db, &policy).await?;
    info!(
        invoices_updated = recalculation.invoices_updated,
        tutors_rebuilt = recalculation.tutors.len(),
        "Post-backfill recalculation finished"
    );

    Ok(())
}
