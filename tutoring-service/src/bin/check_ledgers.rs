//! Read-only ledger drift check.
//!
//! Compares every tutor's stored ledger against a fresh rebuild from their
//! paid invoices. Exits non-zero when drift is found; run
//! `recalculate-shares` to repair it.

use backoffice_core::error::AppError;
use backoffice_core::observability::init_tracing;
use tracing::{error, info};

use tutoring_service::config::Settings;
use tutoring_service::services::database::Database;
use tutoring_service::services::recalc;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let settings = Settings::load()?;
    init_tracing(&settings.log_level);

    let db = Database::new(
        &settings.database.url,
        settings.database.max_connections,
        settings.database.min_connections,
    )
    .await?;
    db.run_migrations().await?;

    let drifted = recalc::check_ledgers(&db).await?;
    if drifted.is_empty() {
        info!("All tutor ledgers match their paid invoices");
        return Ok(());
    }

    for drift in &drifted {
        error!(
            tutor = %drift.full_name,
            stored_earnings = %drift.stored.total_earnings,
            expected_earnings = %drift.expected.total_earnings,
            stored_sessions_after = drift.stored.session_count_after_split,
            expected_sessions_after = drift.expected.session_count_after_split,
            "Ledger drift"
        );
    }

    Err(AppError::InternalError(anyhow::anyhow!(
        "{} tutor ledger(s) drifted from their invoices; run recalculate-shares",
        drifted.len()
    )))
}
