//! Retroactive split recalculation.
//!
//! Recomputes every invoice's split fields from the configured policy and
//! rebuilds every tutor's earnings ledger from their paid invoices, then
//! prints the company-level totals. Safe to re-run at any time.

use backoffice_core::error::AppError;
use backoffice_core::observability::init_tracing;
use tracing::{info, warn};

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

    let policy = settings.split.policy();
    let summary = recalc::recalculate_all(&db, &policy).await?;

    info!(
        invoices_updated = summary.invoices_updated,
        unpaid = summary.unpaid_count,
        "Invoice recalculation finished"
    );
    info!(
        count = summary.before_split_count,
        total = %summary.before_split_total,
        "Paid before the split milestone (all business revenue)"
    );
    info!(
        count = summary.after_split_count,
        tutor_total = %summary.after_split_tutor_total,
        business_total = %summary.after_split_business_total,
        "Paid under the split rule"
    );
    for skipped in &summary.skipped {
        warn!(
            invoice_number = %skipped.invoice_number,
            "Skipped: no tutor assigned"
        );
    }
    if summary.unresolvable_tutor_count > 0 {
        warn!(
            count = summary.unresolvable_tutor_count,
            "Invoices recalculated with the 50/50 fallback (tutor record missing)"
        );
    }

    for tutor in &summary.tutors {
        info!(
            tutor = %tutor.full_name,
            earnings_before_split = %tutor.ledger.total_earnings_before_split,
            earnings_after_split = %tutor.ledger.total_earnings_after_split,
            business_share = %tutor.ledger.total_business_share,
            sessions_before = tutor.ledger.session_count_before_split,
            sessions_after = tutor.ledger.session_count_after_split,
            payable = %tutor.ledger.total_earnings,
            "Ledger rebuilt"
        );
    }

    let business = recalc::business_summary(&db).await?;
    info!(
        paid_invoices = business.paid_invoice_count,
        business_revenue = %business.business_revenue,
        tutor_payouts = %business.tutor_payouts,
        grand_total = %business.grand_total,
        "Business summary"
    );

    Ok(())
}
