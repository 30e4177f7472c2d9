//! Legacy tutor backfill.
//!
//! Early records were captured without a tutor reference. Given a mapping of
//! customer email to tutor email, this assigns the tutor to that customer's
//! tutorless appointments and invoices. Callers follow up with
//! [`recalculate_all`](crate::services::recalc::recalculate_all) so the
//! newly assigned invoices reach the right ledgers.

use backoffice_core::error::AppError;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::services::store::BackofficeStore;

/// One customer-to-tutor pairing, keyed by email.
#[derive(Debug, Clone, Deserialize)]
pub struct TutorAssignment {
    pub customer_email: String,
    pub tutor_email: String,
}

/// Outcome of a backfill run.
#[derive(Debug, Clone, Default)]
pub struct BackfillSummary {
    pub appointments_updated: u64,
    pub invoices_updated: u64,
    pub unmatched_customers: Vec<String>,
    pub unmatched_tutors: Vec<String>,
}

/// Assign tutors to legacy tutorless records. Unmatched emails are reported,
/// not treated as failures, so one bad row does not abort the run.
#[instrument(skip(store, assignments), fields(assignment_count = assignments.len()))]
pub async fn assign_tutors<S: BackofficeStore>(
    store: &S,
    assignments: &[TutorAssignment],
) -> Result<BackfillSummary, AppError> {
    let mut summary = BackfillSummary::default();

    for assignment in assignments {
        let customer_email = assignment.customer_email.trim().to_lowercase();
        let tutor_email = assignment.tutor_email.trim().to_lowercase();

        let Some(customer) = store.get_customer_by_email(&customer_email).await? else {
            warn!(customer_email = %customer_email, "No customer with this email");
            summary.unmatched_customers.push(customer_email);
            continue;
        };
        let Some(tutor) = store.get_tutor_by_email(&tutor_email).await? else {
            warn!(tutor_email = %tutor_email, "No tutor with this email");
            summary.unmatched_tutors.push(tutor_email);
            continue;
        };

        let appointments = store
            .assign_tutor_to_customer_appointments(customer.customer_id, tutor.tutor_id)
            .await?;
        let invoices = store
            .assign_tutor_to_customer_invoices(customer.customer_id, tutor.tutor_id)
            .await?;

        info!(
            customer = %customer.full_name,
            tutor = %tutor.full_name,
            appointments_updated = appointments,
            invoices_updated = invoices,
            "Tutor assigned to legacy records"
        );

        summary.appointments_updated += appointments;
        summary.invoices_updated += invoices;
    }

    Ok(summary)
}
