//! Batch recalculation and reconciliation.
//!
//! The authoritative definition of ledger correctness: recompute every
//! invoice's split from the policy, then rebuild every tutor's ledger from
//! exactly their paid invoices. The incremental deltas in
//! `services::invoices` must always agree with what this pass produces.

use backoffice_core::error::AppError;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::models::{Invoice, ListInvoicesFilter, TutorLedger};
use crate::services::ledger::{self, Contribution};
use crate::services::split::{calculate_shares, SplitPolicy, TutorResolution};
use crate::services::store::BackofficeStore;

/// Invoice skipped by the recalculation because it has no tutor reference.
#[derive(Debug, Clone)]
pub struct SkippedInvoice {
    pub invoice_id: Uuid,
    pub invoice_number: String,
}

/// A tutor's rebuilt ledger.
#[derive(Debug, Clone)]
pub struct TutorRecalculation {
    pub tutor_id: Uuid,
    pub full_name: String,
    pub ledger: TutorLedger,
}

/// Outcome of a full recalculation pass.
#[derive(Debug, Clone, Default)]
pub struct RecalculationSummary {
    pub invoices_updated: usize,
    /// Invoices with an assigned tutor whose record no longer resolves;
    /// their shares fall back to 50/50 but no ledger receives them.
    pub unresolvable_tutor_count: usize,
    pub skipped: Vec<SkippedInvoice>,
    pub unpaid_count: usize,
    pub before_split_count: usize,
    pub before_split_total: Decimal,
    pub after_split_count: usize,
    pub after_split_tutor_total: Decimal,
    pub after_split_business_total: Decimal,
    pub tutors: Vec<TutorRecalculation>,
}

/// Stored-versus-rebuilt mismatch for one tutor.
#[derive(Debug, Clone)]
pub struct LedgerDrift {
    pub tutor_id: Uuid,
    pub full_name: String,
    pub stored: TutorLedger,
    pub expected: TutorLedger,
}

/// Company-level totals over paid, tutor-assigned invoices.
#[derive(Debug, Clone, Default)]
pub struct BusinessSummary {
    pub paid_invoice_count: usize,
    pub business_revenue: Decimal,
    pub tutor_payouts: Decimal,
    pub grand_total: Decimal,
}

/// Recompute every invoice's split fields and rebuild every tutor ledger
/// from scratch. Idempotent: a second run over the same invoice set writes
/// identical values.
#[instrument(skip(store, policy))]
pub async fn recalculate_all<S: BackofficeStore>(
    store: &S,
    policy: &SplitPolicy,
) -> Result<RecalculationSummary, AppError> {
    let mut summary = RecalculationSummary::default();

    let invoices = store.list_invoices(&ListInvoicesFilter::default()).await?;
    info!(invoice_count = invoices.len(), "Recalculating invoice splits");

    for invoice in invoices {
        let Some(tutor_id) = invoice.tutor_id else {
            summary.skipped.push(SkippedInvoice {
                invoice_id: invoice.invoice_id,
                invoice_number: invoice.invoice_number,
            });
            continue;
        };

        let resolution = match store.get_tutor(tutor_id).await? {
            Some(tutor) => TutorResolution::Resolved(tutor.share_percentage),
            None => {
                summary.unresolvable_tutor_count += 1;
                warn!(
                    invoice_number = %invoice.invoice_number,
                    tutor_id = %tutor_id,
                    "Assigned tutor not found; using 50/50 fallback"
                );
                TutorResolution::Unresolvable
            }
        };

        let total = invoice.hours * invoice.price;
        let shares = calculate_shares(
            policy,
            total,
            invoice.session_date,
            resolution,
            invoice.is_paid,
        );

        let recalculated = Invoice {
            total,
            applies_split_rule: shares.applies_split_rule,
            tutor_share: shares.tutor_share,
            business_share: shares.business_share,
            ..invoice
        };
        store.update_invoice(&recalculated).await?;
        summary.invoices_updated += 1;

        if !recalculated.is_paid {
            summary.unpaid_count += 1;
        } else if recalculated.applies_split_rule {
            summary.after_split_count += 1;
            summary.after_split_tutor_total += recalculated.tutor_share;
            summary.after_split_business_total += recalculated.business_share;
        } else {
            summary.before_split_count += 1;
            summary.before_split_total += recalculated.total;
        }
    }

    if !summary.skipped.is_empty() {
        warn!(
            skipped_count = summary.skipped.len(),
            "Invoices without a tutor were skipped"
        );
    }

    for tutor in store.list_tutors(false).await? {
        let ledger = rebuild_ledger(store, tutor.tutor_id).await?;
        store.update_tutor_ledger(tutor.tutor_id, &ledger).await?;
        info!(
            tutor = %tutor.full_name,
            total_earnings = %ledger.total_earnings,
            sessions_after_split = ledger.session_count_after_split,
            "Tutor ledger rebuilt"
        );
        summary.tutors.push(TutorRecalculation {
            tutor_id: tutor.tutor_id,
            full_name: tutor.full_name,
            ledger,
        });
    }

    Ok(summary)
}

/// Compare every tutor's stored ledger against a fresh rebuild, without
/// writing anything.
#[instrument(skip(store))]
pub async fn check_ledgers<S: BackofficeStore>(store: &S) -> Result<Vec<LedgerDrift>, AppError> {
    let mut drifted = Vec::new();

    for tutor in store.list_tutors(false).await? {
        let expected = rebuild_ledger(store, tutor.tutor_id).await?;
        if tutor.ledger != expected {
            warn!(
                tutor = %tutor.full_name,
                stored_earnings = %tutor.ledger.total_earnings,
                expected_earnings = %expected.total_earnings,
                "Ledger drift detected"
            );
            drifted.push(LedgerDrift {
                tutor_id: tutor.tutor_id,
                full_name: tutor.full_name,
                stored: tutor.ledger,
                expected,
            });
        }
    }

    Ok(drifted)
}

/// Totals over paid, tutor-assigned invoices: what the business kept, what
/// the tutors are owed, and the gross amount collected.
#[instrument(skip(store))]
pub async fn business_summary<S: BackofficeStore>(store: &S) -> Result<BusinessSummary, AppError> {
    let filter = ListInvoicesFilter {
        is_paid: Some(true),
        ..Default::default()
    };

    let mut summary = BusinessSummary::default();
    for invoice in store.list_invoices(&filter).await? {
        if invoice.tutor_id.is_none() {
            continue;
        }
        summary.paid_invoice_count += 1;
        summary.business_revenue += invoice.business_share;
        summary.tutor_payouts += invoice.tutor_share;
        summary.grand_total += invoice.total;
    }

    Ok(summary)
}

/// Derive a tutor's ledger from exactly their paid invoices.
async fn rebuild_ledger<S: BackofficeStore>(
    store: &S,
    tutor_id: Uuid,
) -> Result<TutorLedger, AppError> {
    let mut ledger = TutorLedger::default();
    for invoice in store.list_paid_invoices_for_tutor(tutor_id).await? {
        ledger::apply_contribution(&mut ledger, &Contribution::of(&invoice));
    }
    Ok(ledger)
}
