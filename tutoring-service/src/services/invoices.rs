//! Invoice lifecycle orchestration.
//!
//! Sequences the split calculator and the ledger arithmetic around invoice
//! CRUD so the tutor ledgers never drift from the invoice set they are
//! derived from. The invoice row is written before the tutor row; a failure
//! between the two leaves the ledger stale, and `services::recalc` is the
//! recovery path.

use std::sync::Arc;

use backoffice_core::error::AppError;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::models::{CreateInvoice, Invoice, ListInvoicesFilter, Tutor, UpdateInvoice};
use crate::services::invoice_numbers;
use crate::services::ledger::{self, Contribution};
use crate::services::notify::{InvoiceNotification, InvoiceNotifier, LogNotifier};
use crate::services::split::{calculate_shares, SplitPolicy, TutorResolution};
use crate::services::store::BackofficeStore;

/// What happens to the assigned tutor's ledger when an invoice is deleted.
///
/// The legacy behavior keeps the deleted invoice's historical contribution
/// on the ledger; whether that is intended for paid, already-reported
/// invoices is an open product question, so both behaviors are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Keep the invoice's contribution on the tutor ledger.
    #[default]
    RetainContribution,
    /// Remove the invoice's contribution before deleting the invoice.
    ReverseContribution,
}

/// Invoice CRUD orchestrator.
pub struct InvoiceService<S> {
    store: S,
    policy: SplitPolicy,
    delete_policy: DeletePolicy,
    notifier: Arc<dyn InvoiceNotifier>,
}

impl<S: BackofficeStore> InvoiceService<S> {
    pub fn new(store: S, policy: SplitPolicy, delete_policy: DeletePolicy) -> Self {
        Self {
            store,
            policy,
            delete_policy,
            notifier: Arc::new(LogNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn InvoiceNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Create an invoice; when paid, the assigned tutor's ledger is credited
    /// in the same operation.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id, tutor_id = %input.tutor_id))]
    pub async fn create_invoice(&self, input: CreateInvoice) -> Result<Invoice, AppError> {
        input.validate()?;
        validate_amounts(input.hours, input.price)?;

        let customer = self
            .store
            .get_customer(input.customer_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Customer {} not found", input.customer_id))
            })?;
        let tutor = self.store.get_tutor(input.tutor_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Tutor {} not found", input.tutor_id))
        })?;

        let invoice_number = match input.invoice_number {
            Some(number) => {
                if self.store.invoice_number_exists(&number).await? {
                    return Err(AppError::Conflict(anyhow::anyhow!(
                        "Invoice number {} already exists",
                        number
                    )));
                }
                number
            }
            None => invoice_numbers::generate_unique(&self.store).await?,
        };

        let total = input.hours * input.price;
        let shares = calculate_shares(
            &self.policy,
            total,
            input.session_date,
            TutorResolution::Resolved(tutor.share_percentage),
            input.is_paid,
        );

        let invoice = Invoice {
            invoice_id: Uuid::new_v4(),
            invoice_number,
            customer_id: customer.customer_id,
            tutor_id: Some(tutor.tutor_id),
            session_date: input.session_date,
            due_date: input.due_date,
            hours: input.hours,
            price: input.price,
            total,
            is_paid: input.is_paid,
            applies_split_rule: shares.applies_split_rule,
            tutor_share: shares.tutor_share,
            business_share: shares.business_share,
            created_utc: Utc::now(),
        };

        self.store.insert_invoice(&invoice).await?;

        let tutor_name = tutor.full_name.clone();
        if invoice.is_paid {
            self.credit_tutor(tutor, &Contribution::of(&invoice)).await?;
        }

        let notification = InvoiceNotification {
            customer_name: customer.full_name,
            customer_email: customer.email,
            tutor_name: Some(tutor_name),
            invoice_number: invoice.invoice_number.clone(),
            session_date: invoice.session_date,
            due_date: invoice.due_date,
            total: invoice.total,
        };
        if let Err(e) = self.notifier.invoice_created(&notification).await {
            // The invoice is already saved; notification delivery is best-effort.
            warn!(
                invoice_number = %invoice.invoice_number,
                error = %e,
                "Invoice notification failed"
            );
        }

        Ok(invoice)
    }

    /// Update an invoice, moving its ledger contribution from the old tutor
    /// to the (possibly reassigned) one.
    ///
    /// The old contribution is removed before the new one is applied so a
    /// reassignment transfers earnings between ledgers without
    /// double-counting.
    #[instrument(skip(self, input), fields(invoice_id = %invoice_id))]
    pub async fn update_invoice(
        &self,
        invoice_id: Uuid,
        input: UpdateInvoice,
    ) -> Result<Invoice, AppError> {
        input.validate()?;
        validate_amounts(input.hours, input.price)?;

        let prior = self.store.get_invoice(invoice_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Invoice {} not found", invoice_id))
        })?;

        let effective_tutor_id = input.tutor_id.or(prior.tutor_id).ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!(
                "Invoice {} has no tutor and none was supplied",
                prior.invoice_number
            ))
        })?;
        let new_tutor = self
            .store
            .get_tutor(effective_tutor_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Tutor {} not found", effective_tutor_id))
            })?;

        if input.invoice_number != prior.invoice_number
            && self.store.invoice_number_exists(&input.invoice_number).await?
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Invoice number {} already exists",
                input.invoice_number
            )));
        }

        let total = input.hours * input.price;
        let shares = calculate_shares(
            &self.policy,
            total,
            input.session_date,
            TutorResolution::Resolved(new_tutor.share_percentage),
            input.is_paid,
        );

        let updated = Invoice {
            invoice_number: input.invoice_number,
            tutor_id: Some(new_tutor.tutor_id),
            session_date: input.session_date,
            due_date: input.due_date,
            hours: input.hours,
            price: input.price,
            total,
            is_paid: input.is_paid,
            applies_split_rule: shares.applies_split_rule,
            tutor_share: shares.tutor_share,
            business_share: shares.business_share,
            ..prior.clone()
        };

        self.store.update_invoice(&updated).await?;

        let old_contribution = Contribution::of(&prior);
        let new_contribution = Contribution::of(&updated);

        if prior.tutor_id == Some(new_tutor.tutor_id) {
            // Same tutor: swap contributions in memory, persist one write.
            let mut ledger = new_tutor.ledger.clone();
            ledger::replace_contribution(&mut ledger, &old_contribution, &new_contribution);
            self.store
                .update_tutor_ledger(new_tutor.tutor_id, &ledger)
                .await?;
        } else {
            if let Some(old_tutor_id) = prior.tutor_id {
                match self.store.get_tutor(old_tutor_id).await? {
                    Some(old_tutor) => {
                        let mut ledger = old_tutor.ledger;
                        ledger::remove_contribution(&mut ledger, &old_contribution);
                        self.store.update_tutor_ledger(old_tutor_id, &ledger).await?;
                    }
                    None => {
                        warn!(
                            tutor_id = %old_tutor_id,
                            "Previous tutor no longer exists; skipping ledger removal"
                        );
                    }
                }
            }
            self.credit_tutor(new_tutor, &new_contribution).await?;
        }

        Ok(updated)
    }

    /// Transition an unpaid invoice to paid, crediting the tutor ledger
    /// once. Already-paid invoices are left untouched so the contribution is
    /// never double-counted.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn mark_paid(&self, invoice_id: Uuid) -> Result<Invoice, AppError> {
        let invoice = self.store.get_invoice(invoice_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Invoice {} not found", invoice_id))
        })?;

        if invoice.is_paid {
            info!(
                invoice_number = %invoice.invoice_number,
                "Invoice already paid; nothing to do"
            );
            return Ok(invoice);
        }

        let (resolution, tutor) = self.resolve_tutor(invoice.tutor_id).await?;
        let shares = calculate_shares(
            &self.policy,
            invoice.total,
            invoice.session_date,
            resolution,
            true,
        );

        let paid = Invoice {
            is_paid: true,
            applies_split_rule: shares.applies_split_rule,
            tutor_share: shares.tutor_share,
            business_share: shares.business_share,
            ..invoice
        };
        self.store.update_invoice(&paid).await?;

        if let Some(tutor) = tutor {
            self.credit_tutor(tutor, &Contribution::of(&paid)).await?;
        }

        Ok(paid)
    }

    /// Delete an invoice, handling its ledger contribution per the
    /// configured [`DeletePolicy`].
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn delete_invoice(&self, invoice_id: Uuid) -> Result<(), AppError> {
        let invoice = self.store.get_invoice(invoice_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Invoice {} not found", invoice_id))
        })?;

        match self.delete_policy {
            DeletePolicy::RetainContribution => {
                info!(
                    invoice_number = %invoice.invoice_number,
                    "Deleting invoice; tutor ledger retains its contribution"
                );
            }
            DeletePolicy::ReverseContribution => {
                if let Some(tutor_id) = invoice.tutor_id {
                    if let Some(tutor) = self.store.get_tutor(tutor_id).await? {
                        let mut ledger = tutor.ledger;
                        ledger::remove_contribution(&mut ledger, &Contribution::of(&invoice));
                        self.store.update_tutor_ledger(tutor_id, &ledger).await?;
                    }
                }
            }
        }

        self.store.delete_invoice(invoice_id).await?;

        Ok(())
    }

    pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<Invoice, AppError> {
        self.store.get_invoice(invoice_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Invoice {} not found", invoice_id))
        })
    }

    pub async fn list_invoices(
        &self,
        filter: &ListInvoicesFilter,
    ) -> Result<Vec<Invoice>, AppError> {
        self.store.list_invoices(filter).await
    }

    /// Reserve-free 5-digit invoice number, exposed for the admin form.
    pub async fn generate_invoice_number(&self) -> Result<String, AppError> {
        invoice_numbers::generate_unique(&self.store).await
    }

    /// How the invoice's tutor reference resolves right now, together with
    /// the record when one exists. An assigned-but-missing tutor degrades to
    /// the 50/50 fallback instead of failing the save.
    async fn resolve_tutor(
        &self,
        tutor_id: Option<Uuid>,
    ) -> Result<(TutorResolution, Option<Tutor>), AppError> {
        match tutor_id {
            None => Ok((TutorResolution::Unassigned, None)),
            Some(id) => match self.store.get_tutor(id).await? {
                Some(tutor) => Ok((
                    TutorResolution::Resolved(tutor.share_percentage),
                    Some(tutor),
                )),
                None => {
                    warn!(tutor_id = %id, "Assigned tutor not found; using 50/50 fallback");
                    Ok((TutorResolution::Unresolvable, None))
                }
            },
        }
    }

    async fn credit_tutor(&self, tutor: Tutor, contribution: &Contribution) -> Result<(), AppError> {
        let mut ledger = tutor.ledger;
        ledger::apply_contribution(&mut ledger, contribution);
        self.store.update_tutor_ledger(tutor.tutor_id, &ledger).await
    }
}

fn validate_amounts(hours: Decimal, price: Decimal) -> Result<(), AppError> {
    if hours <= Decimal::ZERO || price <= Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Hours and price must be positive"
        )));
    }
    Ok(())
}
