//! Tutor earnings ledger arithmetic.
//!
//! A tutor's ledger is a cache of an aggregate over their paid invoices.
//! This module is the only code allowed to mutate it: call sites apply,
//! remove, or replace one invoice's contribution at a time, and
//! `services::recalc` rebuilds the cache from scratch.

use rust_decimal::Decimal;

use crate::models::{Invoice, TutorLedger};

/// One invoice's effect on a tutor's ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub is_paid: bool,
    pub applies_split_rule: bool,
    pub total: Decimal,
    pub tutor_share: Decimal,
    pub business_share: Decimal,
}

impl Contribution {
    /// Snapshot an invoice's current ledger contribution.
    pub fn of(invoice: &Invoice) -> Self {
        Self {
            is_paid: invoice.is_paid,
            applies_split_rule: invoice.applies_split_rule,
            total: invoice.total,
            tutor_share: invoice.tutor_share,
            business_share: invoice.business_share,
        }
    }
}

/// Add one invoice's contribution. Unpaid invoices contribute nothing.
pub fn apply_contribution(ledger: &mut TutorLedger, contribution: &Contribution) {
    if !contribution.is_paid {
        return;
    }

    if contribution.applies_split_rule {
        ledger.total_earnings_after_split += contribution.tutor_share;
        ledger.total_business_share += contribution.business_share;
        ledger.session_count_after_split += 1;
    } else {
        ledger.total_earnings_before_split += contribution.total;
        ledger.session_count_before_split += 1;
    }

    ledger.total_earnings = ledger.total_earnings_after_split;
}

/// Exact inverse of [`apply_contribution`]. Every counter is floored at zero
/// so stale deltas cannot drive the ledger negative.
pub fn remove_contribution(ledger: &mut TutorLedger, contribution: &Contribution) {
    if !contribution.is_paid {
        return;
    }

    if contribution.applies_split_rule {
        ledger.total_earnings_after_split =
            (ledger.total_earnings_after_split - contribution.tutor_share).max(Decimal::ZERO);
        ledger.total_business_share =
            (ledger.total_business_share - contribution.business_share).max(Decimal::ZERO);
        ledger.session_count_after_split = (ledger.session_count_after_split - 1).max(0);
    } else {
        ledger.total_earnings_before_split =
            (ledger.total_earnings_before_split - contribution.total).max(Decimal::ZERO);
        ledger.session_count_before_split = (ledger.session_count_before_split - 1).max(0);
    }

    ledger.total_earnings = ledger.total_earnings_after_split;
}

/// Swap one contribution for another in memory; callers persist the result
/// as a single write so no intermediate state is ever stored.
pub fn replace_contribution(ledger: &mut TutorLedger, old: &Contribution, new: &Contribution) {
    remove_contribution(ledger, old);
    apply_contribution(ledger, new);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paid_split_contribution(tutor_share: u32, business_share: u32) -> Contribution {
        Contribution {
            is_paid: true,
            applies_split_rule: true,
            total: Decimal::from(tutor_share + business_share),
            tutor_share: Decimal::from(tutor_share),
            business_share: Decimal::from(business_share),
        }
    }

    #[test]
    fn applying_a_post_milestone_contribution_updates_the_split_bucket() {
        let mut ledger = TutorLedger::default();
        apply_contribution(&mut ledger, &paid_split_contribution(84, 36));

        assert_eq!(ledger.total_earnings_after_split, Decimal::from(84));
        assert_eq!(ledger.total_business_share, Decimal::from(36));
        assert_eq!(ledger.session_count_after_split, 1);
        assert_eq!(ledger.session_count_before_split, 0);
        assert_eq!(ledger.total_earnings, Decimal::from(84));
    }

    #[test]
    fn applying_a_pre_milestone_contribution_updates_the_reporting_bucket() {
        let mut ledger = TutorLedger::default();
        apply_contribution(
            &mut ledger,
            &Contribution {
                is_paid: true,
                applies_split_rule: false,
                total: Decimal::from(100),
                tutor_share: Decimal::ZERO,
                business_share: Decimal::from(100),
            },
        );

        assert_eq!(ledger.total_earnings_before_split, Decimal::from(100));
        assert_eq!(ledger.session_count_before_split, 1);
        // Pre-split revenue is never payable to the tutor.
        assert_eq!(ledger.total_earnings, Decimal::ZERO);
    }

    #[test]
    fn unpaid_contributions_are_a_no_op() {
        let mut ledger = TutorLedger::default();
        let contribution = Contribution {
            is_paid: false,
            applies_split_rule: true,
            total: Decimal::from(120),
            tutor_share: Decimal::ZERO,
            business_share: Decimal::ZERO,
        };

        apply_contribution(&mut ledger, &contribution);
        assert_eq!(ledger, TutorLedger::default());

        remove_contribution(&mut ledger, &contribution);
        assert_eq!(ledger, TutorLedger::default());
    }

    #[test]
    fn remove_undoes_apply_exactly() {
        let mut ledger = TutorLedger::default();
        let contribution = paid_split_contribution(84, 36);

        apply_contribution(&mut ledger, &contribution);
        remove_contribution(&mut ledger, &contribution);

        assert_eq!(ledger, TutorLedger::default());
    }

    #[test]
    fn removal_from_an_empty_ledger_floors_at_zero() {
        let mut ledger = TutorLedger::default();
        remove_contribution(&mut ledger, &paid_split_contribution(84, 36));

        assert_eq!(ledger, TutorLedger::default());
    }

    #[test]
    fn replace_swaps_contributions_in_one_step() {
        let mut ledger = TutorLedger::default();
        let old = paid_split_contribution(84, 36);
        let new = paid_split_contribution(60, 60);

        apply_contribution(&mut ledger, &old);
        replace_contribution(&mut ledger, &old, &new);

        assert_eq!(ledger.total_earnings_after_split, Decimal::from(60));
        assert_eq!(ledger.total_business_share, Decimal::from(60));
        assert_eq!(ledger.session_count_after_split, 1);
        assert_eq!(ledger.total_earnings, Decimal::from(60));
    }
}
