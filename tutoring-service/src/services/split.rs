//! Revenue-split policy table and share calculator.
//!
//! Every path that writes an invoice's split fields (create, update,
//! mark-paid, batch recalculation) routes through [`calculate_shares`];
//! the arithmetic lives nowhere else.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How paid revenue is divided for invoices falling in a policy period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitRule {
    /// The business keeps the full invoice total.
    BusinessKeepsAll,
    /// The tutor receives their negotiated share of the total.
    TutorShare,
}

/// A split rule taking effect on a given date and staying in force until a
/// later period supersedes it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PolicyPeriod {
    pub effective_from: NaiveDate,
    pub rule: SplitRule,
}

/// Ordered table of policy periods. Session dates before the first period
/// fall back to [`SplitRule::BusinessKeepsAll`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitPolicy {
    periods: Vec<PolicyPeriod>,
}

/// The date the business crossed its revenue threshold and the tutor split
/// took effect.
pub fn default_milestone_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 5).expect("valid milestone date")
}

impl SplitPolicy {
    pub fn new(mut periods: Vec<PolicyPeriod>) -> Self {
        periods.sort_by_key(|p| p.effective_from);
        Self { periods }
    }

    /// Single-milestone policy: the business keeps everything before
    /// `milestone`, the negotiated tutor share applies from it onward.
    pub fn with_milestone(milestone: NaiveDate) -> Self {
        Self::new(vec![PolicyPeriod {
            effective_from: milestone,
            rule: SplitRule::TutorShare,
        }])
    }

    pub fn rule_for(&self, session_date: NaiveDate) -> SplitRule {
        self.periods
            .iter()
            .rev()
            .find(|p| session_date >= p.effective_from)
            .map(|p| p.rule)
            .unwrap_or(SplitRule::BusinessKeepsAll)
    }

    /// Whether the tutor-share rule governs an invoice on this date.
    pub fn applies_split_rule(&self, session_date: NaiveDate) -> bool {
        self.rule_for(session_date) == SplitRule::TutorShare
    }
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self::with_milestone(default_milestone_date())
    }
}

/// Share percentage used when an assigned tutor's record cannot be resolved.
pub fn fallback_share_percentage() -> Decimal {
    Decimal::from(50)
}

/// How the invoice's tutor reference resolved at calculation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TutorResolution {
    /// No tutor on the invoice: paid revenue is entirely business revenue.
    Unassigned,
    /// A tutor is assigned but the record no longer resolves; shares fall
    /// back to 50/50 so the invoice save does not fail outright.
    Unresolvable,
    /// Tutor resolved, carrying their share percentage in `[0, 100]`.
    Resolved(Decimal),
}

/// Computed share breakdown for one invoice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShareBreakdown {
    pub applies_split_rule: bool,
    pub tutor_share: Decimal,
    pub business_share: Decimal,
}

/// Split an invoice total between tutor and business.
pub fn calculate_shares(
    policy: &SplitPolicy,
    total: Decimal,
    session_date: NaiveDate,
    tutor: TutorResolution,
    is_paid: bool,
) -> ShareBreakdown {
    let applies_split_rule = policy.applies_split_rule(session_date);

    if !is_paid {
        // Unpaid invoices generate no revenue to split yet.
        return ShareBreakdown {
            applies_split_rule,
            tutor_share: Decimal::ZERO,
            business_share: Decimal::ZERO,
        };
    }

    if !applies_split_rule {
        // Pre-milestone sessions are entirely business revenue, whatever the
        // tutor's negotiated percentage.
        return ShareBreakdown {
            applies_split_rule,
            tutor_share: Decimal::ZERO,
            business_share: total,
        };
    }

    let percentage = match tutor {
        TutorResolution::Unassigned => Decimal::ZERO,
        TutorResolution::Unresolvable => fallback_share_percentage(),
        TutorResolution::Resolved(p) => p,
    };

    let tutor_share = total * percentage / Decimal::ONE_HUNDRED;
    ShareBreakdown {
        applies_split_rule,
        tutor_share,
        business_share: total - tutor_share,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn pre_milestone_paid_invoice_is_all_business_revenue() {
        let policy = SplitPolicy::default();
        let shares = calculate_shares(
            &policy,
            Decimal::from(100),
            date(2024, 11, 1),
            TutorResolution::Resolved(Decimal::from(50)),
            true,
        );

        assert!(!shares.applies_split_rule);
        assert_eq!(shares.tutor_share, Decimal::ZERO);
        assert_eq!(shares.business_share, Decimal::from(100));
    }

    #[test]
    fn post_milestone_paid_invoice_splits_by_percentage() {
        let policy = SplitPolicy::default();
        let shares = calculate_shares(
            &policy,
            Decimal::from(120),
            date(2025, 1, 10),
            TutorResolution::Resolved(Decimal::from(70)),
            true,
        );

        assert!(shares.applies_split_rule);
        assert_eq!(shares.tutor_share, Decimal::from(84));
        assert_eq!(shares.business_share, Decimal::from(36));
    }

    #[test]
    fn unpaid_invoice_has_zero_shares_regardless_of_date() {
        let policy = SplitPolicy::default();
        for session_date in [date(2024, 11, 1), date(2025, 1, 10)] {
            let shares = calculate_shares(
                &policy,
                Decimal::from(120),
                session_date,
                TutorResolution::Resolved(Decimal::from(70)),
                false,
            );
            assert_eq!(shares.tutor_share, Decimal::ZERO);
            assert_eq!(shares.business_share, Decimal::ZERO);
        }
    }

    #[test]
    fn milestone_date_itself_applies_the_split() {
        let policy = SplitPolicy::default();
        assert!(policy.applies_split_rule(date(2024, 12, 5)));
        assert!(!policy.applies_split_rule(date(2024, 12, 4)));
    }

    #[test]
    fn shares_always_sum_to_total_when_paid() {
        let policy = SplitPolicy::default();
        let total = Decimal::from(100);
        for percentage in [0u32, 1, 33, 50, 66, 99, 100] {
            let shares = calculate_shares(
                &policy,
                total,
                date(2025, 3, 1),
                TutorResolution::Resolved(Decimal::from(percentage)),
                true,
            );
            assert_eq!(shares.tutor_share + shares.business_share, total);
        }
    }

    #[test]
    fn unassigned_tutor_yields_full_business_revenue() {
        let policy = SplitPolicy::default();
        let shares = calculate_shares(
            &policy,
            Decimal::from(80),
            date(2025, 2, 1),
            TutorResolution::Unassigned,
            true,
        );

        assert_eq!(shares.tutor_share, Decimal::ZERO);
        assert_eq!(shares.business_share, Decimal::from(80));
    }

    #[test]
    fn unresolvable_tutor_falls_back_to_even_split() {
        let policy = SplitPolicy::default();
        let shares = calculate_shares(
            &policy,
            Decimal::from(80),
            date(2025, 2, 1),
            TutorResolution::Unresolvable,
            true,
        );

        assert_eq!(shares.tutor_share, Decimal::from(40));
        assert_eq!(shares.business_share, Decimal::from(40));
    }

    #[test]
    fn policy_table_honors_the_latest_effective_period() {
        let policy = SplitPolicy::new(vec![
            PolicyPeriod {
                effective_from: date(2024, 12, 5),
                rule: SplitRule::TutorShare,
            },
            PolicyPeriod {
                effective_from: date(2026, 1, 1),
                rule: SplitRule::BusinessKeepsAll,
            },
        ]);

        assert!(!policy.applies_split_rule(date(2024, 1, 1)));
        assert!(policy.applies_split_rule(date(2025, 6, 1)));
        assert!(!policy.applies_split_rule(date(2026, 3, 1)));
    }
}
