//! Split calculator and validator.
//!
//! Pure functions turning a declared expense amount, an owed-side policy and
//! a paid-side policy into per-member [`SplitShare`]s that sum back to the
//! amount exactly. Every split-generation path in the engine goes through
//! [`compute_expense_splits`]; there is exactly one place where rounding
//! happens.
//!
//! The validator never corrects a failing split set. Auto-correction could
//! mask a calculator bug, so violations are reported to the caller (on
//! writes) or surfaced as diagnostic values (on scans, see
//! [`Engine::problematic_transactions`](crate::Engine::problematic_transactions)).

use std::collections::HashMap;

use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, money::div_round_half_even};

/// Reconciliation tolerance: one minor unit (0.01 of the currency).
pub const SPLIT_TOLERANCE: MoneyCents = MoneyCents::new(1);

/// One member's owed/paid allocation of an expense.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitShare {
    pub member_id: Uuid,
    pub owed: MoneyCents,
    pub owed_bp: i64,
    pub paid: MoneyCents,
    pub paid_bp: i64,
}

/// Owed-side distribution policy, resolved to concrete members.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwedSplit {
    /// Even division across all participants, remainder on the first.
    Even,
    /// 100% owed by one member (member-only and payer-only expenses).
    Single { member_id: Uuid },
    /// Caller-supplied amounts; must reconcile to the total.
    Custom { amounts: Vec<(Uuid, MoneyCents)> },
}

/// Paid-side distribution policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaidSplit {
    /// 100% paid by one member.
    Single { payer_id: Uuid },
    /// Caller-supplied amounts; must reconcile to the total.
    Custom { amounts: Vec<(Uuid, MoneyCents)> },
}

/// Computes one split per participant for an expense.
///
/// Participants are an ordered, duplicate-free set of eligible member ids;
/// designated members (single owed target, single payer, every custom entry)
/// must be among them. An empty participant set is rejected: the caller must
/// refuse the transaction rather than persist an empty split set it cannot
/// reconcile.
pub fn compute_expense_splits(
    amount: MoneyCents,
    participants: &[Uuid],
    owed: &OwedSplit,
    paid: &PaidSplit,
) -> ResultEngine<Vec<SplitShare>> {
    if !amount.is_positive() {
        return Err(EngineError::Validation(
            "amount_minor must be > 0".to_string(),
        ));
    }
    if participants.is_empty() {
        return Err(EngineError::Validation(
            "expense needs at least one eligible member".to_string(),
        ));
    }
    {
        let mut seen = std::collections::HashSet::new();
        for id in participants {
            if !seen.insert(id) {
                return Err(EngineError::Validation(format!(
                    "duplicate participant: {id}"
                )));
            }
        }
    }

    let owed_amounts = match owed {
        OwedSplit::Even => amount.divide_evenly(participants.len()),
        OwedSplit::Single { member_id } => single_allocation(amount, participants, *member_id)?,
        OwedSplit::Custom { amounts } => custom_allocation(amount, participants, amounts, "owed")?,
    };

    let paid_amounts = match paid {
        PaidSplit::Single { payer_id } => single_allocation(amount, participants, *payer_id)?,
        PaidSplit::Custom { amounts } => custom_allocation(amount, participants, amounts, "paid")?,
    };

    Ok(participants
        .iter()
        .zip(owed_amounts)
        .zip(paid_amounts)
        .map(|((member_id, owed), paid)| SplitShare {
            member_id: *member_id,
            owed,
            owed_bp: owed.basis_points_of(amount),
            paid,
            paid_bp: paid.basis_points_of(amount),
        })
        .collect())
}

/// Allocates the full amount to `target`, zero to everyone else.
fn single_allocation(
    amount: MoneyCents,
    participants: &[Uuid],
    target: Uuid,
) -> ResultEngine<Vec<MoneyCents>> {
    if !participants.contains(&target) {
        return Err(EngineError::Validation(format!(
            "designated member {target} is not a participant"
        )));
    }
    Ok(participants
        .iter()
        .map(|id| if *id == target { amount } else { MoneyCents::ZERO })
        .collect())
}

/// Maps caller-supplied amounts onto the participant order.
///
/// Members without an entry get zero; entries for non-participants are
/// rejected; the entries must reconcile to the total within
/// [`SPLIT_TOLERANCE`].
fn custom_allocation(
    amount: MoneyCents,
    participants: &[Uuid],
    amounts: &[(Uuid, MoneyCents)],
    side: &str,
) -> ResultEngine<Vec<MoneyCents>> {
    let mut by_member: HashMap<Uuid, MoneyCents> = HashMap::with_capacity(amounts.len());
    for (member_id, value) in amounts {
        if !participants.contains(member_id) {
            return Err(EngineError::Validation(format!(
                "{side} amount for non-participant {member_id}"
            )));
        }
        if value.is_negative() {
            return Err(EngineError::Validation(format!(
                "{side} amount for {member_id} must be >= 0"
            )));
        }
        if by_member.insert(*member_id, *value).is_some() {
            return Err(EngineError::Validation(format!(
                "duplicate {side} amount for {member_id}"
            )));
        }
    }

    let sum: MoneyCents = by_member.values().copied().sum();
    if !reconciles(amount, sum) {
        return Err(EngineError::Validation(format!(
            "{side} amounts sum to {sum}, expected {amount}"
        )));
    }

    Ok(participants
        .iter()
        .map(|id| by_member.get(id).copied().unwrap_or(MoneyCents::ZERO))
        .collect())
}

/// Distributes `amount` across `weights` proportionally.
///
/// Each slice is `amount * weight / Σ weights` rounded half-to-even; the
/// rounding remainder lands on the first nonzero weight so the slices sum
/// back to `amount` exactly. Used to roll a reimbursement back across the
/// original owed shares.
#[must_use]
pub fn allocate_proportionally(amount: MoneyCents, weights: &[MoneyCents]) -> Vec<MoneyCents> {
    let total: i64 = weights.iter().map(|w| w.cents()).sum();
    if total == 0 || weights.is_empty() {
        return vec![MoneyCents::ZERO; weights.len()];
    }

    let mut slices: Vec<i64> = weights
        .iter()
        .map(|w| div_round_half_even(amount.cents().saturating_mul(w.cents()), total))
        .collect();

    let allocated: i64 = slices.iter().sum();
    let remainder = amount.cents() - allocated;
    if remainder != 0
        && let Some(pos) = weights.iter().position(|w| !w.is_zero())
    {
        slices[pos] += remainder;
    }

    slices.into_iter().map(MoneyCents::new).collect()
}

/// Sums the owed and paid columns of a split set.
#[must_use]
pub fn split_sums(shares: &[SplitShare]) -> (MoneyCents, MoneyCents) {
    let owed = shares.iter().map(|s| s.owed).sum();
    let paid = shares.iter().map(|s| s.paid).sum();
    (owed, paid)
}

/// `true` when `sum` matches `amount` within [`SPLIT_TOLERANCE`].
#[must_use]
pub fn reconciles(amount: MoneyCents, sum: MoneyCents) -> bool {
    (amount - sum).abs() <= SPLIT_TOLERANCE
}

/// Checks that both sides of a split set reconcile to the expected amount.
///
/// A failing side is a data-integrity violation: it is reported, never
/// silently corrected.
pub fn validate_split_sums(
    amount: MoneyCents,
    owed_sum: MoneyCents,
    paid_sum: MoneyCents,
) -> ResultEngine<()> {
    if !reconciles(amount, owed_sum) {
        return Err(EngineError::Validation(format!(
            "owed splits sum to {owed_sum}, expected {amount}"
        )));
    }
    if !reconciles(amount, paid_sum) {
        return Err(EngineError::Validation(format!(
            "paid splits sum to {paid_sum}, expected {amount}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn even_split_with_single_payer_reconciles() {
        let members = ids(3);
        let shares = compute_expense_splits(
            MoneyCents::new(10_000),
            &members,
            &OwedSplit::Even,
            &PaidSplit::Single {
                payer_id: members[0],
            },
        )
        .unwrap();

        let (owed, paid) = split_sums(&shares);
        assert_eq!(owed, MoneyCents::new(10_000));
        assert_eq!(paid, MoneyCents::new(10_000));
        assert_eq!(shares[0].owed, MoneyCents::new(3334));
        assert_eq!(shares[1].owed, MoneyCents::new(3333));
        assert_eq!(shares[2].owed, MoneyCents::new(3333));
        assert_eq!(shares[0].paid, MoneyCents::new(10_000));
        assert_eq!(shares[0].paid_bp, 10_000);
    }

    #[test]
    fn member_only_split_owes_everything_to_one() {
        let members = ids(3);
        let shares = compute_expense_splits(
            MoneyCents::new(500),
            &members,
            &OwedSplit::Single {
                member_id: members[2],
            },
            &PaidSplit::Single {
                payer_id: members[0],
            },
        )
        .unwrap();

        assert_eq!(shares[2].owed, MoneyCents::new(500));
        assert_eq!(shares[2].owed_bp, 10_000);
        assert_eq!(shares[0].owed, MoneyCents::ZERO);
        assert_eq!(shares[1].owed, MoneyCents::ZERO);
    }

    #[test]
    fn custom_both_sides_reconcile() {
        let members = ids(2);
        let shares = compute_expense_splits(
            MoneyCents::new(1000),
            &members,
            &OwedSplit::Custom {
                amounts: vec![
                    (members[0], MoneyCents::new(700)),
                    (members[1], MoneyCents::new(300)),
                ],
            },
            &PaidSplit::Custom {
                amounts: vec![
                    (members[0], MoneyCents::new(400)),
                    (members[1], MoneyCents::new(600)),
                ],
            },
        )
        .unwrap();

        let (owed, paid) = split_sums(&shares);
        assert_eq!(owed, MoneyCents::new(1000));
        assert_eq!(paid, MoneyCents::new(1000));
        assert_eq!(shares[0].owed_bp, 7000);
        assert_eq!(shares[1].paid_bp, 6000);
    }

    #[test]
    fn custom_amounts_must_reconcile() {
        let members = ids(2);
        let err = compute_expense_splits(
            MoneyCents::new(1000),
            &members,
            &OwedSplit::Custom {
                amounts: vec![
                    (members[0], MoneyCents::new(700)),
                    (members[1], MoneyCents::new(200)),
                ],
            },
            &PaidSplit::Single {
                payer_id: members[0],
            },
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn custom_rejects_non_participant() {
        let members = ids(2);
        let stranger = Uuid::new_v4();
        let err = compute_expense_splits(
            MoneyCents::new(1000),
            &members,
            &OwedSplit::Custom {
                amounts: vec![(stranger, MoneyCents::new(1000))],
            },
            &PaidSplit::Single {
                payer_id: members[0],
            },
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn zero_participants_is_rejected_not_empty() {
        let err = compute_expense_splits(
            MoneyCents::new(1000),
            &[],
            &OwedSplit::Even,
            &PaidSplit::Single {
                payer_id: Uuid::new_v4(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn designated_member_must_participate() {
        let members = ids(2);
        let err = compute_expense_splits(
            MoneyCents::new(1000),
            &members,
            &OwedSplit::Even,
            &PaidSplit::Single {
                payer_id: Uuid::new_v4(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn every_policy_combination_reconciles() {
        let members = ids(4);
        let owed_policies = vec![
            OwedSplit::Even,
            OwedSplit::Single {
                member_id: members[1],
            },
            OwedSplit::Custom {
                amounts: vec![
                    (members[0], MoneyCents::new(1)),
                    (members[1], MoneyCents::new(2)),
                    (members[2], MoneyCents::new(3)),
                    (members[3], MoneyCents::new(9_994)),
                ],
            },
        ];
        let paid_policies = vec![
            PaidSplit::Single {
                payer_id: members[3],
            },
            PaidSplit::Custom {
                amounts: vec![
                    (members[0], MoneyCents::new(5_000)),
                    (members[2], MoneyCents::new(5_000)),
                ],
            },
        ];

        for owed in &owed_policies {
            for paid in &paid_policies {
                let shares =
                    compute_expense_splits(MoneyCents::new(10_000), &members, owed, paid).unwrap();
                let (owed_sum, paid_sum) = split_sums(&shares);
                validate_split_sums(MoneyCents::new(10_000), owed_sum, paid_sum).unwrap();
            }
        }
    }

    #[test]
    fn proportional_allocation_sums_exactly() {
        let weights = vec![
            MoneyCents::new(3334),
            MoneyCents::new(3333),
            MoneyCents::new(3333),
        ];
        let slices = allocate_proportionally(MoneyCents::new(5_000), &weights);
        assert_eq!(
            slices.iter().copied().sum::<MoneyCents>(),
            MoneyCents::new(5_000)
        );
        // Slices track the weight proportions.
        assert!(slices[0] >= slices[1]);
        assert_eq!(slices[1], slices[2]);
    }

    #[test]
    fn proportional_allocation_skips_zero_weights() {
        let weights = vec![MoneyCents::ZERO, MoneyCents::new(100)];
        let slices = allocate_proportionally(MoneyCents::new(77), &weights);
        assert_eq!(slices[0], MoneyCents::ZERO);
        assert_eq!(slices[1], MoneyCents::new(77));
    }

    #[test]
    fn proportional_allocation_zero_total_is_all_zero() {
        let weights = vec![MoneyCents::ZERO, MoneyCents::ZERO];
        let slices = allocate_proportionally(MoneyCents::new(100), &weights);
        assert!(slices.iter().all(|s| s.is_zero()));
    }

    #[test]
    fn validator_tolerates_one_cent() {
        validate_split_sums(
            MoneyCents::new(1000),
            MoneyCents::new(999),
            MoneyCents::new(1001),
        )
        .unwrap();
        assert!(
            validate_split_sums(
                MoneyCents::new(1000),
                MoneyCents::new(998),
                MoneyCents::new(1000),
            )
            .is_err()
        );
    }
}
