//! Ledger aggregation.
//!
//! Balances are never stored: every read folds the household's full
//! transaction history. `balance = total_paid - total_share`, and the
//! household-wide sum of balances is zero by construction. A nonzero sum is
//! data corruption and is surfaced as a diagnostic, never as an error.

use std::collections::HashMap;

use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Member, MemberStatus, MoneyCents, ResultEngine, Split, Transaction, TransactionKind,
    allocate_proportionally, members, split::reconciles, splits, transactions,
};

use super::{Engine, with_tx};

/// One member's aggregated ledger position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberBalance {
    pub member_id: Uuid,
    pub total_paid: MoneyCents,
    pub total_share: MoneyCents,
    pub balance: MoneyCents,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Balanced,
    Imbalanced,
}

/// Result of the zero-sum invariant check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceHealth {
    pub status: HealthStatus,
    pub total_imbalance: MoneyCents,
}

/// An expense whose persisted splits no longer reconcile to its amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitImbalance {
    pub transaction_id: Uuid,
    pub amount: MoneyCents,
    pub owed_sum: MoneyCents,
    pub paid_sum: MoneyCents,
}

impl Engine {
    /// Computes every member's balance by folding the household ledger.
    ///
    /// Rows are returned for approved and inactive members; pending members
    /// have no ledger presence yet.
    pub async fn member_balances(
        &self,
        household_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<MemberBalance>> {
        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, household_id).await?;
                self.require_acting_member(&tx, household_id, user_id)
                    .await?;
                self.fold_balances(&tx, household_id).await
            }
            .await
        })
    }

    /// Checks the zero-sum invariant over all member balances. An imbalance
    /// is diagnostic state, not an error: it is returned and logged, and
    /// never blocks other operations.
    pub async fn balance_health(
        &self,
        household_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<BalanceHealth> {
        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, household_id).await?;
                self.require_acting_member(&tx, household_id, user_id)
                    .await?;

                let balances = self.fold_balances(&tx, household_id).await?;
                let total: MoneyCents = balances.iter().map(|b| b.balance).sum();
                let health = if total.is_zero() {
                    BalanceHealth {
                        status: HealthStatus::Balanced,
                        total_imbalance: MoneyCents::ZERO,
                    }
                } else {
                    tracing::warn!(
                        household_id = %household_id,
                        total_imbalance = total.cents(),
                        "household balances do not sum to zero"
                    );
                    BalanceHealth {
                        status: HealthStatus::Imbalanced,
                        total_imbalance: total,
                    }
                };
                Ok(health)
            }
            .await
        })
    }

    /// Scans every expense of the household and reports those whose stored
    /// splits fail to reconcile with the transaction amount.
    pub async fn problematic_transactions(
        &self,
        household_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<SplitImbalance>> {
        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, household_id).await?;
                self.require_acting_member(&tx, household_id, user_id)
                    .await?;

                let (txns, splits_by_txn) = self.load_ledger(&tx, household_id).await?;

                let mut findings = Vec::new();
                for txn in txns.iter().filter(|t| t.kind == TransactionKind::Expense) {
                    let rows = splits_by_txn.get(&txn.id).map(Vec::as_slice).unwrap_or(&[]);
                    let owed_sum: MoneyCents = rows.iter().map(|s| s.owed).sum();
                    let paid_sum: MoneyCents = rows.iter().map(|s| s.paid).sum();
                    if !reconciles(txn.amount, owed_sum) || !reconciles(txn.amount, paid_sum) {
                        tracing::warn!(
                            household_id = %household_id,
                            transaction_id = %txn.id,
                            "expense splits do not reconcile"
                        );
                        findings.push(SplitImbalance {
                            transaction_id: txn.id,
                            amount: txn.amount,
                            owed_sum,
                            paid_sum,
                        });
                    }
                }
                Ok(findings)
            }
            .await
        })
    }

    async fn fold_balances(
        &self,
        db: &DatabaseTransaction,
        household_id: Uuid,
    ) -> ResultEngine<Vec<MemberBalance>> {
        let member_models: Vec<members::Model> = members::Entity::find()
            .filter(members::Column::HouseholdId.eq(household_id.to_string()))
            .filter(members::Column::Status.is_in([
                MemberStatus::Approved.as_str(),
                MemberStatus::Inactive.as_str(),
            ]))
            .order_by_asc(members::Column::CreatedAt)
            .all(db)
            .await?;
        let member_ids: Vec<Uuid> = member_models
            .into_iter()
            .map(|m| Member::try_from(m).map(|member| member.id))
            .collect::<ResultEngine<_>>()?;

        let mut paid: HashMap<Uuid, MoneyCents> = HashMap::new();
        let mut share: HashMap<Uuid, MoneyCents> = HashMap::new();

        let (txns, splits_by_txn) = self.load_ledger(db, household_id).await?;

        for txn in &txns {
            match txn.kind {
                TransactionKind::Expense => {
                    if let Some(rows) = splits_by_txn.get(&txn.id) {
                        for split in rows {
                            *paid.entry(split.member_id).or_default() += split.paid;
                            *share.entry(split.member_id).or_default() += split.owed;
                        }
                    }
                }
                TransactionKind::Settlement => {
                    if let (Some(payer), Some(recipient)) =
                        (txn.payer_member_id, txn.counterparty_member_id)
                    {
                        *paid.entry(payer).or_default() += txn.amount;
                        *share.entry(recipient).or_default() += txn.amount;
                    }
                }
                TransactionKind::Reimbursement => {
                    if let Some(receiver) = txn.payer_member_id {
                        *paid.entry(receiver).or_default() -= txn.amount;
                    }
                    // Roll the amount back across the original owed shares.
                    if let Some(original_id) = txn.reimburses_transaction_id
                        && let Some(rows) = splits_by_txn.get(&original_id)
                    {
                        let weights: Vec<MoneyCents> = rows.iter().map(|s| s.owed).collect();
                        let slices = allocate_proportionally(txn.amount, &weights);
                        for (split, slice) in rows.iter().zip(slices) {
                            *share.entry(split.member_id).or_default() -= slice;
                        }
                    }
                }
                // Incomes have no owed/paid sides.
                TransactionKind::Income => {}
            }
        }

        Ok(member_ids
            .into_iter()
            .map(|member_id| {
                let total_paid = paid.get(&member_id).copied().unwrap_or(MoneyCents::ZERO);
                let total_share = share.get(&member_id).copied().unwrap_or(MoneyCents::ZERO);
                MemberBalance {
                    member_id,
                    total_paid,
                    total_share,
                    balance: total_paid - total_share,
                }
            })
            .collect())
    }

    /// Loads all transactions of a household plus their splits, keyed by
    /// transaction id.
    async fn load_ledger(
        &self,
        db: &DatabaseTransaction,
        household_id: Uuid,
    ) -> ResultEngine<(Vec<Transaction>, HashMap<Uuid, Vec<Split>>)> {
        let txn_models: Vec<transactions::Model> = transactions::Entity::find()
            .filter(transactions::Column::HouseholdId.eq(household_id.to_string()))
            .order_by_asc(transactions::Column::OccurredAt)
            .all(db)
            .await?;
        let txns: Vec<Transaction> = txn_models
            .into_iter()
            .map(Transaction::try_from)
            .collect::<ResultEngine<_>>()?;

        let ids: Vec<String> = txns.iter().map(|t| t.id.to_string()).collect();
        let split_models: Vec<splits::Model> = splits::Entity::find()
            .filter(splits::Column::TransactionId.is_in(ids))
            .all(db)
            .await?;

        let mut splits_by_txn: HashMap<Uuid, Vec<Split>> = HashMap::new();
        for model in split_models {
            let split = Split::try_from(model)?;
            splits_by_txn
                .entry(split.transaction_id)
                .or_default()
                .push(split);
        }
        Ok((txns, splits_by_txn))
    }
}
