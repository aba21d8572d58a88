use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, ExpenseCmd, ExpenseUpdateCmd, IncomeCmd, Member, MemberStatus, MoneyCents,
    OwedSplit, PaidByKind, PaidSplit, ReimbursementCmd, ResultEngine, SettlementCmd, Split,
    SplitInput, SplitKind, Transaction, TransactionKind, compute_expense_splits, members, splits,
    transactions,
};

use super::{Engine, normalize_optional_text, with_tx};

impl Engine {
    /// Creates an expense and its split rows atomically.
    ///
    /// When the caller supplies no explicit owed amounts the engine derives
    /// them from the policy fields alone. That fallback exists for callers
    /// predating per-member amounts and is kept as a compatibility shim; new
    /// callers should always send explicit amounts for custom splits.
    pub async fn create_expense(&self, cmd: ExpenseCmd) -> ResultEngine<Uuid> {
        let amount = MoneyCents::new(cmd.amount_minor);

        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, cmd.household_id).await?;
                self.require_acting_member(&tx, cmd.household_id, &cmd.user_id)
                    .await?;

                let participants = self.approved_member_ids(&tx, cmd.household_id).await?;
                let (owed, paid) = expense_policies(&cmd)?;
                let shares = compute_expense_splits(amount, &participants, &owed, &paid)?;

                let mut transaction = Transaction::new(
                    cmd.household_id,
                    TransactionKind::Expense,
                    cmd.meta.occurred_at,
                    amount,
                    normalize_optional_text(cmd.meta.category.as_deref()),
                    normalize_optional_text(cmd.meta.note.as_deref()),
                    cmd.user_id.clone(),
                )?;
                transaction.payer_member_id = cmd.payer_member_id;
                transaction.split_member_id = cmd.split_member_id;
                transaction.split_kind = Some(cmd.split_kind);
                transaction.paid_by_kind = Some(cmd.paid_by_kind);
                transaction.excluded_from_budget = cmd.meta.excluded_from_budget;

                transactions::ActiveModel::from(&transaction).insert(&tx).await?;
                for share in &shares {
                    let split = Split::new(
                        transaction.id,
                        share.member_id,
                        share.owed,
                        share.owed_bp,
                        share.paid,
                        share.paid_bp,
                    );
                    splits::ActiveModel::from(&split).insert(&tx).await?;
                }

                tracing::info!(household_id = %cmd.household_id, transaction_id = %transaction.id, "expense created");
                Ok(transaction.id)
            }
            .await
        })
    }

    /// Records an income. Incomes carry no splits and never affect member
    /// balances; they exist for budgeting.
    pub async fn create_income(&self, cmd: IncomeCmd) -> ResultEngine<Uuid> {
        let amount = MoneyCents::new(cmd.amount_minor);

        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, cmd.household_id).await?;
                self.require_acting_member(&tx, cmd.household_id, &cmd.user_id)
                    .await?;

                if let Some(member_id) = cmd.member_id {
                    self.require_approved_member(&tx, cmd.household_id, member_id)
                        .await?;
                }

                let mut transaction = Transaction::new(
                    cmd.household_id,
                    TransactionKind::Income,
                    cmd.meta.occurred_at,
                    amount,
                    normalize_optional_text(cmd.meta.category.as_deref()),
                    normalize_optional_text(cmd.meta.note.as_deref()),
                    cmd.user_id.clone(),
                )?;
                transaction.payer_member_id = cmd.member_id;
                transaction.excluded_from_budget = cmd.meta.excluded_from_budget;
                transactions::ActiveModel::from(&transaction).insert(&tx).await?;

                tracing::info!(household_id = %cmd.household_id, transaction_id = %transaction.id, "income created");
                Ok(transaction.id)
            }
            .await
        })
    }

    /// Records a settlement: the payer hands money to the recipient, moving
    /// balance directly between the two.
    pub async fn create_settlement(&self, cmd: SettlementCmd) -> ResultEngine<Uuid> {
        let amount = MoneyCents::new(cmd.amount_minor);
        if cmd.payer_member_id == cmd.recipient_member_id {
            return Err(EngineError::Validation(
                "settlement payer and recipient must differ".to_string(),
            ));
        }

        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, cmd.household_id).await?;
                self.require_acting_member(&tx, cmd.household_id, &cmd.user_id)
                    .await?;
                self.require_approved_member(&tx, cmd.household_id, cmd.payer_member_id)
                    .await?;
                self.require_approved_member(&tx, cmd.household_id, cmd.recipient_member_id)
                    .await?;

                let mut transaction = Transaction::new(
                    cmd.household_id,
                    TransactionKind::Settlement,
                    cmd.occurred_at,
                    amount,
                    None,
                    normalize_optional_text(cmd.note.as_deref()),
                    cmd.user_id.clone(),
                )?;
                transaction.payer_member_id = Some(cmd.payer_member_id);
                transaction.counterparty_member_id = Some(cmd.recipient_member_id);
                transactions::ActiveModel::from(&transaction).insert(&tx).await?;

                tracing::info!(household_id = %cmd.household_id, transaction_id = %transaction.id, "settlement created");
                Ok(transaction.id)
            }
            .await
        })
    }

    /// Records a reimbursement rolling back part of a prior expense. The
    /// cumulative reimbursed amount may never exceed the original expense.
    pub async fn create_reimbursement(&self, cmd: ReimbursementCmd) -> ResultEngine<Uuid> {
        let amount = MoneyCents::new(cmd.amount_minor);

        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, cmd.household_id).await?;
                self.require_acting_member(&tx, cmd.household_id, &cmd.user_id)
                    .await?;
                self.require_approved_member(&tx, cmd.household_id, cmd.receiver_member_id)
                    .await?;

                let original = self
                    .require_transaction(&tx, cmd.household_id, cmd.reimburses_transaction_id)
                    .await?;
                if original.kind != TransactionKind::Expense {
                    return Err(EngineError::Validation(
                        "reimbursements must reference an expense".to_string(),
                    ));
                }

                let already_reimbursed = self
                    .reimbursed_total(&tx, cmd.reimburses_transaction_id)
                    .await?;
                let reimbursed = already_reimbursed
                    .checked_add(amount)
                    .ok_or_else(|| EngineError::Validation("amount overflow".to_string()))?;
                if reimbursed > original.amount {
                    return Err(EngineError::Validation(format!(
                        "cumulative reimbursement {reimbursed} exceeds original amount {}",
                        original.amount
                    )));
                }

                let mut transaction = Transaction::new(
                    cmd.household_id,
                    TransactionKind::Reimbursement,
                    cmd.occurred_at,
                    amount,
                    None,
                    normalize_optional_text(cmd.note.as_deref()),
                    cmd.user_id.clone(),
                )?;
                transaction.payer_member_id = Some(cmd.receiver_member_id);
                transaction.reimburses_transaction_id = Some(cmd.reimburses_transaction_id);
                transactions::ActiveModel::from(&transaction).insert(&tx).await?;

                tracing::info!(household_id = %cmd.household_id, transaction_id = %transaction.id, "reimbursement created");
                Ok(transaction.id)
            }
            .await
        })
    }

    /// Updates an expense: the stored split set is replaced wholesale and the
    /// row rewritten in one transaction. Expenses with linked reimbursements
    /// cannot be edited, their splits anchor the reimbursement rollback.
    pub async fn update_expense(&self, cmd: ExpenseUpdateCmd) -> ResultEngine<()> {
        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, cmd.household_id).await?;
                self.require_acting_member(&tx, cmd.household_id, &cmd.user_id)
                    .await?;

                let stored = self
                    .require_transaction(&tx, cmd.household_id, cmd.transaction_id)
                    .await?;
                if stored.kind != TransactionKind::Expense {
                    return Err(EngineError::Validation(
                        "only expenses can be updated through this operation".to_string(),
                    ));
                }
                self.require_no_linked_reimbursements(&tx, cmd.transaction_id)
                    .await?;

                let amount = cmd
                    .amount_minor
                    .map(MoneyCents::new)
                    .unwrap_or(stored.amount);
                if !amount.is_positive() {
                    return Err(EngineError::Validation(
                        "amount_minor must be > 0".to_string(),
                    ));
                }

                // A partial update must not re-derive amounts the caller
                // never touched: recomputing a stored custom allocation from
                // the policy alone would flatten it to an even division. When
                // the caller supplies no amounts, the stored splits carry
                // forward (and fail reconciliation if the new total no
                // longer matches, forcing explicit amounts).
                let stored_splits = self.splits_of(&tx, cmd.transaction_id).await?;
                let (stored_owed, stored_paid) = stored_split_inputs(&stored_splits);
                let owed_amounts = match cmd.owed_amounts.clone() {
                    Some(amounts) => Some(amounts),
                    None if !stored_splits.is_empty() => Some(stored_owed),
                    None => None,
                };
                let paid_amounts = match cmd.paid_amounts.clone() {
                    Some(amounts) => Some(amounts),
                    None if !stored_splits.is_empty() => Some(stored_paid),
                    None => None,
                };

                let merged = ExpenseCmd {
                    household_id: cmd.household_id,
                    amount_minor: amount.cents(),
                    split_kind: cmd
                        .split_kind
                        .or(stored.split_kind)
                        .unwrap_or(SplitKind::Custom),
                    paid_by_kind: cmd
                        .paid_by_kind
                        .or(stored.paid_by_kind)
                        .unwrap_or(PaidByKind::Single),
                    payer_member_id: cmd.payer_member_id.or(stored.payer_member_id),
                    split_member_id: cmd.split_member_id.or(stored.split_member_id),
                    owed_amounts,
                    paid_amounts,
                    meta: crate::TxMeta::new(cmd.occurred_at.unwrap_or(stored.occurred_at)),
                    user_id: cmd.user_id.clone(),
                };

                let participants = self.approved_member_ids(&tx, cmd.household_id).await?;
                let (owed, paid) = expense_policies(&merged)?;
                let shares = compute_expense_splits(amount, &participants, &owed, &paid)?;

                let mut updated = stored;
                updated.amount = amount;
                updated.occurred_at = merged.meta.occurred_at;
                updated.split_kind = Some(merged.split_kind);
                updated.paid_by_kind = Some(merged.paid_by_kind);
                updated.payer_member_id = merged.payer_member_id;
                updated.split_member_id = merged.split_member_id;
                if let Some(category) = cmd.category.as_deref() {
                    updated.category = normalize_optional_text(Some(category));
                }
                if let Some(note) = cmd.note.as_deref() {
                    updated.note = normalize_optional_text(Some(note));
                }
                if let Some(excluded) = cmd.excluded_from_budget {
                    updated.excluded_from_budget = excluded;
                }

                splits::Entity::delete_many()
                    .filter(splits::Column::TransactionId.eq(cmd.transaction_id.to_string()))
                    .exec(&tx)
                    .await?;
                transactions::ActiveModel::from(&updated).save(&tx).await?;
                for share in &shares {
                    let split = Split::new(
                        updated.id,
                        share.member_id,
                        share.owed,
                        share.owed_bp,
                        share.paid,
                        share.paid_bp,
                    );
                    splits::ActiveModel::from(&split).insert(&tx).await?;
                }

                tracing::info!(household_id = %cmd.household_id, transaction_id = %cmd.transaction_id, "expense updated");
                Ok(())
            }
            .await
        })
    }

    /// Deletes a transaction and its splits atomically. Expenses with linked
    /// reimbursements cannot be deleted.
    pub async fn delete_transaction(
        &self,
        household_id: Uuid,
        transaction_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, household_id).await?;
                self.require_acting_member(&tx, household_id, user_id)
                    .await?;
                self.require_transaction(&tx, household_id, transaction_id)
                    .await?;
                self.require_no_linked_reimbursements(&tx, transaction_id)
                    .await?;

                splits::Entity::delete_many()
                    .filter(splits::Column::TransactionId.eq(transaction_id.to_string()))
                    .exec(&tx)
                    .await?;
                transactions::Entity::delete_by_id(transaction_id.to_string())
                    .exec(&tx)
                    .await?;

                tracing::info!(household_id = %household_id, transaction_id = %transaction_id, "transaction deleted");
                Ok(())
            }
            .await
        })
    }

    /// Returns one transaction with its splits.
    pub async fn transaction(
        &self,
        household_id: Uuid,
        transaction_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<(Transaction, Vec<Split>)> {
        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, household_id).await?;
                self.require_acting_member(&tx, household_id, user_id)
                    .await?;
                let transaction = self
                    .require_transaction(&tx, household_id, transaction_id)
                    .await?;
                let split_rows = self.splits_of(&tx, transaction_id).await?;
                Ok((transaction, split_rows))
            }
            .await
        })
    }

    /// Lists the household's transactions, most recent first.
    pub async fn list_transactions(
        &self,
        household_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<Transaction>> {
        with_tx!(self, |tx| {
            async {
                self.require_household(&tx, household_id).await?;
                self.require_acting_member(&tx, household_id, user_id)
                    .await?;

                let models: Vec<transactions::Model> = transactions::Entity::find()
                    .filter(transactions::Column::HouseholdId.eq(household_id.to_string()))
                    .order_by_desc(transactions::Column::OccurredAt)
                    .all(&tx)
                    .await?;
                models.into_iter().map(Transaction::try_from).collect()
            }
            .await
        })
    }

    pub(super) async fn require_transaction(
        &self,
        db: &DatabaseTransaction,
        household_id: Uuid,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::HouseholdId.eq(household_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
        Transaction::try_from(model)
    }

    pub(super) async fn splits_of(
        &self,
        db: &DatabaseTransaction,
        transaction_id: Uuid,
    ) -> ResultEngine<Vec<Split>> {
        let models: Vec<splits::Model> = splits::Entity::find()
            .filter(splits::Column::TransactionId.eq(transaction_id.to_string()))
            .all(db)
            .await?;
        models.into_iter().map(Split::try_from).collect()
    }

    async fn require_approved_member(
        &self,
        db: &DatabaseTransaction,
        household_id: Uuid,
        member_id: Uuid,
    ) -> ResultEngine<Member> {
        let member = self
            .require_member_in_household(db, household_id, member_id)
            .await?;
        if member.status != MemberStatus::Approved {
            return Err(EngineError::Validation(
                "member is not approved".to_string(),
            ));
        }
        Ok(member)
    }

    /// Ids of the household's approved members, in join order. These are the
    /// eligible expense participants.
    async fn approved_member_ids(
        &self,
        db: &DatabaseTransaction,
        household_id: Uuid,
    ) -> ResultEngine<Vec<Uuid>> {
        let models: Vec<members::Model> = members::Entity::find()
            .filter(members::Column::HouseholdId.eq(household_id.to_string()))
            .filter(members::Column::Status.eq(MemberStatus::Approved.as_str()))
            .order_by_asc(members::Column::CreatedAt)
            .all(db)
            .await?;
        models
            .into_iter()
            .map(|m| Member::try_from(m).map(|member| member.id))
            .collect()
    }

    /// Total amount already reimbursed against an expense.
    async fn reimbursed_total(
        &self,
        db: &DatabaseTransaction,
        expense_id: Uuid,
    ) -> ResultEngine<MoneyCents> {
        let models: Vec<transactions::Model> = transactions::Entity::find()
            .filter(transactions::Column::ReimbursesTransactionId.eq(expense_id.to_string()))
            .all(db)
            .await?;
        Ok(MoneyCents::new(
            models.iter().map(|m| m.amount_minor).sum(),
        ))
    }

    async fn require_no_linked_reimbursements(
        &self,
        db: &DatabaseTransaction,
        expense_id: Uuid,
    ) -> ResultEngine<()> {
        let linked = transactions::Entity::find()
            .filter(transactions::Column::ReimbursesTransactionId.eq(expense_id.to_string()))
            .one(db)
            .await?;
        if linked.is_some() {
            return Err(EngineError::StateConflict(
                "expense has linked reimbursements".to_string(),
            ));
        }
        Ok(())
    }
}

/// Stored split rows as explicit amount inputs, one owed and one paid entry
/// per member, in split order.
fn stored_split_inputs(splits: &[Split]) -> (Vec<SplitInput>, Vec<SplitInput>) {
    let owed = splits
        .iter()
        .map(|s| SplitInput::new(s.member_id, s.owed.cents()))
        .collect();
    let paid = splits
        .iter()
        .map(|s| SplitInput::new(s.member_id, s.paid.cents()))
        .collect();
    (owed, paid)
}

/// Resolves the command's policy fields into calculator policies.
fn expense_policies(cmd: &ExpenseCmd) -> ResultEngine<(OwedSplit, PaidSplit)> {
    let owed = match cmd.split_kind {
        SplitKind::Custom => match &cmd.owed_amounts {
            Some(amounts) => OwedSplit::Custom {
                amounts: to_money_pairs(amounts),
            },
            // Legacy shim, creation only: no explicit amounts means an even
            // division. Updates always carry the stored amounts.
            None => OwedSplit::Even,
        },
        SplitKind::PayerOnly => OwedSplit::Single {
            member_id: cmd.payer_member_id.ok_or_else(|| {
                EngineError::Validation(
                    "payer_member_id is required for payer_only splits".to_string(),
                )
            })?,
        },
        SplitKind::MemberOnly => OwedSplit::Single {
            member_id: cmd.split_member_id.ok_or_else(|| {
                EngineError::Validation(
                    "split_member_id is required for member_only splits".to_string(),
                )
            })?,
        },
    };

    let paid = match cmd.paid_by_kind {
        PaidByKind::Single => PaidSplit::Single {
            payer_id: cmd.payer_member_id.ok_or_else(|| {
                EngineError::Validation(
                    "payer_member_id is required for single paid-by".to_string(),
                )
            })?,
        },
        PaidByKind::Custom => PaidSplit::Custom {
            amounts: cmd
                .paid_amounts
                .as_ref()
                .map(|amounts| to_money_pairs(amounts))
                .ok_or_else(|| {
                    EngineError::Validation(
                        "paid_amounts are required for custom paid-by".to_string(),
                    )
                })?,
        },
    };

    Ok((owed, paid))
}

fn to_money_pairs(inputs: &[SplitInput]) -> Vec<(Uuid, MoneyCents)> {
    inputs
        .iter()
        .map(|input| (input.member_id, MoneyCents::new(input.amount_minor)))
        .collect()
}
