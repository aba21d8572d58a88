//! Transaction endpoints: the four ledger event kinds plus edit, delete and
//! read access.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use api_types::transaction::{
    ExpenseNew, ExpenseUpdate, IncomeNew, ReimbursementNew, SettlementNew, Split, Transaction,
    TransactionCreated,
};
use engine::{
    ExpenseCmd, ExpenseUpdateCmd, IncomeCmd, PaidByKind, ReimbursementCmd, SettlementCmd,
    SplitKind,
};

use crate::{ServerError, server::ServerState, user};

fn split_inputs(inputs: &[api_types::transaction::SplitInput]) -> Vec<engine::SplitInput> {
    inputs
        .iter()
        .map(|input| engine::SplitInput::new(input.member_id, input.amount_minor))
        .collect()
}

fn split_view(split: engine::Split) -> Split {
    Split {
        member_id: split.member_id,
        owed_minor: split.owed.cents(),
        owed_bp: split.owed_bp,
        paid_minor: split.paid.cents(),
        paid_bp: split.paid_bp,
    }
}

fn view(transaction: engine::Transaction, splits: Option<Vec<engine::Split>>) -> Transaction {
    Transaction {
        id: transaction.id,
        household_id: transaction.household_id,
        kind: transaction.kind.as_str().to_string(),
        occurred_at: transaction.occurred_at,
        amount_minor: transaction.amount.cents(),
        category: transaction.category,
        note: transaction.note,
        created_by: transaction.created_by,
        payer_member_id: transaction.payer_member_id,
        counterparty_member_id: transaction.counterparty_member_id,
        split_member_id: transaction.split_member_id,
        split_kind: transaction.split_kind.map(|k| k.as_str().to_string()),
        paid_by_kind: transaction.paid_by_kind.map(|k| k.as_str().to_string()),
        reimburses_transaction_id: transaction.reimburses_transaction_id,
        excluded_from_budget: transaction.excluded_from_budget,
        splits: splits.map(|rows| rows.into_iter().map(split_view).collect()),
    }
}

pub async fn expense_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(household_id): Path<Uuid>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<TransactionCreated>), ServerError> {
    let mut cmd = ExpenseCmd::new(
        household_id,
        &user.username,
        payload.amount_minor,
        payload.occurred_at,
    );
    if let Some(kind) = payload.split_kind.as_deref() {
        cmd = cmd.split_kind(SplitKind::try_from(kind)?);
    }
    if let Some(kind) = payload.paid_by_kind.as_deref() {
        cmd = cmd.paid_by_kind(PaidByKind::try_from(kind)?);
    }
    if let Some(member_id) = payload.payer_member_id {
        cmd = cmd.payer_member_id(member_id);
    }
    if let Some(member_id) = payload.split_member_id {
        cmd = cmd.split_member_id(member_id);
    }
    if let Some(amounts) = payload.owed_amounts.as_deref() {
        cmd = cmd.owed_amounts(split_inputs(amounts));
    }
    if let Some(amounts) = payload.paid_amounts.as_deref() {
        cmd = cmd.paid_amounts(split_inputs(amounts));
    }
    if let Some(category) = payload.category {
        cmd = cmd.category(category);
    }
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }
    cmd.meta.excluded_from_budget = payload.excluded_from_budget.unwrap_or(false);

    let id = state.engine.create_expense(cmd).await?;
    Ok((StatusCode::CREATED, Json(TransactionCreated { id })))
}

pub async fn expense_update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((household_id, transaction_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<StatusCode, ServerError> {
    let mut cmd = ExpenseUpdateCmd::new(household_id, transaction_id, &user.username);
    if let Some(amount) = payload.amount_minor {
        cmd = cmd.amount_minor(amount);
    }
    if let Some(kind) = payload.split_kind.as_deref() {
        cmd = cmd.split_kind(SplitKind::try_from(kind)?);
    }
    if let Some(kind) = payload.paid_by_kind.as_deref() {
        cmd = cmd.paid_by_kind(PaidByKind::try_from(kind)?);
    }
    if let Some(member_id) = payload.payer_member_id {
        cmd = cmd.payer_member_id(member_id);
    }
    if let Some(member_id) = payload.split_member_id {
        cmd = cmd.split_member_id(member_id);
    }
    if let Some(amounts) = payload.owed_amounts.as_deref() {
        cmd = cmd.owed_amounts(split_inputs(amounts));
    }
    if let Some(amounts) = payload.paid_amounts.as_deref() {
        cmd = cmd.paid_amounts(split_inputs(amounts));
    }
    if let Some(category) = payload.category {
        cmd = cmd.category(category);
    }
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }
    if let Some(occurred_at) = payload.occurred_at {
        cmd = cmd.occurred_at(occurred_at);
    }
    if let Some(excluded) = payload.excluded_from_budget {
        cmd = cmd.excluded_from_budget(excluded);
    }

    state.engine.update_expense(cmd).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn income_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(household_id): Path<Uuid>,
    Json(payload): Json<IncomeNew>,
) -> Result<(StatusCode, Json<TransactionCreated>), ServerError> {
    let mut cmd = IncomeCmd::new(
        household_id,
        &user.username,
        payload.amount_minor,
        payload.occurred_at,
    );
    if let Some(member_id) = payload.member_id {
        cmd = cmd.member_id(member_id);
    }
    if let Some(category) = payload.category {
        cmd = cmd.category(category);
    }
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }

    let id = state.engine.create_income(cmd).await?;
    Ok((StatusCode::CREATED, Json(TransactionCreated { id })))
}

pub async fn settlement_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(household_id): Path<Uuid>,
    Json(payload): Json<SettlementNew>,
) -> Result<(StatusCode, Json<TransactionCreated>), ServerError> {
    let mut cmd = SettlementCmd::new(
        household_id,
        &user.username,
        payload.amount_minor,
        payload.payer_member_id,
        payload.recipient_member_id,
        payload.occurred_at,
    );
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }

    let id = state.engine.create_settlement(cmd).await?;
    Ok((StatusCode::CREATED, Json(TransactionCreated { id })))
}

pub async fn reimbursement_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(household_id): Path<Uuid>,
    Json(payload): Json<ReimbursementNew>,
) -> Result<(StatusCode, Json<TransactionCreated>), ServerError> {
    let mut cmd = ReimbursementCmd::new(
        household_id,
        &user.username,
        payload.amount_minor,
        payload.receiver_member_id,
        payload.reimburses_transaction_id,
        payload.occurred_at,
    );
    if let Some(note) = payload.note {
        cmd = cmd.note(note);
    }

    let id = state.engine.create_reimbursement(cmd).await?;
    Ok((StatusCode::CREATED, Json(TransactionCreated { id })))
}

pub async fn get_detail(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((household_id, transaction_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Transaction>, ServerError> {
    let (transaction, splits) = state
        .engine
        .transaction(household_id, transaction_id, &user.username)
        .await?;
    Ok(Json(view(transaction, Some(splits))))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(household_id): Path<Uuid>,
) -> Result<Json<Vec<Transaction>>, ServerError> {
    let transactions = state
        .engine
        .list_transactions(household_id, &user.username)
        .await?
        .into_iter()
        .map(|transaction| view(transaction, None))
        .collect();
    Ok(Json(transactions))
}

pub async fn delete_tx(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path((household_id, transaction_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_transaction(household_id, transaction_id, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
